//! Error types for widget rendering.
//!
//! [`WidgetError`] is the single error surface of the dispatch path. The
//! template engine's own failures (syntax errors, missing templates) and
//! widget construction failures are folded into
//! [`WidgetError::RenderFailed`], so callers see one uniform error type
//! carrying the requested name and the original cause, regardless of what
//! went wrong underneath.
//!
//! A missing *optional* widget is not an error: the dispatch functions
//! resolve it as empty output.

use std::path::PathBuf;

/// Errors that can occur while registering or rendering widgets.
#[derive(Debug, thiserror::Error)]
pub enum WidgetError {
    /// A widget function was called with no active view or widget on the
    /// registry stack. Widgets can only render inside an active render pass.
    #[error(
        "the active-context registry is empty: widget functions can only run \
         inside an active page or widget render; register the view or widget first"
    )]
    EmptyRegistry,

    /// Widget construction or template execution failed.
    #[error("rendering \"{name}\" failed: {source}")]
    RenderFailed {
        /// The requested widget name (or the view template for page renders).
        name: String,
        /// The underlying construction or template error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A widget factory rejected its constructor arguments.
    #[error("invalid arguments for widget \"{name}\": {message}")]
    InvalidArguments {
        /// The widget whose factory rejected the call.
        name: String,
        /// What the factory expected.
        message: String,
    },

    /// A template failed to parse at registration time.
    #[error("template \"{name}\" is invalid: {message}")]
    InvalidTemplate {
        /// The template name being registered.
        name: String,
        /// The parse error reported by the engine.
        message: String,
    },

    /// A template source directory could not be read.
    #[error("failed to load templates from {}: {message}", path.display())]
    TemplateSource {
        /// The directory that failed.
        path: PathBuf,
        /// The underlying I/O error.
        message: String,
    },
}

impl WidgetError {
    /// Wraps a construction or template-execution failure into the uniform
    /// render-failed error for the given name.
    pub(crate) fn render_failed(
        name: &str,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        WidgetError::RenderFailed {
            name: name.to_string(),
            source: Box::new(source),
        }
    }
}

// Conversion at the template-function boundary: dispatch errors surface to
// MiniJinja as invalid-operation errors with the full message preserved.
impl From<WidgetError> for minijinja::Error {
    fn from(err: WidgetError) -> Self {
        minijinja::Error::new(minijinja::ErrorKind::InvalidOperation, err.to_string())
    }
}
