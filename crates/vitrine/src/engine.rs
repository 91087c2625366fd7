//! The widget engine.
//!
//! [`WidgetEngine`] owns the MiniJinja environment and the shared runtime,
//! wires the widget functions and the `_widget`/`_view` globals, and drives
//! the top-level page render pass: push the view onto the active-context
//! registry, execute its template, pop.

use std::sync::Arc;

use minijinja::Environment;

use crate::error::WidgetError;
use crate::functions::register_widget_functions;
use crate::runtime::WidgetRuntime;
use crate::templates::TemplateSources;
use crate::widget::{ActiveContext, PageView, Widget};

/// A template environment with the widget surface installed.
///
/// One engine serves one render pass at a time; give concurrent requests
/// their own engine instance (the active-context registry is render-pass
/// state, not process state).
///
/// # Example
///
/// ```rust,ignore
/// let mut engine = WidgetEngine::new();
/// engine.add_template("page.html", "...")?;
///
/// let view = PageView::new("page.html")
///     .with_data(&data)
///     .with_widget("cart-mini", CartMiniWidget::build);
/// let html = engine.render_page(view)?;
/// ```
pub struct WidgetEngine {
    env: Environment<'static>,
    runtime: Arc<WidgetRuntime>,
}

impl WidgetEngine {
    /// Creates an engine with the widget functions installed and no
    /// templates loaded.
    pub fn new() -> Self {
        let runtime = Arc::new(WidgetRuntime::new());
        let mut env = Environment::new();
        register_widget_functions(&mut env, &runtime);
        Self { env, runtime }
    }

    /// Creates an engine and loads the given template sources.
    pub fn with_templates(sources: &TemplateSources) -> Result<Self, WidgetError> {
        let mut engine = Self::new();
        sources.install(&mut engine.env)?;
        Ok(engine)
    }

    /// Registers an inline template.
    ///
    /// # Errors
    ///
    /// [`WidgetError::InvalidTemplate`] if the source does not parse.
    pub fn add_template(&mut self, name: &str, source: &str) -> Result<(), WidgetError> {
        self.env
            .add_template_owned(name.to_string(), source.to_string())
            .map_err(|e| WidgetError::InvalidTemplate {
                name: name.to_string(),
                message: e.to_string(),
            })
    }

    /// Registers a globally available widget (see `widget_global`).
    pub fn register_global_widget<F>(&self, name: impl Into<String>, builder: F)
    where
        F: Fn(&[minijinja::Value]) -> Result<Arc<dyn Widget>, WidgetError>
            + Send
            + Sync
            + 'static,
    {
        self.runtime.register_global(name, builder);
    }

    /// Renders a full page.
    ///
    /// The view is pushed onto the active-context registry for the duration
    /// of its template execution, so `widget(...)` calls inside the page
    /// template resolve against the view's registered widgets.
    ///
    /// # Errors
    ///
    /// [`WidgetError::RenderFailed`] carrying the view's template name if
    /// the template is missing or fails to execute.
    pub fn render_page(&self, view: PageView) -> Result<String, WidgetError> {
        let view = Arc::new(view);
        let template_name = view.template().to_string();
        let data = view.value();

        let _guard = self.runtime.enter(ActiveContext::View(view));
        self.env
            .get_template(&template_name)
            .and_then(|template| template.render(data))
            .map_err(|e| WidgetError::render_failed(&template_name, e))
    }

    /// The shared runtime handle.
    pub fn runtime(&self) -> &Arc<WidgetRuntime> {
        &self.runtime
    }

    /// Direct access to the underlying environment, for registering custom
    /// filters or functions.
    pub fn env(&self) -> &Environment<'static> {
        &self.env
    }

    /// Mutable access to the underlying environment.
    pub fn env_mut(&mut self) -> &mut Environment<'static> {
        &mut self.env
    }
}

impl Default for WidgetEngine {
    fn default() -> Self {
        Self::new()
    }
}
