//! Shared render-pass state.
//!
//! [`WidgetRuntime`] holds everything the engine and its template functions
//! share: the active-context stack and the engine-scoped global widget
//! collection. MiniJinja environment functions and globals are
//! `Send + Sync`, so the runtime lives behind an `Arc` with mutex-guarded
//! interior. Locks cover single stack or map operations; none is held
//! across template execution.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::WidgetError;
use crate::registry::{lock, ActiveContextRegistry, ContextGuard, SharedRegistry};
use crate::widget::{ActiveContext, PageView, Widget, WidgetSet};

/// State shared between the engine and its template functions.
pub struct WidgetRuntime {
    registry: SharedRegistry,
    globals: Mutex<WidgetSet>,
}

impl WidgetRuntime {
    /// Creates a runtime with an empty registry and no global widgets.
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(ActiveContextRegistry::new())),
            globals: Mutex::new(WidgetSet::new()),
        }
    }

    /// Registers a globally available widget, rendered via `widget_global`
    /// regardless of what the current context declares.
    pub fn register_global<F>(&self, name: impl Into<String>, builder: F)
    where
        F: Fn(&[minijinja::Value]) -> Result<Arc<dyn Widget>, WidgetError>
            + Send
            + Sync
            + 'static,
    {
        self.lock_globals().register(name, builder);
    }

    /// Snapshot of the global widget collection.
    pub(crate) fn globals(&self) -> WidgetSet {
        self.lock_globals().clone()
    }

    /// The innermost actively rendering context.
    ///
    /// # Errors
    ///
    /// [`WidgetError::EmptyRegistry`] outside an active render pass.
    pub fn active_context(&self) -> Result<ActiveContext, WidgetError> {
        lock(&self.registry)
            .last_added()
            .cloned()
            .ok_or(WidgetError::EmptyRegistry)
    }

    /// The innermost widget on the stack, if the top entry is a widget.
    pub(crate) fn current_widget(&self) -> Option<Arc<dyn Widget>> {
        match lock(&self.registry).last_added() {
            Some(ActiveContext::Widget(widget)) => Some(Arc::clone(widget)),
            _ => None,
        }
    }

    /// The page view of the current render pass (stack bottom), if any.
    pub(crate) fn current_view(&self) -> Option<Arc<PageView>> {
        match lock(&self.registry).first_added() {
            Some(ActiveContext::View(view)) => Some(Arc::clone(view)),
            _ => None,
        }
    }

    /// Pushes a context for the lifetime of the returned guard.
    pub(crate) fn enter(&self, context: ActiveContext) -> ContextGuard {
        ContextGuard::push(&self.registry, context)
    }

    /// Current registry depth, primarily for diagnostics and tests.
    pub fn depth(&self) -> usize {
        lock(&self.registry).depth()
    }

    fn lock_globals(&self) -> MutexGuard<'_, WidgetSet> {
        self.globals.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for WidgetRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WidgetRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetRuntime")
            .field("depth", &self.depth())
            .field("globals", &self.lock_globals().len())
            .finish()
    }
}
