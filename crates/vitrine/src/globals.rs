//! Nesting-safe current-context globals.
//!
//! Templates refer to "the thing currently rendering" through two engine
//! globals: `_widget` (the innermost widget) and `_view` (the page view of
//! the render pass). Both are dynamic proxies: attribute access resolves
//! against the active-context registry at lookup time. A nested widget
//! render therefore sees its own data under `_widget`, and the outer
//! widget's data reappears as soon as the nested render pops.

use std::fmt;
use std::sync::Arc;

use minijinja::value::{Object, Value};

use crate::runtime::WidgetRuntime;

/// Proxy for the innermost widget on the active-context stack.
///
/// Resolves to undefined attributes while no widget is rendering (for
/// example, in the page template outside any `widget(...)` call).
pub(crate) struct CurrentWidget {
    runtime: Arc<WidgetRuntime>,
}

impl CurrentWidget {
    pub(crate) fn new(runtime: Arc<WidgetRuntime>) -> Self {
        Self { runtime }
    }
}

impl fmt::Debug for CurrentWidget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrentWidget").finish_non_exhaustive()
    }
}

impl Object for CurrentWidget {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let widget = self.runtime.current_widget()?;
        widget.value().get_item(key).ok()
    }
}

/// Proxy for the page view of the current render pass (the stack bottom).
pub(crate) struct CurrentView {
    runtime: Arc<WidgetRuntime>,
}

impl CurrentView {
    pub(crate) fn new(runtime: Arc<WidgetRuntime>) -> Self {
        Self { runtime }
    }
}

impl fmt::Debug for CurrentView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrentView").finish_non_exhaustive()
    }
}

impl Object for CurrentView {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let view = self.runtime.current_view()?;
        view.value().get_item(key).ok()
    }
}
