//! The widget data model.
//!
//! A [`Widget`] is a self-contained, independently renderable page fragment
//! with its own template and data. Widgets are registered by name in a
//! [`WidgetSet`] as factory closures returning the common widget interface,
//! so templates can request them dynamically: the requested name resolves at
//! render time against the widgets the currently rendering view or widget
//! declared.
//!
//! [`PageView`] is the top-level rendering context a controller hands to the
//! engine; [`ActiveContext`] is the tagged variant over the two (view or
//! widget) that the active-context registry stacks.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use minijinja::Value;
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::error::WidgetError;

static EMPTY_WIDGETS: Lazy<WidgetSet> = Lazy::new(WidgetSet::new);

/// A renderable page fragment.
///
/// Implementations provide the template to execute, the data value that
/// template sees, and the set of child widgets their own template may
/// request.
pub trait Widget: Send + Sync {
    /// The template name this widget renders with.
    fn template(&self) -> &str;

    /// The data exposed to the widget's template, and to nested templates
    /// through the `_widget` global.
    fn value(&self) -> Value;

    /// Child widgets this widget's template may render.
    ///
    /// Defaults to none.
    fn widgets(&self) -> &WidgetSet {
        &EMPTY_WIDGETS
    }
}

/// Factory closure that builds a widget from template-call arguments.
///
/// The arguments are the extra positional values of the `widget(...)` call
/// in the template, forwarded as constructor parameters.
pub type WidgetBuilder =
    Arc<dyn Fn(&[Value]) -> Result<Arc<dyn Widget>, WidgetError> + Send + Sync>;

/// Name-keyed widget registrations.
///
/// Views and widgets each carry a `WidgetSet` naming the child widgets their
/// templates are allowed to request. A second, engine-scoped set holds the
/// globally available widgets consulted by `widget_global`.
#[derive(Clone, Default)]
pub struct WidgetSet {
    builders: HashMap<String, WidgetBuilder>,
}

impl WidgetSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a widget factory under `name`, replacing any previous
    /// registration with the same name.
    pub fn register<F>(&mut self, name: impl Into<String>, builder: F)
    where
        F: Fn(&[Value]) -> Result<Arc<dyn Widget>, WidgetError> + Send + Sync + 'static,
    {
        self.builders.insert(name.into(), Arc::new(builder));
    }

    /// Returns true if a widget named `name` is registered.
    pub fn has(&self, name: &str) -> bool {
        self.builders.contains_key(name)
    }

    /// Looks up the factory registered under `name`.
    pub fn builder(&self, name: &str) -> Option<&WidgetBuilder> {
        self.builders.get(name)
    }

    /// Number of registered widgets.
    pub fn len(&self) -> usize {
        self.builders.len()
    }

    /// Returns true if no widgets are registered.
    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }

    /// Iterates over the registered widget names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.builders.keys().map(|s| s.as_str())
    }
}

impl fmt::Debug for WidgetSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetSet")
            .field("names", &self.builders.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// The top-level rendering context for a page.
///
/// A view is what a controller hands to the engine: the page template, the
/// page data, and the widgets the page template may render.
///
/// # Example
///
/// ```rust,ignore
/// let view = PageView::new("catalog/page.html")
///     .with_data(&catalog_data)
///     .with_widget("cart-mini", CartMiniWidget::build);
/// ```
pub struct PageView {
    template: String,
    data: Value,
    widgets: WidgetSet,
}

impl PageView {
    /// Creates a view rendering with the given template.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            data: Value::UNDEFINED,
            widgets: WidgetSet::new(),
        }
    }

    /// Sets the page data available to the view template, and to nested
    /// templates through the `_view` global.
    pub fn with_data<T: Serialize>(mut self, data: &T) -> Self {
        self.data = Value::from_serialize(data);
        self
    }

    /// Registers a widget the view template may render.
    pub fn with_widget<F>(mut self, name: impl Into<String>, builder: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Arc<dyn Widget>, WidgetError> + Send + Sync + 'static,
    {
        self.widgets.register(name, builder);
        self
    }

    /// The view's template name.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The view's data value.
    pub fn value(&self) -> Value {
        self.data.clone()
    }

    /// The widgets the view template may render.
    pub fn widgets(&self) -> &WidgetSet {
        &self.widgets
    }
}

impl fmt::Debug for PageView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageView")
            .field("template", &self.template)
            .field("widgets", &self.widgets)
            .finish_non_exhaustive()
    }
}

/// A widget defined by a template name and a fixed data value.
///
/// Covers the common case where a widget has no behavior of its own beyond
/// binding data to a template. Widgets with richer construction logic
/// implement [`Widget`] directly.
pub struct StaticWidget {
    template: String,
    data: Value,
    widgets: WidgetSet,
}

impl StaticWidget {
    /// Creates a widget rendering with the given template.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            data: Value::UNDEFINED,
            widgets: WidgetSet::new(),
        }
    }

    /// Sets the widget's data value.
    pub fn with_data<T: Serialize>(mut self, data: &T) -> Self {
        self.data = Value::from_serialize(data);
        self
    }

    /// Registers a child widget this widget's template may render.
    pub fn with_widget<F>(mut self, name: impl Into<String>, builder: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Arc<dyn Widget>, WidgetError> + Send + Sync + 'static,
    {
        self.widgets.register(name, builder);
        self
    }
}

impl Widget for StaticWidget {
    fn template(&self) -> &str {
        &self.template
    }

    fn value(&self) -> Value {
        self.data.clone()
    }

    fn widgets(&self) -> &WidgetSet {
        &self.widgets
    }
}

/// The entity currently rendering: either the page view or a widget.
///
/// Cheap to clone; payloads are reference counted.
#[derive(Clone)]
pub enum ActiveContext {
    /// The top-level page view.
    View(Arc<PageView>),
    /// A widget instance, pushed for the duration of its template execution.
    Widget(Arc<dyn Widget>),
}

impl ActiveContext {
    /// The child widgets this context's template may render.
    pub fn widgets(&self) -> &WidgetSet {
        match self {
            ActiveContext::View(view) => view.widgets(),
            ActiveContext::Widget(widget) => widget.widgets(),
        }
    }

    /// The data value this context exposes to templates.
    pub fn value(&self) -> Value {
        match self {
            ActiveContext::View(view) => view.value(),
            ActiveContext::Widget(widget) => widget.value(),
        }
    }

    /// The template this context renders with.
    pub fn template(&self) -> &str {
        match self {
            ActiveContext::View(view) => view.template(),
            ActiveContext::Widget(widget) => widget.template(),
        }
    }
}

impl fmt::Debug for ActiveContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActiveContext::View(view) => write!(f, "View({:?})", view.template()),
            ActiveContext::Widget(widget) => write!(f, "Widget({:?})", widget.template()),
        }
    }
}
