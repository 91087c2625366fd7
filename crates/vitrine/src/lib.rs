//! # Vitrine: widget rendering for storefront templates
//!
//! `vitrine` lets page templates embed self-contained, independently
//! renderable fragments ("widgets") by name. A page view declares which
//! widgets its template may use; the template requests them with
//! `widget("name", ...)`, and the engine resolves the name against the
//! *currently rendering* context, builds the widget through its registered
//! factory, and renders its template inline. Widgets can declare and render
//! widgets of their own, nesting arbitrarily.
//!
//! ## Core concepts
//!
//! - [`Widget`]: a renderable fragment with its own template, data, and
//!   child widget registrations
//! - [`PageView`]: the top-level rendering context a controller hands to
//!   the engine
//! - [`ActiveContextRegistry`]: the stack tracking which view/widget is
//!   currently rendering; the top entry is what `widget(...)` names
//!   resolve against
//! - [`RenderDispatcher`]: the lookup-construct-push-render-pop path
//!   behind the template functions
//! - [`WidgetEngine`]: owns the MiniJinja environment, installs the
//!   `widget`/`widget_block`/`widget_global`/`widget_exists` functions and
//!   the `_widget`/`_view` globals, and drives page renders
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use serde_json::json;
//! use vitrine::{PageView, StaticWidget, Widget, WidgetEngine};
//!
//! let mut engine = WidgetEngine::new();
//! engine
//!     .add_template("page.html", "<h1>{{ title }}</h1>{{ widget(\"cart-mini\") }}")
//!     .unwrap();
//! engine
//!     .add_template("cart-mini.html", "<span>{{ _widget.count }} items</span>")
//!     .unwrap();
//!
//! let view = PageView::new("page.html")
//!     .with_data(&json!({ "title": "Catalog" }))
//!     .with_widget("cart-mini", |_args| {
//!         Ok(Arc::new(
//!             StaticWidget::new("cart-mini.html").with_data(&json!({ "count": 2 })),
//!         ) as Arc<dyn Widget>)
//!     });
//!
//! let html = engine.render_page(view).unwrap();
//! assert_eq!(html, "<h1>Catalog</h1><span>2 items</span>");
//! ```
//!
//! ## Nesting and the `_widget` global
//!
//! The `_widget` global is a dynamic proxy over the top of the
//! active-context stack: inside a nested widget render it resolves to the
//! nested widget's data, and it reverts to the outer widget the moment the
//! nested render completes. No re-binding happens mid-render; attribute
//! lookups simply follow the stack.
//!
//! ## Error model
//!
//! A widget name the current context does not register renders as empty
//! output. Anything that fails after the name resolves (factory
//! construction or template execution) surfaces as one uniform
//! [`WidgetError::RenderFailed`] carrying the requested name and
//! the original cause. Calling a widget function outside an active render
//! pass is a configuration error ([`WidgetError::EmptyRegistry`]).

mod dispatch;
mod engine;
mod error;
mod functions;
mod globals;
mod registry;
mod runtime;
mod templates;
mod widget;

pub use dispatch::RenderDispatcher;
pub use engine::WidgetEngine;
pub use error::WidgetError;
pub use functions::register_widget_functions;
pub use registry::{ActiveContextRegistry, ContextGuard, SharedRegistry};
pub use runtime::WidgetRuntime;
pub use templates::{TemplateSources, TEMPLATE_EXTENSIONS};
pub use widget::{ActiveContext, PageView, StaticWidget, Widget, WidgetBuilder, WidgetSet};
