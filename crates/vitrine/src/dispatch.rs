//! Widget render dispatch.
//!
//! [`RenderDispatcher`] implements the lookup-and-render indirection behind
//! the `widget` family of template functions: resolve the requested name
//! against the currently rendering context (or the global collection),
//! construct the widget through its registered factory, and execute its
//! template with the widget pushed on the active-context registry for the
//! duration of the render.
//!
//! Missing names are not errors: a page that optionally embeds a widget
//! renders nothing where the widget is not registered. Anything that goes
//! wrong *after* the name resolves surfaces as a single
//! [`WidgetError::RenderFailed`] carrying the requested name and the cause.

use std::sync::Arc;

use minijinja::{Environment, Value};

use crate::error::WidgetError;
use crate::runtime::WidgetRuntime;
use crate::widget::{ActiveContext, Widget, WidgetSet};

/// Dispatches widget render requests against a shared runtime.
#[derive(Clone)]
pub struct RenderDispatcher {
    runtime: Arc<WidgetRuntime>,
}

impl RenderDispatcher {
    /// Creates a dispatcher over the given runtime.
    pub fn new(runtime: Arc<WidgetRuntime>) -> Self {
        Self { runtime }
    }

    /// Renders the widget registered as `name` by the currently rendering
    /// context.
    ///
    /// Returns empty output if the name is not registered.
    ///
    /// # Errors
    ///
    /// [`WidgetError::EmptyRegistry`] outside an active render pass;
    /// [`WidgetError::RenderFailed`] if construction or template execution
    /// fails.
    pub fn render_named(
        &self,
        env: &Environment<'_>,
        name: &str,
        args: &[Value],
    ) -> Result<String, WidgetError> {
        let context = self.runtime.active_context()?;
        self.render_from(env, context.widgets(), name, None, args)
    }

    /// Renders one named block of the widget's template instead of the whole
    /// template. Otherwise identical to [`render_named`](Self::render_named).
    pub fn render_named_block(
        &self,
        env: &Environment<'_>,
        name: &str,
        block: &str,
        args: &[Value],
    ) -> Result<String, WidgetError> {
        let context = self.runtime.active_context()?;
        self.render_from(env, context.widgets(), name, Some(block), args)
    }

    /// Renders a widget from the engine-scoped global collection.
    ///
    /// The lookup never consults the stack-scoped container, and no active
    /// context is required.
    pub fn render_global_named(
        &self,
        env: &Environment<'_>,
        name: &str,
        args: &[Value],
    ) -> Result<String, WidgetError> {
        let globals = self.runtime.globals();
        self.render_from(env, &globals, name, None, args)
    }

    /// Whether the currently rendering context registers `name`.
    ///
    /// Pure existence check; no side effects.
    pub fn exists(&self, name: &str) -> Result<bool, WidgetError> {
        Ok(self.runtime.active_context()?.widgets().has(name))
    }

    fn render_from(
        &self,
        env: &Environment<'_>,
        set: &WidgetSet,
        name: &str,
        block: Option<&str>,
        args: &[Value],
    ) -> Result<String, WidgetError> {
        // A missing optional widget renders nothing; no push, no pop.
        let Some(builder) = set.builder(name) else {
            return Ok(String::new());
        };

        let widget = builder(args).map_err(|e| WidgetError::render_failed(name, e))?;

        // The guard pops the widget on every exit path out of this scope.
        let _guard = self
            .runtime
            .enter(ActiveContext::Widget(Arc::clone(&widget)));
        execute(env, widget.as_ref(), block).map_err(|e| WidgetError::render_failed(name, e))
    }
}

/// Executes the widget's template (or one of its blocks) with the widget's
/// data as template context.
fn execute(
    env: &Environment<'_>,
    widget: &dyn Widget,
    block: Option<&str>,
) -> Result<String, minijinja::Error> {
    let template = env.get_template(widget.template())?;
    match block {
        None => template.render(widget.value()),
        Some(block) => {
            let mut state = template.eval_to_state(widget.value())?;
            state.render_block(block)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ContextGuard;
    use crate::widget::{PageView, StaticWidget};
    use serde_json::json;

    fn test_env() -> Environment<'static> {
        let mut env = Environment::new();
        env.add_template_owned(
            "cart-mini.html".to_string(),
            "<span>{{ count }} items</span>".to_string(),
        )
        .unwrap();
        env.add_template_owned(
            "teaser.html".to_string(),
            "{% block title %}<h2>{{ title }}</h2>{% endblock %}\
             {% block body %}<p>{{ body }}</p>{% endblock %}"
                .to_string(),
        )
        .unwrap();
        env.add_template_owned(
            "broken.html".to_string(),
            "{{ no_such_function() }}".to_string(),
        )
        .unwrap();
        env
    }

    fn cart_builder(args: &[Value]) -> Result<Arc<dyn Widget>, WidgetError> {
        let count = args.first().cloned().unwrap_or(Value::from(0));
        Ok(Arc::new(
            StaticWidget::new("cart-mini.html").with_data(&json!({ "count": count })),
        ))
    }

    /// Dispatcher with a page view active, registering the given widgets.
    fn active_dispatcher(view: PageView) -> (RenderDispatcher, Arc<WidgetRuntime>, ContextGuard) {
        let runtime = Arc::new(WidgetRuntime::new());
        let guard = runtime.enter(ActiveContext::View(Arc::new(view)));
        (RenderDispatcher::new(Arc::clone(&runtime)), runtime, guard)
    }

    // =========================================================================
    // render_named
    // =========================================================================

    #[test]
    fn test_render_named_registered_widget() {
        let env = test_env();
        let view = PageView::new("page.html").with_widget("cart-mini", cart_builder);
        let (dispatcher, runtime, _guard) = active_dispatcher(view);

        let depth_before = runtime.depth();
        let html = dispatcher
            .render_named(&env, "cart-mini", &[Value::from(2)])
            .unwrap();

        assert_eq!(html, "<span>2 items</span>");
        assert_eq!(runtime.depth(), depth_before);
    }

    #[test]
    fn test_render_named_missing_widget_is_empty() {
        let env = test_env();
        let view = PageView::new("page.html");
        let (dispatcher, runtime, _guard) = active_dispatcher(view);

        let html = dispatcher.render_named(&env, "wishlist", &[]).unwrap();
        assert_eq!(html, "");
        assert_eq!(runtime.depth(), 1);
    }

    #[test]
    fn test_render_named_empty_registry() {
        let env = test_env();
        let dispatcher = RenderDispatcher::new(Arc::new(WidgetRuntime::new()));

        let err = dispatcher.render_named(&env, "cart-mini", &[]).unwrap_err();
        assert!(matches!(err, WidgetError::EmptyRegistry));
    }

    #[test]
    fn test_render_named_empty_registry_skips_construction() {
        let env = test_env();
        let dispatcher = RenderDispatcher::new(Arc::new(WidgetRuntime::new()));
        // Even a name that would fail construction errors with EmptyRegistry
        // first: the container peek happens before any lookup.
        let err = dispatcher.render_named(&env, "broken", &[]).unwrap_err();
        assert!(matches!(err, WidgetError::EmptyRegistry));
    }

    #[test]
    fn test_render_named_wraps_template_failure_and_restores_depth() {
        let env = test_env();
        let view = PageView::new("page.html").with_widget("broken", |_args| {
            Ok(Arc::new(StaticWidget::new("broken.html")) as Arc<dyn Widget>)
        });
        let (dispatcher, runtime, _guard) = active_dispatcher(view);

        let err = dispatcher.render_named(&env, "broken", &[]).unwrap_err();
        match err {
            WidgetError::RenderFailed { name, .. } => assert_eq!(name, "broken"),
            other => panic!("expected RenderFailed, got {other:?}"),
        }
        // The widget push was matched by a pop despite the failure.
        assert_eq!(runtime.depth(), 1);
    }

    #[test]
    fn test_render_named_wraps_missing_template() {
        let env = test_env();
        let view = PageView::new("page.html").with_widget("ghost", |_args| {
            Ok(Arc::new(StaticWidget::new("no-such-template.html")) as Arc<dyn Widget>)
        });
        let (dispatcher, runtime, _guard) = active_dispatcher(view);

        let err = dispatcher.render_named(&env, "ghost", &[]).unwrap_err();
        assert!(matches!(err, WidgetError::RenderFailed { .. }));
        assert_eq!(runtime.depth(), 1);
    }

    #[test]
    fn test_render_named_wraps_factory_failure() {
        let env = test_env();
        let view = PageView::new("page.html").with_widget("picky", |args: &[Value]| {
            if args.is_empty() {
                return Err(WidgetError::InvalidArguments {
                    name: "picky".to_string(),
                    message: "expected a session id".to_string(),
                });
            }
            Ok(Arc::new(StaticWidget::new("cart-mini.html")) as Arc<dyn Widget>)
        });
        let (dispatcher, runtime, _guard) = active_dispatcher(view);

        let err = dispatcher.render_named(&env, "picky", &[]).unwrap_err();
        match err {
            WidgetError::RenderFailed { name, source } => {
                assert_eq!(name, "picky");
                assert!(source.to_string().contains("session id"));
            }
            other => panic!("expected RenderFailed, got {other:?}"),
        }
        // Construction failed before the push; depth untouched.
        assert_eq!(runtime.depth(), 1);
    }

    // =========================================================================
    // render_named_block
    // =========================================================================

    #[test]
    fn test_render_named_block_renders_one_block() {
        let env = test_env();
        let view = PageView::new("page.html").with_widget("teaser", |_args| {
            Ok(Arc::new(
                StaticWidget::new("teaser.html")
                    .with_data(&json!({ "title": "Sale", "body": "Everything must go" })),
            ) as Arc<dyn Widget>)
        });
        let (dispatcher, runtime, _guard) = active_dispatcher(view);

        let html = dispatcher
            .render_named_block(&env, "teaser", "title", &[])
            .unwrap();
        assert_eq!(html, "<h2>Sale</h2>");
        assert_eq!(runtime.depth(), 1);
    }

    #[test]
    fn test_render_named_block_unknown_block_fails_and_restores_depth() {
        let env = test_env();
        let view = PageView::new("page.html").with_widget("teaser", |_args| {
            Ok(Arc::new(StaticWidget::new("teaser.html")) as Arc<dyn Widget>)
        });
        let (dispatcher, runtime, _guard) = active_dispatcher(view);

        let err = dispatcher
            .render_named_block(&env, "teaser", "footer", &[])
            .unwrap_err();
        assert!(matches!(err, WidgetError::RenderFailed { .. }));
        assert_eq!(runtime.depth(), 1);
    }

    // =========================================================================
    // render_global_named
    // =========================================================================

    #[test]
    fn test_render_global_named_uses_global_collection_only() {
        let env = test_env();
        // The view registers "cart-mini" locally, but NOT globally.
        let view = PageView::new("page.html").with_widget("cart-mini", cart_builder);
        let (dispatcher, runtime, _guard) = active_dispatcher(view);

        // Locally registered name is invisible to the global lookup.
        let html = dispatcher
            .render_global_named(&env, "cart-mini", &[])
            .unwrap();
        assert_eq!(html, "");

        runtime.register_global("cart-mini", cart_builder);
        let html = dispatcher
            .render_global_named(&env, "cart-mini", &[Value::from(5)])
            .unwrap();
        assert_eq!(html, "<span>5 items</span>");
    }

    #[test]
    fn test_render_global_named_without_active_context() {
        let env = test_env();
        let runtime = Arc::new(WidgetRuntime::new());
        runtime.register_global("cart-mini", cart_builder);
        let dispatcher = RenderDispatcher::new(Arc::clone(&runtime));

        // Global lookups do not require an active render pass.
        let html = dispatcher
            .render_global_named(&env, "cart-mini", &[Value::from(1)])
            .unwrap();
        assert_eq!(html, "<span>1 items</span>");
        assert_eq!(runtime.depth(), 0);
    }

    // =========================================================================
    // exists
    // =========================================================================

    #[test]
    fn test_exists_reflects_container() {
        let view = PageView::new("page.html").with_widget("cart-mini", cart_builder);
        let (dispatcher, _runtime, _guard) = active_dispatcher(view);

        assert!(dispatcher.exists("cart-mini").unwrap());
        assert!(!dispatcher.exists("wishlist").unwrap());
    }

    #[test]
    fn test_exists_on_empty_registry() {
        let dispatcher = RenderDispatcher::new(Arc::new(WidgetRuntime::new()));
        assert!(matches!(
            dispatcher.exists("cart-mini"),
            Err(WidgetError::EmptyRegistry)
        ));
    }
}
