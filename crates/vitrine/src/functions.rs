//! Template-function registration.
//!
//! Installs the widget surface into a MiniJinja environment:
//!
//! - `widget(name, ...args)` renders a widget registered by the currently
//!   rendering context, or nothing if the name is not registered.
//! - `widget_block(name, block, ...args)` renders one named block of the
//!   widget's template.
//! - `widget_global(name, ...args)` renders from the engine-scoped global
//!   collection instead of the current context.
//! - `widget_exists(name)` reports whether the current context registers
//!   the name.
//!
//! Rendered fragments come back as safe strings: widgets emit HTML, and
//! auto-escaping must not escape it a second time.

use std::sync::Arc;

use minijinja::value::Rest;
use minijinja::{Environment, State, Value};

use crate::dispatch::RenderDispatcher;
use crate::globals::{CurrentView, CurrentWidget};
use crate::runtime::WidgetRuntime;

/// Registers the widget functions and the `_widget`/`_view` globals on the
/// environment.
///
/// [`WidgetEngine`](crate::WidgetEngine) calls this during construction;
/// applications embedding the widget surface into an environment they manage
/// themselves can call it directly.
pub fn register_widget_functions(env: &mut Environment<'static>, runtime: &Arc<WidgetRuntime>) {
    let dispatcher = RenderDispatcher::new(Arc::clone(runtime));
    env.add_function(
        "widget",
        move |state: &State, name: String, args: Rest<Value>| -> Result<Value, minijinja::Error> {
            let html = dispatcher.render_named(state.env(), &name, &args.0)?;
            Ok(Value::from_safe_string(html))
        },
    );

    let dispatcher = RenderDispatcher::new(Arc::clone(runtime));
    env.add_function(
        "widget_block",
        move |state: &State,
              name: String,
              block: String,
              args: Rest<Value>|
              -> Result<Value, minijinja::Error> {
            let html = dispatcher.render_named_block(state.env(), &name, &block, &args.0)?;
            Ok(Value::from_safe_string(html))
        },
    );

    let dispatcher = RenderDispatcher::new(Arc::clone(runtime));
    env.add_function(
        "widget_global",
        move |state: &State, name: String, args: Rest<Value>| -> Result<Value, minijinja::Error> {
            let html = dispatcher.render_global_named(state.env(), &name, &args.0)?;
            Ok(Value::from_safe_string(html))
        },
    );

    let dispatcher = RenderDispatcher::new(Arc::clone(runtime));
    env.add_function(
        "widget_exists",
        move |name: String| -> Result<bool, minijinja::Error> {
            Ok(dispatcher.exists(&name)?)
        },
    );

    env.add_global(
        "_widget",
        Value::from_object(CurrentWidget::new(Arc::clone(runtime))),
    );
    env.add_global(
        "_view",
        Value::from_object(CurrentView::new(Arc::clone(runtime))),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::{ActiveContext, PageView, StaticWidget, Widget};
    use serde_json::json;

    fn widget_env(runtime: &Arc<WidgetRuntime>) -> Environment<'static> {
        let mut env = Environment::new();
        register_widget_functions(&mut env, runtime);
        env.add_template_owned(
            "cart-mini.html".to_string(),
            "<span>{{ _widget.count }} items</span>".to_string(),
        )
        .unwrap();
        env
    }

    fn enter_view(runtime: &Arc<WidgetRuntime>, view: PageView) -> crate::ContextGuard {
        runtime.enter(ActiveContext::View(Arc::new(view)))
    }

    #[test]
    fn test_widget_function_renders_registered_widget() {
        let runtime = Arc::new(WidgetRuntime::new());
        let env = widget_env(&runtime);

        let view = PageView::new("page.html").with_widget("cart-mini", |args: &[Value]| {
            let count = args.first().cloned().unwrap_or(Value::from(0));
            Ok(Arc::new(
                StaticWidget::new("cart-mini.html").with_data(&json!({ "count": count })),
            ) as Arc<dyn Widget>)
        });
        let _guard = enter_view(&runtime, view);

        let html = env
            .render_str("{{ widget(\"cart-mini\", 4) }}", ())
            .unwrap();
        assert_eq!(html, "<span>4 items</span>");
    }

    #[test]
    fn test_widget_function_missing_name_renders_nothing() {
        let runtime = Arc::new(WidgetRuntime::new());
        let env = widget_env(&runtime);
        let _guard = enter_view(&runtime, PageView::new("page.html"));

        let html = env
            .render_str("[{{ widget(\"wishlist\") }}]", ())
            .unwrap();
        assert_eq!(html, "[]");
    }

    #[test]
    fn test_widget_function_without_context_errors() {
        let runtime = Arc::new(WidgetRuntime::new());
        let env = widget_env(&runtime);

        let err = env
            .render_str("{{ widget(\"cart-mini\") }}", ())
            .unwrap_err();
        assert!(err.to_string().contains("registry is empty"));
    }

    #[test]
    fn test_widget_exists_function() {
        let runtime = Arc::new(WidgetRuntime::new());
        let env = widget_env(&runtime);

        let view = PageView::new("page.html").with_widget("cart-mini", |_args| {
            Ok(Arc::new(StaticWidget::new("cart-mini.html")) as Arc<dyn Widget>)
        });
        let _guard = enter_view(&runtime, view);

        let out = env
            .render_str(
                "{{ widget_exists(\"cart-mini\") }}/{{ widget_exists(\"wishlist\") }}",
                (),
            )
            .unwrap();
        assert_eq!(out, "true/false");
    }

    #[test]
    fn test_widget_global_function_ignores_local_registrations() {
        let runtime = Arc::new(WidgetRuntime::new());
        runtime.register_global("banner", |_args| {
            Ok(Arc::new(
                StaticWidget::new("cart-mini.html").with_data(&json!({ "count": 1 })),
            ) as Arc<dyn Widget>)
        });
        let env = widget_env(&runtime);

        // The view registers nothing locally; the global collection serves it.
        let _guard = enter_view(&runtime, PageView::new("page.html"));
        let html = env.render_str("{{ widget_global(\"banner\") }}", ()).unwrap();
        assert_eq!(html, "<span>1 items</span>");

        // And a locally registered name stays invisible to widget_global.
        let html = env
            .render_str("[{{ widget_global(\"cart-mini\") }}]", ())
            .unwrap();
        assert_eq!(html, "[]");
    }

    #[test]
    fn test_widget_output_is_not_double_escaped() {
        let runtime = Arc::new(WidgetRuntime::new());
        let mut env = Environment::new();
        register_widget_functions(&mut env, &runtime);
        env.add_template_owned(
            "fragment.html".to_string(),
            "<em>hi</em>".to_string(),
        )
        .unwrap();
        // .html template name turns auto-escaping on for the outer render.
        env.add_template_owned(
            "page.html".to_string(),
            "{{ widget(\"fragment\") }}".to_string(),
        )
        .unwrap();

        let view = PageView::new("page.html").with_widget("fragment", |_args| {
            Ok(Arc::new(StaticWidget::new("fragment.html")) as Arc<dyn Widget>)
        });
        let _guard = runtime.enter(ActiveContext::View(Arc::new(view)));

        let html = env.get_template("page.html").unwrap().render(()).unwrap();
        assert_eq!(html, "<em>hi</em>");
    }
}
