//! A catalog page with a cart widget and a newsletter-signup widget.
//!
//! Demonstrates the full widget surface:
//!
//! - a custom [`Widget`] implementation with constructor arguments
//!   (`CartMiniWidget`, built from the session id the template passes)
//! - a globally registered widget rendered via `widget_global`
//! - `widget_exists` for optional markup
//! - the `_widget` and `_view` globals inside widget templates

use std::sync::Arc;

use anyhow::Result;
use minijinja::Value;
use serde::Serialize;
use vitrine::{PageView, StaticWidget, Widget, WidgetEngine, WidgetError};

const CATALOG_TEMPLATE: &str = "\
<header>
  <h1>{{ category }}</h1>
  {{ widget(\"cart-mini\", session) }}
</header>
<ul>
{%- for product in products %}
  <li>{{ product.name }}: {{ product.price }}</li>
{%- endfor %}
</ul>
{% if widget_exists(\"cart-mini\") -%}
<a href=\"/cart\">Go to cart</a>
{% endif -%}
{{ widget_global(\"newsletter-signup\") }}";

const CART_TEMPLATE: &str = "\
<div class=\"cart-mini\" data-session=\"{{ _widget.session }}\">
  {{ _widget.items }} item(s) in your cart on the {{ _view.category }} page
</div>";

const NEWSLETTER_TEMPLATE: &str = "\
<form method=\"post\" action=\"{{ _widget.endpoint }}\">
  <input type=\"email\" name=\"subscriber\" />
  <button>Subscribe</button>
</form>";

#[derive(Serialize)]
struct CartSummary {
    session: String,
    items: usize,
}

/// Cart teaser widget, constructed from the session id passed by the
/// calling template.
struct CartMiniWidget {
    summary: CartSummary,
}

impl CartMiniWidget {
    fn build(args: &[Value]) -> Result<Arc<dyn Widget>, WidgetError> {
        let session = match args.first() {
            Some(value) => value.to_string(),
            None => {
                return Err(WidgetError::InvalidArguments {
                    name: "cart-mini".to_string(),
                    message: "expected a session id".to_string(),
                })
            }
        };
        // A real storefront would ask a cart client here, keyed by session.
        let items = session.len() % 5;
        Ok(Arc::new(CartMiniWidget {
            summary: CartSummary { session, items },
        }))
    }
}

impl Widget for CartMiniWidget {
    fn template(&self) -> &str {
        "widgets/cart-mini.html"
    }

    fn value(&self) -> Value {
        Value::from_serialize(&self.summary)
    }
}

fn main() -> Result<()> {
    let mut engine = WidgetEngine::new();
    engine.add_template("catalog/page.html", CATALOG_TEMPLATE)?;
    engine.add_template("widgets/cart-mini.html", CART_TEMPLATE)?;
    engine.add_template("widgets/newsletter.html", NEWSLETTER_TEMPLATE)?;

    engine.register_global_widget("newsletter-signup", |_args| {
        Ok(Arc::new(
            StaticWidget::new("widgets/newsletter.html")
                .with_data(&serde_json::json!({ "endpoint": "/newsletter/subscribe" })),
        ) as Arc<dyn Widget>)
    });

    let view = PageView::new("catalog/page.html")
        .with_data(&serde_json::json!({
            "category": "Cameras",
            "session": "s-1b2d",
            "products": [
                { "name": "Pinhole 35", "price": "49.00" },
                { "name": "Rangefinder X", "price": "349.00" },
            ],
        }))
        .with_widget("cart-mini", CartMiniWidget::build);

    let html = engine.render_page(view)?;
    println!("{html}");
    Ok(())
}
