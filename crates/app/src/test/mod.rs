//! Test support


use serde_json::{Value, json};

use crate::config::GatewayConfig;

pub use server::{Canned, TestServer};

/// Gateway settings pointing at `base_url`.
pub fn gateway_config(base_url: &str, cart_id: Option<&str>) -> GatewayConfig {
    GatewayConfig {
        api_url: base_url.to_string(),
        publishable_key: Some("pk_test".to_string()),
        cart_id: cart_id.map(str::to_string),
        timeout_seconds: 5,
    }
}

/// Store API cart body with one line per `(line id, variant id, quantity)`.
pub fn cart_body(cart_id: &str, lines: &[(&str, &str, u32)]) -> Value {
    let items: Vec<Value> = lines
        .iter()
        .map(|(id, variant_id, quantity)| {
            json!({
                "id": id,
                "variant_id": variant_id,
                "product_id": format!("prod_{variant_id}"),
                "title": variant_id,
                "quantity": quantity,
                "unit_price": 1000,
            })
        })
        .collect();

    json!({
        "cart": {
            "id": cart_id,
            "currency_code": "usd",
            "items": items,
            "updated_at": "2025-06-01T12:00:00Z",
        }
    })
}
