//! Fixtures

use std::sync::Arc;

use jiff::Timestamp;
use rusty_money::iso::{self, Currency};

use crate::{
    cart::{CartSnapshot, LineItem},
    catalog::{Product, Variant},
    metadata::Metadata,
};

/// `updated_at` of [`confirmed_cart`], in seconds.
pub const CONFIRMED_AT: i64 = 1_700_000_000;

/// Tee product and variant at the given price.
pub fn tee(price: u64, currency: &'static Currency) -> (Product, Variant) {
    (
        Product::new("prod_tee", "Tee"),
        Variant::new("var_tee", "Tee").with_price(price, currency),
    )
}

/// Mug product and variant at the given price.
pub fn mug(price: u64, currency: &'static Currency) -> (Product, Variant) {
    (
        Product::new("prod_mug", "Mug"),
        Variant::new("var_mug", "Large").with_price(price, currency),
    )
}

/// Line as the server would return it.
pub fn server_line(id: &str, variant_id: &str, product_id: &str, quantity: u32, unit_price: u64) -> LineItem {
    let total = unit_price * u64::from(quantity);

    LineItem {
        id: id.to_string(),
        variant_id: variant_id.to_string(),
        product_id: product_id.to_string(),
        title: product_id.trim_start_matches("prod_").to_string(),
        thumbnail: None,
        quantity,
        unit_price,
        total,
        original_total: total,
        metadata: Metadata::new(),
    }
}

/// Server cart `cart_01` holding one tee and two mugs, priced in USD.
pub fn confirmed_cart() -> CartSnapshot {
    let line_items = vec![
        Arc::new(server_line("li_tee", "var_tee", "prod_tee", 1, 1_500)),
        Arc::new(server_line("li_mug", "var_mug", "prod_mug", 2, 900)),
    ];

    CartSnapshot {
        id: "cart_01".to_string(),
        currency: iso::USD,
        line_items,
        item_subtotal: 3_300,
        subtotal: 3_300,
        shipping_subtotal: 0,
        tax_total: 0,
        total: 3_300,
        updated_at: Timestamp::from_second(CONFIRMED_AT).ok(),
    }
}
