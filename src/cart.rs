//! Cart Snapshots

use std::sync::Arc;

use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};

use crate::metadata::Metadata;

/// Identifier of a cart that has never been confirmed by the server.
pub const TEMP_CART_ID: &str = "temp-cart";

/// Prefix of line item identifiers synthesized before the server confirms the line.
pub const TEMP_LINE_PREFIX: &str = "temp-";

/// Convert a minor-unit amount into money for display and comparison.
pub fn money(amount: u64, currency: &'static Currency) -> Money<'static, Currency> {
    Money::from_minor(i64::try_from(amount).unwrap_or(i64::MAX), currency)
}

/// The cart as displayed to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct CartSnapshot {
    /// Server cart id, or [`TEMP_CART_ID`] for a locally synthesized cart.
    pub id: String,

    /// Currency every amount in the cart is expressed in.
    pub currency: &'static Currency,

    /// Lines in display order.
    pub line_items: Vec<Arc<LineItem>>,

    /// Sum of line totals.
    pub item_subtotal: u64,

    /// Subtotal before shipping and tax.
    pub subtotal: u64,

    /// Shipping charged on the cart.
    pub shipping_subtotal: u64,

    /// Tax charged on the cart.
    pub tax_total: u64,

    /// Grand total.
    pub total: u64,

    /// Last server-side modification; `None` until the server has seen the cart.
    pub updated_at: Option<Timestamp>,
}

impl CartSnapshot {
    /// A locally synthesized cart with no lines.
    pub fn empty(currency: &'static Currency) -> Self {
        Self {
            id: TEMP_CART_ID.to_string(),
            currency,
            line_items: Vec::new(),
            item_subtotal: 0,
            subtotal: 0,
            shipping_subtotal: 0,
            tax_total: 0,
            total: 0,
            updated_at: None,
        }
    }

    /// Whether this snapshot came from the server at some point.
    pub fn is_confirmed(&self) -> bool {
        self.id != TEMP_CART_ID
    }

    /// Find a line by id.
    pub fn line(&self, line_id: &str) -> Option<&Arc<LineItem>> {
        self.line_items.iter().find(|line| line.id == line_id)
    }

    /// Total number of units across all lines.
    pub fn item_count(&self) -> u64 {
        self.line_items
            .iter()
            .map(|line| u64::from(line.quantity))
            .sum()
    }

    /// Whether the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.line_items.is_empty()
    }

    /// Item subtotal as money.
    pub fn item_subtotal_money(&self) -> Money<'static, Currency> {
        money(self.item_subtotal, self.currency)
    }

    /// Shipping as money.
    pub fn shipping_money(&self) -> Money<'static, Currency> {
        money(self.shipping_subtotal, self.currency)
    }

    /// Tax as money.
    pub fn tax_money(&self) -> Money<'static, Currency> {
        money(self.tax_total, self.currency)
    }

    /// Grand total as money.
    pub fn total_money(&self) -> Money<'static, Currency> {
        money(self.total, self.currency)
    }
}

/// One purchasable variant at a given quantity and metadata configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    /// Server line id, or `temp-<variant>-<millis>` until confirmed.
    pub id: String,

    /// Variant identifier
    pub variant_id: String,

    /// Product identifier
    pub product_id: String,

    /// Display title
    pub title: String,

    /// Thumbnail image URL
    pub thumbnail: Option<String>,

    /// Number of units; always positive.
    pub quantity: u32,

    /// Price of one unit in minor units.
    pub unit_price: u64,

    /// Line total in minor units.
    pub total: u64,

    /// Line total before any server-side adjustments.
    pub original_total: u64,

    /// Distinguishes otherwise identical variant lines.
    pub metadata: Metadata,
}

impl LineItem {
    /// Whether the line was synthesized locally and not yet confirmed.
    pub fn is_temporary(&self) -> bool {
        self.id.starts_with(TEMP_LINE_PREFIX)
    }

    /// Whether this line holds the given variant with equal metadata.
    pub fn matches(&self, variant_id: &str, metadata: &Metadata) -> bool {
        self.variant_id == variant_id && self.metadata == *metadata
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso;

    use super::*;

    fn line(id: &str, variant: &str, quantity: u32) -> Arc<LineItem> {
        Arc::new(LineItem {
            id: id.to_string(),
            variant_id: variant.to_string(),
            product_id: "prod_1".to_string(),
            title: "Tee".to_string(),
            thumbnail: None,
            quantity,
            unit_price: 1_500,
            total: 1_500 * u64::from(quantity),
            original_total: 1_500 * u64::from(quantity),
            metadata: Metadata::new(),
        })
    }

    #[test]
    fn empty_cart_is_unconfirmed() {
        let cart = CartSnapshot::empty(iso::EUR);

        assert!(!cart.is_confirmed());
        assert!(cart.is_empty());
        assert_eq!(cart.currency, iso::EUR);
        assert_eq!(cart.total_money(), Money::from_minor(0, iso::EUR));
    }

    #[test]
    fn item_count_sums_quantities() {
        let mut cart = CartSnapshot::empty(iso::GBP);
        cart.line_items = vec![line("li_1", "var_1", 2), line("li_2", "var_2", 3)];

        assert_eq!(cart.item_count(), 5);
        assert!(cart.line("li_2").is_some());
        assert!(cart.line("li_3").is_none());
    }

    #[test]
    fn temporary_lines_are_detected_by_prefix() {
        assert!(line("temp-var_1-1700000000000", "var_1", 1).is_temporary());
        assert!(!line("li_1", "var_1", 1).is_temporary());
    }

    #[test]
    fn matches_requires_equal_metadata() {
        let plain = line("li_1", "var_1", 1);
        let gift = Metadata::new().with("gift", true);

        assert!(plain.matches("var_1", &Metadata::new()));
        assert!(!plain.matches("var_1", &gift));
        assert!(!plain.matches("var_2", &Metadata::new()));
    }
}
