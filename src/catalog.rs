//! Catalog

use rusty_money::{Money, iso::Currency};

use crate::cart::money;

/// The product a variant belongs to, as shown on a line item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// Product identifier
    pub id: String,

    /// Product title
    pub title: String,

    /// Thumbnail image URL
    pub thumbnail: Option<String>,
}

impl Product {
    /// Create a product with no thumbnail.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            thumbnail: None,
        }
    }
}

/// A purchasable variant of a product.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    /// Variant identifier
    pub id: String,

    /// Variant title
    pub title: String,

    /// Current calculated price, when the catalog has priced this variant.
    pub calculated_price: Option<CalculatedPrice>,
}

impl Variant {
    /// Create a variant without a calculated price.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            calculated_price: None,
        }
    }

    /// Attach a calculated price.
    #[must_use]
    pub fn with_price(mut self, amount: u64, currency: &'static Currency) -> Self {
        self.calculated_price = Some(CalculatedPrice { amount, currency });
        self
    }

    /// Currency of the calculated price, if any.
    pub fn currency(&self) -> Option<&'static Currency> {
        self.calculated_price.map(|price| price.currency)
    }
}

/// Price of a single unit in minor units of its currency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalculatedPrice {
    /// Amount in minor units
    pub amount: u64,

    /// Currency the amount is expressed in
    pub currency: &'static Currency,
}

impl CalculatedPrice {
    /// Price as money, for display.
    pub fn to_money(self) -> Money<'static, Currency> {
        money(self.amount, self.currency)
    }
}
