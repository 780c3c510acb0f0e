//! Local Cart Materializer
//!
//! Builds the provisional cart shown while a mutation is still in flight.
//! Everything here is synchronous and free of I/O.

use std::sync::Arc;

use jiff::Timestamp;
use rusty_money::iso::Currency;
use thiserror::Error;

use crate::{
    cart::{CartSnapshot, LineItem, TEMP_LINE_PREFIX},
    catalog::{Product, Variant},
    metadata::Metadata,
};

/// Errors raised for inputs no caller should ever produce.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MaterializeError {
    /// A required identifier was empty.
    #[error("missing {0} identifier")]
    MissingIdentifier(&'static str),

    /// Quantity to add was zero.
    #[error("quantity must be positive")]
    InvalidQuantity,

    /// An amount no longer fits in minor units.
    #[error("cart amount overflow")]
    AmountOverflow,
}

/// Build the cart that results from adding `quantity` units of `variant`.
///
/// When `base` is absent an empty cart is synthesized in the variant's
/// currency, or `fallback_currency` when the variant has no price. A line with
/// the same variant and equal metadata has its quantity increased; otherwise a
/// new line with a temporary id is appended. Lines that do not change are
/// shared with `base`.
///
/// A variant priced in a currency other than the cart's gets a unit price of
/// zero until the server prices it.
///
/// # Errors
///
/// - [`MaterializeError::MissingIdentifier`]: the variant or product id is empty.
/// - [`MaterializeError::InvalidQuantity`]: `quantity` is zero.
/// - [`MaterializeError::AmountOverflow`]: a total does not fit in a `u64`.
pub fn materialize_add(
    base: Option<&CartSnapshot>,
    product: &Product,
    variant: &Variant,
    quantity: u32,
    metadata: &Metadata,
    fallback_currency: &'static Currency,
) -> Result<CartSnapshot, MaterializeError> {
    if variant.id.is_empty() {
        return Err(MaterializeError::MissingIdentifier("variant"));
    }

    if product.id.is_empty() {
        return Err(MaterializeError::MissingIdentifier("product"));
    }

    if quantity == 0 {
        return Err(MaterializeError::InvalidQuantity);
    }

    let mut cart = match base {
        Some(base) => base.clone(),
        None => CartSnapshot::empty(variant.currency().unwrap_or(fallback_currency)),
    };

    let existing = cart
        .line_items
        .iter()
        .position(|line| line.matches(&variant.id, metadata));

    match existing.and_then(|idx| cart.line_items.get_mut(idx)) {
        Some(line) => *line = Arc::new(increment_line(line, quantity)?),
        None => {
            let line = new_line(product, variant, quantity, metadata, cart.currency)?;
            cart.line_items.push(Arc::new(line));
        }
    }

    recompute_totals(&mut cart)?;

    Ok(cart)
}

fn increment_line(line: &LineItem, quantity: u32) -> Result<LineItem, MaterializeError> {
    let added = line
        .unit_price
        .checked_mul(u64::from(quantity))
        .ok_or(MaterializeError::AmountOverflow)?;

    Ok(LineItem {
        quantity: line
            .quantity
            .checked_add(quantity)
            .ok_or(MaterializeError::AmountOverflow)?,
        total: line
            .total
            .checked_add(added)
            .ok_or(MaterializeError::AmountOverflow)?,
        original_total: line
            .original_total
            .checked_add(added)
            .ok_or(MaterializeError::AmountOverflow)?,
        ..line.clone()
    })
}

fn new_line(
    product: &Product,
    variant: &Variant,
    quantity: u32,
    metadata: &Metadata,
    currency: &'static Currency,
) -> Result<LineItem, MaterializeError> {
    let unit_price = variant
        .calculated_price
        .filter(|price| price.currency == currency)
        .map_or(0, |price| price.amount);
    let total = unit_price
        .checked_mul(u64::from(quantity))
        .ok_or(MaterializeError::AmountOverflow)?;

    Ok(LineItem {
        id: temporary_line_id(&variant.id),
        variant_id: variant.id.clone(),
        product_id: product.id.clone(),
        title: line_title(product, variant),
        thumbnail: product.thumbnail.clone(),
        quantity,
        unit_price,
        total,
        original_total: total,
        metadata: metadata.clone(),
    })
}

fn temporary_line_id(variant_id: &str) -> String {
    format!(
        "{TEMP_LINE_PREFIX}{variant_id}-{}",
        Timestamp::now().as_millisecond()
    )
}

fn line_title(product: &Product, variant: &Variant) -> String {
    if variant.title.is_empty() || variant.title == product.title {
        product.title.clone()
    } else {
        format!("{} - {}", product.title, variant.title)
    }
}

/// Recompute the derived totals; shipping and tax carry over unchanged.
fn recompute_totals(cart: &mut CartSnapshot) -> Result<(), MaterializeError> {
    let item_subtotal = cart
        .line_items
        .iter()
        .try_fold(0_u64, |acc, line| acc.checked_add(line.total))
        .ok_or(MaterializeError::AmountOverflow)?;

    cart.item_subtotal = item_subtotal;
    cart.subtotal = item_subtotal;
    cart.total = item_subtotal
        .checked_add(cart.shipping_subtotal)
        .and_then(|total| total.checked_add(cart.tax_total))
        .ok_or(MaterializeError::AmountOverflow)?;

    Ok(())
}
