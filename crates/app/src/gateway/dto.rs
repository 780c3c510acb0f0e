//! Store API wire types.
//!
//! Amounts travel as integers in minor units of the cart currency.

use std::sync::Arc;

use cartsync::{CartSnapshot, LineItem, Metadata};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::sync::currency;

/// Errors converting a wire cart into a [`CartSnapshot`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartConversionError {
    /// The cart's currency code is not an ISO currency.
    #[error("cart {cart_id} has unknown currency {code}")]
    UnknownCurrency {
        /// Cart identifier
        cart_id: String,

        /// Currency code as sent
        code: String,
    },

    /// A line item has no variant.
    #[error("line item {0} has no variant")]
    MissingVariant(String),

    /// A line item has a zero quantity.
    #[error("line item {0} has zero quantity")]
    ZeroQuantity(String),

    /// A line total does not fit in minor units.
    #[error("line item {0} total overflows")]
    AmountOverflow(String),
}

#[derive(Debug, Deserialize)]
pub(crate) struct CartResponse {
    pub cart: CartDto,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateCartBody<'a> {
    pub country_code: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct AddLineItemBody<'a> {
    pub variant_id: &'a str,
    pub quantity: u32,
    pub metadata: &'a Metadata,
}

/// Cart as returned by the store API.
#[derive(Debug, Clone, Deserialize)]
pub struct CartDto {
    /// Cart identifier
    pub id: String,

    /// ISO currency code, any case
    pub currency_code: String,

    /// Line items in display order
    #[serde(default)]
    pub items: Vec<LineItemDto>,

    /// Sum of line totals
    #[serde(default)]
    pub item_subtotal: Option<u64>,

    /// Subtotal before shipping and tax
    #[serde(default)]
    pub subtotal: Option<u64>,

    /// Shipping charged
    #[serde(default)]
    pub shipping_subtotal: u64,

    /// Tax charged
    #[serde(default)]
    pub tax_total: u64,

    /// Grand total
    #[serde(default)]
    pub total: Option<u64>,

    /// Last modification
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

/// Line item as returned by the store API.
#[derive(Debug, Clone, Deserialize)]
pub struct LineItemDto {
    /// Line identifier
    pub id: String,

    /// Variant identifier
    #[serde(default)]
    pub variant_id: Option<String>,

    /// Product identifier
    #[serde(default)]
    pub product_id: Option<String>,

    /// Display title
    #[serde(default)]
    pub title: String,

    /// Thumbnail image URL
    #[serde(default)]
    pub thumbnail: Option<String>,

    /// Number of units
    pub quantity: u32,

    /// Unit price in minor units
    pub unit_price: u64,

    /// Line total; `unit_price * quantity` when absent.
    #[serde(default)]
    pub total: Option<u64>,

    /// Line total before adjustments; `total` when absent.
    #[serde(default)]
    pub original_total: Option<u64>,

    /// Line metadata
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

impl TryFrom<LineItemDto> for LineItem {
    type Error = CartConversionError;

    fn try_from(dto: LineItemDto) -> Result<Self, Self::Error> {
        let Some(variant_id) = dto.variant_id.filter(|id| !id.is_empty()) else {
            return Err(CartConversionError::MissingVariant(dto.id));
        };

        if dto.quantity == 0 {
            return Err(CartConversionError::ZeroQuantity(dto.id));
        }

        let total = match dto.total {
            Some(total) => total,
            None => dto
                .unit_price
                .checked_mul(u64::from(dto.quantity))
                .ok_or_else(|| CartConversionError::AmountOverflow(dto.id.clone()))?,
        };

        Ok(Self {
            id: dto.id,
            variant_id,
            product_id: dto.product_id.unwrap_or_default(),
            title: dto.title,
            thumbnail: dto.thumbnail,
            quantity: dto.quantity,
            unit_price: dto.unit_price,
            total,
            original_total: dto.original_total.unwrap_or(total),
            metadata: Metadata::from(dto.metadata),
        })
    }
}

impl TryFrom<CartDto> for CartSnapshot {
    type Error = CartConversionError;

    fn try_from(dto: CartDto) -> Result<Self, Self::Error> {
        let currency = currency(&dto.currency_code).map_err(|_error| {
            CartConversionError::UnknownCurrency {
                cart_id: dto.id.clone(),
                code: dto.currency_code.clone(),
            }
        })?;

        let line_items = dto
            .items
            .into_iter()
            .map(|item| LineItem::try_from(item).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        let summed = line_items
            .iter()
            .try_fold(0_u64, |acc, line| acc.checked_add(line.total))
            .ok_or_else(|| CartConversionError::AmountOverflow(dto.id.clone()))?;

        let item_subtotal = dto.item_subtotal.unwrap_or(summed);
        let subtotal = dto.subtotal.unwrap_or(item_subtotal);

        let total = match dto.total {
            Some(total) => total,
            None => subtotal
                .checked_add(dto.shipping_subtotal)
                .and_then(|total| total.checked_add(dto.tax_total))
                .ok_or_else(|| CartConversionError::AmountOverflow(dto.id.clone()))?,
        };

        Ok(Self {
            id: dto.id,
            currency,
            line_items,
            item_subtotal,
            subtotal,
            shipping_subtotal: dto.shipping_subtotal,
            tax_total: dto.tax_total,
            total,
            updated_at: dto.updated_at,
        })
    }
}
