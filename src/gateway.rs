//! Remote Cart Gateway
//!
//! The network boundary the synchronizer talks to. Implementations own the
//! transport; the synchronizer only sees canonical snapshots or errors.

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

use crate::{cart::CartSnapshot, idempotency::IdempotencyKey, metadata::Metadata};

/// Errors reported by a cart gateway.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The cart service could not be reached.
    #[error("cart service unavailable: {0}")]
    Unavailable(String),

    /// The cart service refused the request.
    #[error("{message}")]
    Rejected {
        /// Transport status code, when the transport has one.
        status: Option<u16>,

        /// Human readable reason returned by the service.
        message: String,
    },

    /// The cart service answered with something that is not a cart.
    #[error("unexpected response from cart service: {0}")]
    UnexpectedResponse(String),
}

/// Request to add a line to the current session's cart.
#[derive(Debug, Clone, PartialEq)]
pub struct AddLineItem {
    /// Variant to add
    pub variant_id: String,

    /// Units to add
    pub quantity: u32,

    /// Country used to pick the pricing region
    pub country_code: String,

    /// Line metadata
    pub metadata: Metadata,

    /// Lets the service recognise a retried request.
    pub idempotency_key: IdempotencyKey,
}

/// Remote source of truth for the session's cart.
#[automock]
#[async_trait]
pub trait CartGateway: Send + Sync {
    /// Fetch the authoritative cart, or `None` when the session has no cart.
    ///
    /// Safe to call repeatedly.
    async fn fetch_cart(&self) -> Result<Option<CartSnapshot>, GatewayError>;

    /// Add a line, returning the canonical cart when the service sends one.
    ///
    /// Repeating a request with the same idempotency key must not add the line twice.
    async fn add_line_item(
        &self,
        request: AddLineItem,
    ) -> Result<Option<CartSnapshot>, GatewayError>;

    /// Remove a line by its server id.
    ///
    /// Removing a line that is already gone is not an error.
    async fn remove_line_item(&self, line_id: String) -> Result<(), GatewayError>;
}
