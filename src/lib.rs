//! Cartsync
//!
//! Cartsync keeps a locally displayed shopping cart consistent with a remote cart service,
//! showing every mutation immediately and reconciling it with the server in the background.

pub mod cart;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod idempotency;
pub mod materializer;
pub mod metadata;
pub mod queue;
pub mod synchronizer;

#[cfg(test)]
mod test;

pub use cart::{CartSnapshot, LineItem};
pub use catalog::{CalculatedPrice, Product, Variant};
pub use config::SyncConfig;
pub use errors::SyncError;
pub use gateway::{AddLineItem, CartGateway, GatewayError};
pub use metadata::Metadata;
pub use synchronizer::{AddToCart, CartEvent, CartState, CartSynchronizer, RemoveOutcome};
