//! Synchronizer errors.

use thiserror::Error;

use crate::{gateway::GatewayError, materializer::MaterializeError};

/// Errors reported to callers awaiting a cart mutation.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SyncError {
    /// There is no cart to remove from.
    #[error("no cart found")]
    NoCart,

    /// The optimistic cart could not be built.
    #[error(transparent)]
    Materialize(#[from] MaterializeError),

    /// The cart service call failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The mutation never reported back: its queue was shut down or the step panicked.
    #[error("cart mutation aborted")]
    Aborted,
}
