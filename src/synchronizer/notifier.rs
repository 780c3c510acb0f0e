//! Notification side channel.

use mockall::automock;
use tracing::{info, warn};

/// User-facing notice about a finished cart mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The mutation went through, e.g. "Item added to cart".
    Success(String),

    /// The mutation failed; carries the error text.
    Error(String),
}

/// Receives fire-and-forget notices, e.g. to show a toast.
#[automock]
pub trait CartNotifier: Send + Sync {
    /// Deliver a notice. Must not block.
    fn notify(&self, notice: Notice);
}

/// Notifier that writes notices to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl CartNotifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice {
            Notice::Success(message) => info!(target: "cartsync::notice", "{message}"),
            Notice::Error(message) => warn!(target: "cartsync::notice", "{message}"),
        }
    }
}
