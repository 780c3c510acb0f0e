//! Synchronizer configuration.

use rusty_money::iso::{self, Currency};

/// Country used when an add request does not name one.
pub const DEFAULT_COUNTRY_CODE: &str = "us";

/// Number of change signals a slow subscriber may fall behind by.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Process-wide defaults used by the synchronizer.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// Country code sent with add requests that do not specify one.
    pub default_country_code: String,

    /// Currency for a synthesized cart when neither the variant nor any earlier cart names one.
    pub default_currency: &'static Currency,

    /// Capacity of the change signal channel.
    pub event_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            default_country_code: DEFAULT_COUNTRY_CODE.to_string(),
            default_currency: iso::USD,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}
