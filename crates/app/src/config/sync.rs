//! Synchronizer Config

use cartsync::{SyncConfig, config::DEFAULT_COUNTRY_CODE};
use clap::Args;
use rusty_money::iso::{self, Currency};

use super::ConfigError;

/// Synchronizer defaults.
#[derive(Debug, Clone, Args)]
pub struct SyncArgs {
    /// Country used to price add requests that do not name one
    #[arg(long, env = "DEFAULT_COUNTRY_CODE", default_value = DEFAULT_COUNTRY_CODE)]
    pub default_country_code: String,

    /// Currency for a cart synthesized before the server has created one
    #[arg(long, env = "DEFAULT_CURRENCY_CODE", default_value = "USD")]
    pub default_currency_code: String,
}

impl SyncArgs {
    /// Build the synchronizer configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownCurrency`] for an unrecognised currency code.
    pub fn to_sync_config(&self) -> Result<SyncConfig, ConfigError> {
        Ok(SyncConfig {
            default_country_code: self.default_country_code.to_lowercase(),
            default_currency: currency(&self.default_currency_code)?,
            ..SyncConfig::default()
        })
    }
}

/// Look up an ISO currency by code, ignoring case.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownCurrency`] for an unrecognised code.
pub fn currency(code: &str) -> Result<&'static Currency, ConfigError> {
    iso::find(&code.to_uppercase()).ok_or_else(|| ConfigError::UnknownCurrency(code.to_string()))
}
