//! Client configuration module

use clap::Args;
use thiserror::Error;

pub mod gateway;
pub mod logging;
pub mod sync;

pub use gateway::GatewayConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use sync::SyncArgs;

/// Errors raised while turning arguments into runtime settings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Currency code not known to the ISO currency table.
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Cart API URL is not an absolute http(s) URL.
    #[error("cart API URL must start with http:// or https://: {0}")]
    InvalidApiUrl(String),

    /// Request timeout of zero seconds.
    #[error("cart API timeout must be at least one second")]
    InvalidTimeout,
}

/// Settings shared by every command.
#[derive(Debug, Args)]
pub struct AppConfig {
    /// Cart service connection settings.
    #[command(flatten)]
    pub gateway: GatewayConfig,

    /// Synchronizer defaults.
    #[command(flatten)]
    pub sync: SyncArgs,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,
}
