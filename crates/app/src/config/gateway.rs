//! Gateway Config

use std::time::Duration;

use clap::Args;

use super::ConfigError;

/// Cart service connection settings.
#[derive(Debug, Clone, Args)]
pub struct GatewayConfig {
    /// Base URL of the store API, e.g. `http://localhost:9000`
    #[arg(long, env = "CART_API_URL", default_value = "http://localhost:9000")]
    pub api_url: String,

    /// Publishable API key sent with every request
    #[arg(long, env = "CART_PUBLISHABLE_KEY", hide_env_values = true)]
    pub publishable_key: Option<String>,

    /// Cart to operate on; a new cart is created on first add when omitted
    #[arg(long, env = "CART_ID")]
    pub cart_id: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "CART_API_TIMEOUT_SECONDS", default_value_t = 10_u64)]
    pub timeout_seconds: u64,
}

impl GatewayConfig {
    /// Base URL without a trailing slash.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidApiUrl`] unless the URL is http(s).
    pub fn base_url(&self) -> Result<&str, ConfigError> {
        let url = self.api_url.trim_end_matches('/');

        if url.starts_with("http://") || url.starts_with("https://") {
            Ok(url)
        } else {
            Err(ConfigError::InvalidApiUrl(self.api_url.clone()))
        }
    }

    /// Request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTimeout`] for a zero timeout.
    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        if self.timeout_seconds == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        Ok(Duration::from_secs(self.timeout_seconds))
    }
}
