//! Client errors.

use std::io;

use thiserror::Error;

use crate::{config::ConfigError, gateway::HttpGatewayError};

/// Errors that end a command-line run.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The gateway could not be set up.
    #[error(transparent)]
    Gateway(#[from] HttpGatewayError),

    /// Output could not be written.
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),

    /// The cart operation finished with an error.
    #[error("{0}")]
    Failed(String),
}
