use std::{io, sync::Arc};

use cartsync::{CartSynchronizer, synchronizer::TracingNotifier};
use clap::{Parser, Subcommand};
use tracing::warn;

use crate::{
    config::AppConfig, errors::AppError, gateway::HttpCartGateway, render::write_cart,
};

pub mod add;
pub mod remove;

/// Command-line client for a store cart.
#[derive(Debug, Parser)]
#[command(name = "cartsync", about = "Cartsync CLI", long_about = None)]
pub struct Cli {
    /// Settings shared by every command.
    #[command(flatten)]
    pub config: AppConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the current cart
    Show,

    /// Add a line item
    Add(add::AddArgs),

    /// Remove a line item
    Remove(remove::RemoveArgs),
}

impl Cli {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    /// Load the cart, run the command and print the resulting cart to `out`.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid settings, unwritable output, or when the
    /// cart ends up with an error recorded.
    pub async fn run(self, out: &mut impl io::Write) -> Result<(), AppError> {
        let Self { config, command } = self;

        let sync = connect(&config)?;

        sync.reload_from_server().await;

        if let Some(error) = sync.last_error() {
            warn!("skipping command, cart could not be loaded: {error}");
        } else {
            match command {
                Commands::Show => {}
                Commands::Add(args) => add::run(&sync, args, &config).await?,
                Commands::Remove(args) => remove::run(&sync, args).await,
            }
        }

        let state = sync.state();

        sync.shutdown().await;

        write_cart(out, &state)?;

        match state.last_error {
            Some(error) => Err(AppError::Failed(error)),
            None => Ok(()),
        }
    }
}

fn connect(config: &AppConfig) -> Result<CartSynchronizer, AppError> {
    let gateway = HttpCartGateway::new(&config.gateway)?;

    Ok(CartSynchronizer::builder(Arc::new(gateway))
        .config(config.sync.to_sync_config()?)
        .notifier(Arc::new(TracingNotifier))
        .build())
}
