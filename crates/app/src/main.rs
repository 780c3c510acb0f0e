//! Cartsync CLI

use std::{io, process};

use cartsync_app::{cli::Cli, observability};

#[tokio::main]
pub async fn main() {
    let cli = Cli::load().unwrap_or_else(|error| error.exit());

    if let Err(error) = observability::init_subscriber(&cli.config.logging) {
        eprintln!("{error}");
        process::exit(1);
    }

    if let Err(error) = cli.run(&mut io::stdout().lock()).await {
        eprintln!("{error}");
        process::exit(1);
    }
}
