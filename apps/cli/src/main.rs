//! Entry point for the `flohmarkt` binary.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use flohmarkt_cli::commands;
use flohmarkt_cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config().context("Invalid configuration")?;

    init_tracing(&config.logging.filter);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        match cli.command {
            Commands::Market(args) => commands::market::execute(args, &config).await,
            Commands::Seller(args) => commands::seller::execute(args, &config).await,
            Commands::Receipt(args) => commands::receipt::execute(args, &config).await,
            Commands::Settle(args) => commands::settle::execute(args, &config).await,
            Commands::Report(args) => commands::report::execute(args, &config).await,
            Commands::Labels(args) => commands::labels::execute(args, &config).await,
        }
    })
}

/// Logs go to stderr so JSON and CSV on stdout stay clean. RUST_LOG wins
/// over the configured filter.
fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
