//! Market command - create and list market events.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tracing::info;

use flohmarkt_core::validation::{parse_market_date, MARKET_DATE_FORMAT};
use flohmarkt_core::{Market, MarketId};

use super::{open_database, print_json};
use crate::config::AppConfig;
use crate::OutputFormat;

/// Arguments for the market command.
#[derive(Debug, Args)]
pub struct MarketArgs {
    #[command(subcommand)]
    pub action: MarketAction,
}

/// Market actions.
#[derive(Debug, Subcommand)]
pub enum MarketAction {
    /// Create a market; it gets the next id.
    Create {
        /// Display name, e.g. "Frühjahrsflohmarkt".
        #[arg(long)]
        name: String,

        /// Market day as dd.mm.yyyy.
        #[arg(long)]
        date: String,
    },
    /// List all markets, earliest first.
    List,
    /// Show one market.
    Show {
        /// Market id.
        id: i64,
    },
}

/// Execute the market command.
///
/// # Errors
///
/// Returns an error if the date does not parse, the market is unknown, or
/// the database fails.
pub async fn execute(args: MarketArgs, config: &AppConfig) -> Result<()> {
    let db = open_database(config).await?;

    match args.action {
        MarketAction::Create { name, date } => {
            let date = parse_market_date(&date)?;
            let market = db
                .markets()
                .create(&name, date)
                .await
                .context("Failed to create market")?;
            info!(market_id = %market.id, "Market created");
            print_markets(std::slice::from_ref(&market), config.format)
        }
        MarketAction::List => {
            let markets = db.markets().list().await.context("Failed to list markets")?;
            print_markets(&markets, config.format)
        }
        MarketAction::Show { id } => {
            let market = db
                .markets()
                .get(MarketId(id))
                .await?
                .with_context(|| format!("Market {id} not found"))?;
            print_markets(std::slice::from_ref(&market), config.format)
        }
    }
}

fn print_markets(markets: &[Market], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(markets),
        OutputFormat::Text => {
            if markets.is_empty() {
                println!("No markets yet");
            }
            for market in markets {
                println!(
                    "{:>4}  {}  {}",
                    market.id,
                    market.date.format(MARKET_DATE_FORMAT),
                    market.name
                );
            }
            Ok(())
        }
    }
}
