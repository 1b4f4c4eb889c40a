//! Settle command - rebuild the settlement records of a market.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use flohmarkt_core::settlement::{market_summary, MarketSummary};

use super::{open_database, print_json};
use crate::config::AppConfig;
use crate::{render, OutputFormat};

/// Arguments for the settle command.
#[derive(Debug, Args)]
pub struct SettleArgs {
    /// Also list every item that could not be attributed to a seller.
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

#[derive(Serialize)]
struct SettleOutput {
    summary: MarketSummary,
    unattributed: Vec<String>,
}

/// Execute the settle command.
///
/// Runs are not incremental; settling again replaces the previous records.
///
/// # Errors
///
/// Returns an error if no market is configured or the database fails.
pub async fn execute(args: SettleArgs, config: &AppConfig) -> Result<()> {
    let market_id = config.require_market()?;
    let db = open_database(config).await?;

    let market = db
        .markets()
        .get(market_id)
        .await?
        .with_context(|| format!("Market {market_id} not found"))?;

    let run = db
        .settlements()
        .run(market_id)
        .await
        .with_context(|| format!("Settlement of market {market_id} failed"))?;
    let summary = market_summary(&run.records);

    match config.format {
        OutputFormat::Json => print_json(&SettleOutput {
            summary,
            unattributed: run.anomalies.iter().map(ToString::to_string).collect(),
        }),
        OutputFormat::Text => {
            println!("{}", render::market_summary(&market, &summary));

            if !run.anomalies.is_empty() {
                println!();
                println!("{} items could not be attributed", run.anomalies.len());
                if args.verbose {
                    for anomaly in &run.anomalies {
                        println!("  {anomaly}");
                    }
                }
            }
            Ok(())
        }
    }
}
