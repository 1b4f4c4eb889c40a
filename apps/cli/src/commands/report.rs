//! Report command - settlement pages from the stored records.

use anyhow::{Context, Result};
use clap::Args;

use flohmarkt_core::validation::validate_seller_id;

use super::{open_database, print_json};
use crate::config::AppConfig;
use crate::{render, OutputFormat};

/// Arguments for the report command.
#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Only this seller's page.
    #[arg(long)]
    pub seller: Option<i64>,

    /// Print the market totals after the pages.
    #[arg(long)]
    pub summary: bool,
}

/// Execute the report command.
///
/// Reports read what the last `settle` stored; they never aggregate
/// receipts themselves.
///
/// # Errors
///
/// Returns an error if no market is configured, the seller number is
/// invalid or has no record, or the database fails.
pub async fn execute(args: ReportArgs, config: &AppConfig) -> Result<()> {
    let market_id = config.require_market()?;
    let db = open_database(config).await?;

    let mut pages = db.settlements().report(market_id).await?;

    if let Some(seller) = args.seller {
        let seller_id = validate_seller_id(seller)?;
        pages.retain(|page| page.seller_id == seller_id);
        if pages.is_empty() {
            anyhow::bail!(
                "No settlement record for seller {seller_id} in market {market_id}; run `flohmarkt settle` first"
            );
        }
    } else if pages.is_empty() {
        anyhow::bail!("Market {market_id} has not been settled yet; run `flohmarkt settle` first");
    }

    match config.format {
        OutputFormat::Json => print_json(&pages)?,
        OutputFormat::Text => {
            for (i, page) in pages.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                println!("{}", render::seller_report(page));
            }
        }
    }

    if args.summary {
        let market = db
            .markets()
            .get(market_id)
            .await?
            .with_context(|| format!("Market {market_id} not found"))?;
        let summary = db.settlements().summary(market_id).await?;
        match config.format {
            OutputFormat::Json => print_json(&summary)?,
            OutputFormat::Text => {
                println!();
                println!("{}", render::market_summary(&market, &summary));
            }
        }
    }

    Ok(())
}
