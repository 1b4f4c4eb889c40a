//! Receipt command - the cashier flow of one market.
//!
//! Every market has exactly one open receipt. Scanning adds to it,
//! finalizing closes it and opens the next number.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tracing::info;

use flohmarkt_core::{ArticleCode, Receipt};

use super::{open_database, print_json};
use crate::config::AppConfig;
use crate::{render, OutputFormat};

/// Arguments for the receipt command.
#[derive(Debug, Args)]
pub struct ReceiptArgs {
    #[command(subcommand)]
    pub action: ReceiptAction,
}

/// Receipt actions.
#[derive(Debug, Subcommand)]
pub enum ReceiptAction {
    /// Show the open receipt with its running total.
    Current,
    /// Scan one or more article codes onto the open receipt.
    Add {
        /// Codes as printed or scanned, e.g. 40010500 or *40010500*.
        #[arg(required = true)]
        codes: Vec<String>,
    },
    /// Close the open receipt and start the next one.
    Finalize,
    /// Show a receipt by number.
    Show {
        /// Receipt number within the market.
        number: i64,
    },
    /// List finalized receipts with a non-zero total.
    Archive {
        /// Only receipts containing this exact code.
        #[arg(long)]
        code: Option<String>,
    },
    /// Remove an item from the open receipt.
    RemoveItem {
        /// Line number as shown by `receipt current`.
        line: usize,
    },
    /// Recompute stored totals of every receipt from their codes.
    Recompute,
}

/// Execute the receipt command.
///
/// # Errors
///
/// Returns an error if no market is configured, a code is invalid or
/// belongs to an unknown seller, the receipt is empty on finalize, or the
/// database fails.
pub async fn execute(args: ReceiptArgs, config: &AppConfig) -> Result<()> {
    let market_id = config.require_market()?;
    let db = open_database(config).await?;
    let receipts = db.receipts();

    match args.action {
        ReceiptAction::Current => {
            let receipt = receipts.current_open(market_id).await?;
            print_receipts(std::slice::from_ref(&receipt), config.format)
        }
        ReceiptAction::Add { codes } => {
            let codes = codes
                .iter()
                .map(|raw| {
                    raw.parse::<ArticleCode>()
                        .with_context(|| format!("'{raw}' is not an article code"))
                })
                .collect::<Result<Vec<_>>>()?;

            let receipt = receipts.current_open(market_id).await?;
            for code in codes {
                receipts
                    .append_item(&receipt.id, code)
                    .await
                    .with_context(|| format!("Item {code} rejected"))?;
            }

            let receipt = receipts
                .get(&receipt.id)
                .await?
                .context("Open receipt disappeared")?;
            print_receipts(std::slice::from_ref(&receipt), config.format)
        }
        ReceiptAction::Finalize => {
            let open = receipts.current_open(market_id).await?;
            let finalized = receipts
                .finalize(&open.id)
                .await
                .with_context(|| format!("Failed to finalize receipt {}", open.number))?;

            info!(
                %market_id,
                number = finalized.receipt.number,
                total = %finalized.receipt.total,
                "Receipt finalized"
            );
            print_receipts(std::slice::from_ref(&finalized.receipt), config.format)?;
            if config.format == OutputFormat::Text {
                println!();
                println!("Next receipt: {}", finalized.next.number);
            }
            Ok(())
        }
        ReceiptAction::Show { number } => {
            let receipt = receipts
                .get_by_number(market_id, number)
                .await?
                .with_context(|| format!("Receipt {number} not found in market {market_id}"))?;
            print_receipts(std::slice::from_ref(&receipt), config.format)
        }
        ReceiptAction::Archive { code } => {
            let code = code
                .map(|raw| {
                    raw.parse::<ArticleCode>()
                        .with_context(|| format!("'{raw}' is not an article code"))
                })
                .transpose()?;
            let archived = receipts.archive(market_id, code).await?;
            print_receipts(&archived, config.format)
        }
        ReceiptAction::RemoveItem { line } => {
            let open = receipts.current_open(market_id).await?;
            let item = line
                .checked_sub(1)
                .and_then(|index| open.items.get(index))
                .with_context(|| {
                    format!("Receipt {} has no line {line}", open.number)
                })?;

            let receipt = receipts.remove_item(&open.id, &item.id).await?;
            print_receipts(std::slice::from_ref(&receipt), config.format)
        }
        ReceiptAction::Recompute => {
            let changed = receipts.recompute_totals(market_id).await?;
            println!("{changed} receipt totals corrected");
            Ok(())
        }
    }
}

fn print_receipts(receipts: &[Receipt], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(receipts),
        OutputFormat::Text => {
            if receipts.is_empty() {
                println!("No receipts");
            }
            for (i, receipt) in receipts.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                println!("{}", render::receipt(receipt));
            }
            Ok(())
        }
    }
}
