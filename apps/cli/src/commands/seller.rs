//! Seller command - the seller registry shared by all markets.

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tracing::info;

use flohmarkt_core::validation::validate_seller_id;
use flohmarkt_core::Seller;

use super::{open_database, print_json};
use crate::config::AppConfig;
use crate::OutputFormat;

/// Arguments for the seller command.
#[derive(Debug, Args)]
pub struct SellerArgs {
    #[command(subcommand)]
    pub action: SellerAction,
}

/// Seller actions.
#[derive(Debug, Subcommand)]
pub enum SellerAction {
    /// Register a seller.
    Add {
        /// Seller number; defaults to the next free one from 4001.
        #[arg(long)]
        id: Option<i64>,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long)]
        email: Option<String>,
    },
    /// List sellers ordered by number.
    List {
        /// Show deactivated sellers instead of active ones.
        #[arg(long)]
        inactive: bool,
    },
    /// Flip a seller between active and inactive.
    Toggle {
        /// Seller number.
        id: i64,
    },
    /// Delete a seller from the registry.
    Remove {
        /// Seller number.
        id: i64,
    },
    /// Print the next free seller number.
    NextId,
    /// Export active sellers (number, name, email) as CSV.
    Export {
        /// Output file; stdout when omitted.
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
}

/// Execute the seller command.
///
/// # Errors
///
/// Returns an error for invalid seller numbers, duplicates, unknown sellers,
/// or database and I/O failures.
pub async fn execute(args: SellerArgs, config: &AppConfig) -> Result<()> {
    let db = open_database(config).await?;
    let sellers = db.sellers();

    match args.action {
        SellerAction::Add {
            id,
            first_name,
            last_name,
            email,
        } => {
            let seller_id = match id {
                Some(id) => validate_seller_id(id)?,
                None => sellers
                    .next_free_seller_id()
                    .await?
                    .context("No free seller number left")?,
            };

            let seller = sellers
                .insert(&Seller {
                    seller_id,
                    first_name,
                    last_name,
                    email,
                    active: true,
                })
                .await
                .with_context(|| format!("Failed to register seller {seller_id}"))?;

            info!(seller_id = %seller.seller_id, "Seller registered");
            print_sellers(std::slice::from_ref(&seller), config.format)
        }
        SellerAction::List { inactive } => {
            let list = if inactive {
                sellers.list_inactive().await?
            } else {
                sellers.list_active().await?
            };
            print_sellers(&list, config.format)
        }
        SellerAction::Toggle { id } => {
            let seller = sellers
                .toggle_active(validate_seller_id(id)?)
                .await
                .with_context(|| format!("Failed to toggle seller {id}"))?;
            let state = if seller.active { "active" } else { "inactive" };
            println!("Seller {} is now {state}", seller.seller_id);
            Ok(())
        }
        SellerAction::Remove { id } => {
            let seller_id = validate_seller_id(id)?;
            sellers
                .delete(seller_id)
                .await
                .with_context(|| format!("Failed to remove seller {id}"))?;
            println!("Seller {seller_id} removed");
            Ok(())
        }
        SellerAction::NextId => {
            match sellers.next_free_seller_id().await? {
                Some(id) => println!("{id}"),
                None => anyhow::bail!("No free seller number left"),
            }
            Ok(())
        }
        SellerAction::Export { output } => {
            let active = sellers.list_active().await?;
            match output {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    write_seller_csv(&active, file)?;
                    info!(path = %path.display(), sellers = active.len(), "Seller list exported");
                }
                None => write_seller_csv(&active, io::stdout().lock())?,
            }
            Ok(())
        }
    }
}

/// Writes the seller name list as CSV with a header row.
pub fn write_seller_csv<W: Write>(sellers: &[Seller], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["seller_id", "name", "email"])?;

    for seller in sellers {
        csv.write_record([
            seller.seller_id.to_string(),
            seller.full_name(),
            seller.email.clone().unwrap_or_default(),
        ])?;
    }

    csv.flush().context("Failed to write seller list")?;
    Ok(())
}

fn print_sellers(sellers: &[Seller], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(sellers),
        OutputFormat::Text => {
            if sellers.is_empty() {
                println!("No sellers");
            }
            for seller in sellers {
                println!(
                    "{:>4}  {:<30}  {}",
                    seller.seller_id,
                    seller.full_name(),
                    seller.email.as_deref().unwrap_or("-")
                );
            }
            Ok(())
        }
    }
}
