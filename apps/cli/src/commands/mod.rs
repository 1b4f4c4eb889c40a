//! Subcommand implementations.
//!
//! Each module exposes an `Args` struct for clap and an `execute` function
//! returning `anyhow::Result<()>`.

pub mod labels;
pub mod market;
pub mod receipt;
pub mod report;
pub mod seller;
pub mod settle;

use anyhow::{Context, Result};
use serde::Serialize;

use flohmarkt_db::Database;

use crate::config::AppConfig;

/// Opens the configured database, creating and migrating it if needed.
pub(crate) async fn open_database(config: &AppConfig) -> Result<Database> {
    Database::new(config.db_config()).await.with_context(|| {
        format!(
            "Failed to open database at {}",
            config.database.path.display()
        )
    })
}

/// Prints a value as pretty JSON on stdout.
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
