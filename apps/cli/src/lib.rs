//! # flohmarkt-cli
//!
//! Command-line front end for the Flohmarkt POS.
//!
//! ## Commands
//!
//! - `flohmarkt market` - Create and list market events
//! - `flohmarkt seller` - Seller registry (register, toggle, export)
//! - `flohmarkt receipt` - Cashier flow (scan, finalize, archive)
//! - `flohmarkt settle` - Run the settlement of a market
//! - `flohmarkt report` - Print settlement pages per seller
//! - `flohmarkt labels` - Pack a label order into printable sheets
//!
//! ## Configuration
//!
//! Flags win over environment variables, which win over the config file:
//!
//! - `FLOHMARKT_DB` - SQLite file (default: `./flohmarkt.db`)
//! - `FLOHMARKT_MARKET` - Market the cashier and settlement commands act on
//! - `FLOHMARKT_LOG` - Log filter (default: `info,flohmarkt=debug,sqlx=warn`)
//!
//! See [`config`] for the `flohmarkt.toml` format.

#![forbid(unsafe_code)]
#![allow(clippy::print_stdout)]

pub mod commands;
pub mod config;
pub mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{AppConfig, ConfigError};

/// Flohmarkt POS - cashier, settlement and label printing.
#[derive(Debug, Parser)]
#[command(name = "flohmarkt")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// SQLite database file.
    #[arg(long, global = true, env = "FLOHMARKT_DB")]
    pub db: Option<PathBuf>,

    /// Market id to act on.
    #[arg(long, global = true, env = "FLOHMARKT_MARKET")]
    pub market: Option<i64>,

    /// Config file (default: ./flohmarkt.toml if present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `info,sqlx=warn`.
    #[arg(long, global = true, env = "FLOHMARKT_LOG")]
    pub log: Option<String>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Loads the config file and applies flags and environment on top.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed, or if
    /// the merged values are invalid.
    pub fn config(&self) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::load(self.config.as_deref())?;
        self.apply_to(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Overrides file values with whatever was given on the command line or
    /// in the environment.
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(db) = &self.db {
            config.database.path = db.clone();
        }
        if let Some(market) = self.market {
            config.market.current = Some(market);
        }
        if let Some(log) = &self.log {
            config.logging.filter = log.clone();
        }
        config.format = self.format;
    }
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create and list market events.
    Market(commands::market::MarketArgs),
    /// Manage the seller registry.
    Seller(commands::seller::SellerArgs),
    /// Ring up items on the current receipt.
    Receipt(commands::receipt::ReceiptArgs),
    /// Rebuild the settlement records of a market.
    Settle(commands::settle::SettleArgs),
    /// Print settlement pages.
    Report(commands::report::ReportArgs),
    /// Pack a label order into sheets.
    Labels(commands::labels::LabelsArgs),
}

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags_override_file_values() {
        let cli = Cli::parse_from([
            "flohmarkt",
            "--db",
            "/tmp/herbst.db",
            "--market",
            "3",
            "--log",
            "debug",
            "--format",
            "json",
            "settle",
        ]);

        let mut config = AppConfig::default();
        cli.apply_to(&mut config);

        assert_eq!(config.database.path, PathBuf::from("/tmp/herbst.db"));
        assert_eq!(config.market.current, Some(3));
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.format, OutputFormat::Json);
        assert!(matches!(cli.command, Commands::Settle(_)));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["flohmarkt", "report", "--market", "2", "--seller", "4001"]);

        assert_eq!(cli.market, Some(2));
        match cli.command {
            Commands::Report(args) => assert_eq!(args.seller, Some(4001)),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_missing_flags_keep_file_values() {
        let cli = Cli::parse_from(["flohmarkt", "market", "list"]);

        let mut config = AppConfig::from_toml_str(
            r#"
            [market]
            current = 7
            "#,
        )
        .unwrap();
        let before = config.database.path.clone();
        cli.apply_to(&mut config);

        assert_eq!(config.market.current, Some(7));
        assert_eq!(config.database.path, before);
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
