//! # flohmarkt-db: Database Layer for Flohmarkt POS
//!
//! SQLite persistence for markets, sellers, receipts and settlements, using
//! sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Flohmarkt POS Data Flow                            │
//! │                                                                         │
//! │  flohmarkt settle --market 1                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   flohmarkt-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ MarketRepo     │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ SellerRepo     │    │ 001_initial  │  │   │
//! │  │   │               │    │ ReceiptRepo    │    │   _schema    │  │   │
//! │  │   │               │    │ SettlementRepo │    │              │  │   │
//! │  │   └───────────────┘    └───────┬────────┘    └──────────────┘  │   │
//! │  │                                │ aggregate(), decode()          │   │
//! │  │                                ▼                                │   │
//! │  │                         flohmarkt-core                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (./flohmarkt.db by default)                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use flohmarkt_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./flohmarkt.db")).await?;
//!
//! let run = db.settlements().run(market_id).await?;
//! let pages = db.settlements().report(market_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::market::MarketRepository;
pub use repository::receipt::{Finalized, ReceiptRepository};
pub use repository::seller::SellerRepository;
pub use repository::settlement::SettlementRepository;
