//! # Repository Module
//!
//! Database repository implementations for Flohmarkt POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stores and Their Callers                             │
//! │                                                                         │
//! │  CLI command                                                            │
//! │       │                                                                 │
//! │       │  db.receipts().append_item(&receipt.id, code)                   │
//! │       ▼                                                                 │
//! │  ReceiptRepository                                                      │
//! │  ├── current_open / append_item / finalize                              │
//! │  ├── list_finalized / archive / get_by_number                           │
//! │  └── remove_item / recompute_totals                                     │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! │                                                                         │
//! │  Helpers that must run inside another repository's transaction take     │
//! │  `&mut SqliteConnection` and are shared between the modules.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`MarketRepository`](market::MarketRepository) - Market events
//! - [`SellerRepository`](seller::SellerRepository) - Seller registry
//! - [`ReceiptRepository`](receipt::ReceiptRepository) - Receipts and sold items
//! - [`SettlementRepository`](settlement::SettlementRepository) - Settlement runs and records

pub mod market;
pub mod receipt;
pub mod seller;
pub mod settlement;
