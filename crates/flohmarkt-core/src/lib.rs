//! # flohmarkt-core: Pure Business Logic for Flohmarkt POS
//!
//! Everything a flea market needs to know about codes, prices and payouts,
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Flohmarkt POS Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    flohmarkt CLI (apps/cli)                     │   │
//! │  │    market ──► seller ──► receipt ──► settle ──► report/labels   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ flohmarkt-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │  ┌────────────┐ ┌────────────┐ ┌────────────┐ ┌────────────┐   │   │
//! │  │  │article_code│ │ settlement │ │   labels   │ │ validation │   │   │
//! │  │  │ encode     │ │ aggregate  │ │ pack       │ │ names      │   │   │
//! │  │  │ decode     │ │ report     │ │ ladder     │ │ numbers    │   │   │
//! │  │  └────────────┘ └────────────┘ └────────────┘ └────────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO LOGGING • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 flohmarkt-db (Database Layer)                   │   │
//! │  │          SQLite stores, migrations, settlement transaction      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`article_code`] - Seller + price packed into one scannable number
//! - [`settlement`] - Per-seller aggregation, price buckets, market summary
//! - [`labels`] - Packing ordered labels onto six-slot sheets
//! - [`types`] - Domain types (Seller, Receipt, Market, ...)
//! - [`money`] - Integer euro cents
//! - [`error`] - Domain error types
//! - [`validation`] - Boundary checks
//!
//! ## Example Usage
//!
//! ```rust
//! use flohmarkt_core::article_code::ArticleCode;
//!
//! let code: ArticleCode = "*40011250*".parse().unwrap();
//! let (seller, price) = code.decode().unwrap();
//!
//! assert_eq!(seller.value(), 4001);
//! assert_eq!(price.to_string(), "12,50 €");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod article_code;
pub mod error;
pub mod labels;
pub mod money;
pub mod settlement;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use article_code::ArticleCode;
pub use error::{CoreError, CoreResult, InvalidCodeError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// First seller number handed out to a new seller.
pub const FIRST_SELLER_ID: u16 = 4001;

/// Upper bound for labels ordered of a single value.
///
/// Stops a typo (1000 instead of 10) from printing a stack of sheets.
pub const MAX_LABELS_PER_VALUE: u32 = 500;
