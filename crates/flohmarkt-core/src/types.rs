//! # Domain Types
//!
//! Core domain types used throughout Flohmarkt POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │     Market      │   │     Seller      │   │    Receipt      │        │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │        │
//! │  │  id (seq)       │   │  seller_id      │   │  id (UUID)      │        │
//! │  │  name           │   │  name, email    │   │  number (seq)   │        │
//! │  │  date           │   │  active         │   │  status, total  │        │
//! │  └─────────────────┘   └─────────────────┘   └────────┬────────┘        │
//! │                                                       │ 1..n            │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌────────▼────────┐        │
//! │  │    SellerId     │   │  Denomination   │   │    SoldItem     │        │
//! │  │  0..=9999       │   │  1..=9999 cents │   │  ArticleCode    │        │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Receipts and sold items carry a UUID `id` for relations plus a business
//! key (receipt number per market). Sellers are keyed by their seller number
//! alone because that number is printed on every tag.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::article_code::ArticleCode;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;

// =============================================================================
// Seller Id
// =============================================================================

/// The four-digit seller number printed on every label.
///
/// Valid range is 1..=9999. Seller 0 would leave the seller block empty, and
/// its codes could not be told apart from a bare price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SellerId(u16);

impl SellerId {
    /// Largest seller number that fits the four-digit seller block.
    pub const MAX: u16 = 9999;

    /// Smallest seller number.
    pub const MIN: u16 = 1;

    /// Creates a seller id, rejecting 0 and numbers wider than four digits.
    pub fn new(value: u16) -> Result<Self, ValidationError> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(ValidationError::OutOfRange {
                field: "seller_id".to_string(),
                min: Self::MIN as i64,
                max: Self::MAX as i64,
            });
        }
        Ok(SellerId(value))
    }

    /// Returns the raw seller number.
    #[inline]
    pub const fn value(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for SellerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for SellerId {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        let narrowed = u16::try_from(value).map_err(|_| ValidationError::OutOfRange {
            field: "seller_id".to_string(),
            min: Self::MIN as i64,
            max: Self::MAX as i64,
        })?;
        SellerId::new(narrowed)
    }
}

// =============================================================================
// Denomination
// =============================================================================

/// A price point in euro cents, as carried in the low block of an article code.
///
/// Valid range is 1..=9999 cents: the price block of an article code is
/// exactly four digits wide and a tag without a price cannot be sold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Denomination(u16);

impl Denomination {
    /// Largest price that fits the four-digit price block.
    pub const MAX_CENTS: u16 = 9999;

    /// Creates a denomination from cents.
    pub fn new(cents: u32) -> Result<Self, ValidationError> {
        if cents == 0 {
            return Err(ValidationError::MustBePositive {
                field: "price".to_string(),
            });
        }
        if cents > Self::MAX_CENTS as u32 {
            return Err(ValidationError::OutOfRange {
                field: "price".to_string(),
                min: 1,
                max: Self::MAX_CENTS as i64,
            });
        }
        Ok(Denomination(cents as u16))
    }

    /// Returns the price in cents.
    #[inline]
    pub const fn cents(&self) -> u16 {
        self.0
    }

    /// Returns the price as Money.
    #[inline]
    pub fn to_money(&self) -> Money {
        Money::from_cents(self.0 as i64)
    }
}

impl fmt::Display for Denomination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_money())
    }
}

// =============================================================================
// Market
// =============================================================================

/// Identifier of one flea-market event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MarketId(pub i64);

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A flea-market event. Receipts and settlements belong to exactly one market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Market {
    pub id: MarketId,
    pub name: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
}

// =============================================================================
// Seller
// =============================================================================

/// A registered seller. The registry is shared by all markets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Seller {
    pub seller_id: SellerId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    /// Only active sellers may sell items and receive a settlement.
    pub active: bool,
}

impl Seller {
    /// "First Last", as printed on the settlement sheet and the name list.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// =============================================================================
// Receipt Status
// =============================================================================

/// The status of a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    /// The cashier is still scanning items.
    #[default]
    Open,
    /// The customer has paid; items are frozen.
    Finalized,
}

// =============================================================================
// Sold Item
// =============================================================================

/// One scanned tag on a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SoldItem {
    pub id: String,
    pub code: ArticleCode,
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

// =============================================================================
// Receipt
// =============================================================================

/// A customer receipt ("Bon") with the tags scanned at the till.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Receipt {
    pub id: String,
    pub market_id: MarketId,
    /// Sequential receipt number within the market, starting at 1.
    pub number: i64,
    pub status: ReceiptStatus,
    /// Items in scan order.
    pub items: Vec<SoldItem>,
    /// Stored total. Set when the receipt is finalized.
    pub total: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub finalized_at: Option<DateTime<Utc>>,
}

impl Receipt {
    /// Checks if the receipt has been finalized.
    #[inline]
    pub fn is_finalized(&self) -> bool {
        self.status == ReceiptStatus::Finalized
    }

    /// Fails with `ReceiptFinalized` unless the receipt is still open.
    pub fn ensure_open(&self) -> CoreResult<()> {
        if self.is_finalized() {
            return Err(CoreError::ReceiptFinalized {
                number: self.number,
            });
        }
        Ok(())
    }

    /// Sum of the decoded prices of all items.
    ///
    /// Codes that do not decode contribute nothing; they cannot be added
    /// through the till in the first place.
    pub fn computed_total(&self) -> Money {
        self.items
            .iter()
            .filter_map(|item| item.code.decode().ok())
            .map(|(_, price)| price.to_money())
            .sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(code: u64) -> SoldItem {
        SoldItem {
            id: format!("item-{code}"),
            code: ArticleCode::from_raw(code),
            added_at: Utc::now(),
        }
    }

    #[test]
    fn test_seller_id_range() {
        assert!(SellerId::new(1).is_ok());
        assert!(SellerId::new(9999).is_ok());
        assert_eq!(
            SellerId::new(0),
            Err(ValidationError::OutOfRange {
                field: "seller_id".to_string(),
                min: 1,
                max: 9999,
            })
        );
        assert!(SellerId::try_from(0i64).is_err());
        assert!(SellerId::new(10000).is_err());
        assert!(SellerId::try_from(-1i64).is_err());
        assert_eq!(SellerId::try_from(4001i64).unwrap().value(), 4001);
    }

    #[test]
    fn test_denomination_range() {
        assert!(Denomination::new(0).is_err());
        assert!(Denomination::new(1).is_ok());
        assert!(Denomination::new(9999).is_ok());
        assert!(Denomination::new(10000).is_err());
        assert_eq!(Denomination::new(250).unwrap().to_string(), "2,50 €");
    }

    #[test]
    fn test_receipt_status_default() {
        assert_eq!(ReceiptStatus::default(), ReceiptStatus::Open);
    }

    #[test]
    fn test_receipt_computed_total_skips_undecodable_codes() {
        let receipt = Receipt {
            id: "r1".to_string(),
            market_id: MarketId(1),
            number: 1,
            status: ReceiptStatus::Open,
            items: vec![item(40010500), item(40021500), item(123)],
            total: Money::zero(),
            created_at: Utc::now(),
            finalized_at: None,
        };

        assert_eq!(receipt.computed_total().cents(), 2000);
        assert!(receipt.ensure_open().is_ok());
    }

    #[test]
    fn test_finalized_receipt_rejects_changes() {
        let receipt = Receipt {
            id: "r7".to_string(),
            market_id: MarketId(1),
            number: 7,
            status: ReceiptStatus::Finalized,
            items: Vec::new(),
            total: Money::zero(),
            created_at: Utc::now(),
            finalized_at: Some(Utc::now()),
        };

        assert!(matches!(
            receipt.ensure_open(),
            Err(CoreError::ReceiptFinalized { number: 7 })
        ));
    }

    #[test]
    fn test_seller_full_name() {
        let seller = Seller {
            seller_id: SellerId::new(4001).unwrap(),
            first_name: "Anna".to_string(),
            last_name: "Berger".to_string(),
            email: None,
            active: true,
        };
        assert_eq!(seller.full_name(), "Anna Berger");
    }
}
