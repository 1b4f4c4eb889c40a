//! # Validation Module
//!
//! Boundary checks for everything a cashier or organizer types in.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: CLI arguments (clap)                                          │
//! │  └── Types and required flags                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  ├── Names, e-mail, market date                                         │
//! │  ├── Seller numbers, label counts                                       │
//! │  └── Negative or oversized numbers never reach the core                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                             │
//! │  ├── UNIQUE seller number                                               │
//! │  └── Foreign keys receipts → markets                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use flohmarkt_core::validation::{parse_market_date, validate_label_count};
//!
//! let date = parse_market_date("14.09.2024").unwrap();
//! assert_eq!(date.to_string(), "2024-09-14");
//!
//! assert!(validate_label_count(-3).is_err());
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::types::SellerId;
use crate::{FIRST_SELLER_ID, MAX_LABELS_PER_VALUE};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Input format of market dates.
pub const MARKET_DATE_FORMAT: &str = "%d.%m.%Y";

const MAX_NAME_LEN: usize = 100;
const MAX_EMAIL_LEN: usize = 254;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a person or market name and returns it trimmed.
///
/// ## Example
/// ```rust
/// use flohmarkt_core::validation::validate_name;
///
/// assert_eq!(validate_name("first_name", "  Anna ").unwrap(), "Anna");
/// assert!(validate_name("first_name", "   ").is_err());
/// ```
pub fn validate_name(field: &str, value: &str) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(value.to_string())
}

/// Validates an optional e-mail address.
///
/// Empty input means "no address". Anything else needs one `@` with text on
/// both sides.
pub fn validate_email(value: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    if value.len() > MAX_EMAIL_LEN {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: MAX_EMAIL_LEN,
        });
    }

    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(Some(value.to_string()))
        }
        _ => Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "expected name@domain".to_string(),
        }),
    }
}

/// Parses a market date entered as `dd.mm.yyyy`.
pub fn parse_market_date(value: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), MARKET_DATE_FORMAT).map_err(|e| {
        ValidationError::InvalidFormat {
            field: "date".to_string(),
            reason: format!("expected dd.mm.yyyy ({e})"),
        }
    })
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a seller number for registration.
///
/// ## Rules
/// - 1..=9999 (the seller block of an article code)
/// - 0 is rejected: its codes would be indistinguishable from bare prices
pub fn validate_seller_id(value: i64) -> ValidationResult<SellerId> {
    if value == 0 {
        return Err(ValidationError::NotAllowed {
            field: "seller_id".to_string(),
            reason: "0 cannot be printed on labels".to_string(),
        });
    }
    if !(1..=SellerId::MAX as i64).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field: "seller_id".to_string(),
            min: 1,
            max: SellerId::MAX as i64,
        });
    }
    SellerId::try_from(value)
}

/// Validates the number of labels ordered for one value.
///
/// ## Rules
/// - Zero is allowed (nothing ordered)
/// - Negative counts are rejected
/// - At most MAX_LABELS_PER_VALUE
pub fn validate_label_count(value: i64) -> ValidationResult<u32> {
    if !(0..=MAX_LABELS_PER_VALUE as i64).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field: "label count".to_string(),
            min: 0,
            max: MAX_LABELS_PER_VALUE as i64,
        });
    }
    Ok(value as u32)
}

// =============================================================================
// Seller Numbers
// =============================================================================

/// The next seller number to hand out.
///
/// Numbers start at 4001. The first gap in the registered numbers is reused;
/// without a gap it is one past the highest. Numbers below 4001 are ignored.
/// Returns `None` once 9999 is taken and no gap is left.
///
/// ## Example
/// ```rust
/// use flohmarkt_core::types::SellerId;
/// use flohmarkt_core::validation::next_free_seller_id;
///
/// let taken: Vec<SellerId> = [4001, 4002, 4004]
///     .into_iter()
///     .map(|n| SellerId::new(n).unwrap())
///     .collect();
/// assert_eq!(next_free_seller_id(&taken).unwrap().value(), 4003);
/// ```
pub fn next_free_seller_id(taken: &[SellerId]) -> Option<SellerId> {
    let mut sorted: Vec<u16> = taken
        .iter()
        .map(SellerId::value)
        .filter(|&id| id >= FIRST_SELLER_ID)
        .collect();
    sorted.sort_unstable();
    sorted.dedup();

    let mut candidate = FIRST_SELLER_ID;
    for id in sorted {
        if id != candidate {
            break;
        }
        candidate += 1;
    }

    SellerId::new(candidate).ok()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[u16]) -> Vec<SellerId> {
        values.iter().map(|&v| SellerId::new(v).unwrap()).collect()
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("last_name", "Berger").unwrap(), "Berger");
        assert!(matches!(
            validate_name("last_name", ""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_name("last_name", &"x".repeat(101)),
            Err(ValidationError::TooLong { max: 100, .. })
        ));
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email(None).unwrap(), None);
        assert_eq!(validate_email(Some("  ")).unwrap(), None);
        assert_eq!(
            validate_email(Some("anna@example.org")).unwrap().as_deref(),
            Some("anna@example.org")
        );
        assert!(validate_email(Some("anna")).is_err());
        assert!(validate_email(Some("@example.org")).is_err());
        assert!(validate_email(Some("a@b@c")).is_err());
    }

    #[test]
    fn test_parse_market_date() {
        let date = parse_market_date("01.05.2025").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 5, 1).unwrap());
        assert!(parse_market_date("2025-05-01").is_err());
        assert!(parse_market_date("31.02.2025").is_err());
    }

    #[test]
    fn test_validate_seller_id() {
        assert_eq!(validate_seller_id(4001).unwrap().value(), 4001);
        assert!(matches!(
            validate_seller_id(0),
            Err(ValidationError::NotAllowed { .. })
        ));
        assert!(validate_seller_id(-1).is_err());
        assert!(validate_seller_id(10000).is_err());
    }

    #[test]
    fn test_validate_label_count() {
        assert_eq!(validate_label_count(0).unwrap(), 0);
        assert_eq!(validate_label_count(12).unwrap(), 12);
        assert!(validate_label_count(-1).is_err());
        assert!(validate_label_count(MAX_LABELS_PER_VALUE as i64 + 1).is_err());
    }

    #[test]
    fn test_next_free_seller_id() {
        assert_eq!(next_free_seller_id(&[]).unwrap().value(), 4001);
        assert_eq!(next_free_seller_id(&ids(&[4001, 4002])).unwrap().value(), 4003);
        assert_eq!(next_free_seller_id(&ids(&[4002, 4003])).unwrap().value(), 4001);
        assert_eq!(next_free_seller_id(&ids(&[4003, 4001, 4002, 4005])).unwrap().value(), 4004);
        assert_eq!(next_free_seller_id(&ids(&[12, 4001])).unwrap().value(), 4002);
    }

    #[test]
    fn test_next_free_seller_id_exhausted() {
        let all: Vec<u16> = (4001..=9999).collect();
        assert_eq!(next_free_seller_id(&ids(&all)), None);
    }
}
