//! # Error Types
//!
//! Domain-specific error types for flohmarkt-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  flohmarkt-core errors (this file)                                      │
//! │  ├── InvalidCodeError - A scanned/typed code does not decode            │
//! │  ├── CoreError        - General domain errors                           │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  flohmarkt-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                     │
//! │                                                                         │
//! │  Flow: InvalidCodeError → CoreError → DbError → anyhow (CLI)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An empty label request is not an error: packing it yields zero sheets.

use thiserror::Error;

use crate::types::SellerId;

// =============================================================================
// Invalid Code
// =============================================================================

/// An article code that does not split into a seller and a price.
///
/// ## When This Occurs
/// ```text
/// Cashier scans/types: 4001
///      │
///      ▼
/// decode() → fewer than 5 digits, no price block
///      │
///      ▼
/// InvalidCodeError::TooShort { code: 4001 }
///      │
///      ▼
/// Item is not added / skipped in settlement
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidCodeError {
    /// The code has no room for both a seller block and a price block.
    #[error("Article code {code} is too short: expected at least 5 digits")]
    TooShort { code: u64 },

    /// The seller block would exceed four digits.
    #[error("Article code {code} is too long: expected at most 8 digits")]
    TooLong { code: u64 },

    /// The price block is zero.
    #[error("Article code {code} carries no price")]
    ZeroPrice { code: u64 },

    /// The input is not a decimal number.
    #[error("Article code '{input}' is not numeric")]
    NotNumeric { input: String },
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The article code could not be decoded.
    #[error(transparent)]
    InvalidCode(#[from] InvalidCodeError),

    /// The decoded seller is not registered or not active.
    ///
    /// ## When This Occurs
    /// - A tag from a seller who was deactivated after printing
    /// - A typo in a hand-typed code
    #[error("Seller {seller_id} is not registered or not active")]
    UnknownSeller { seller_id: SellerId },

    /// The receipt was already finalized and cannot change.
    #[error("Receipt {number} is already finalized")]
    ReceiptFinalized { number: i64 },

    /// The receipt has no items and cannot be finalized.
    #[error("Receipt {number} has no items")]
    EmptyReceipt { number: i64 },

    /// A label value that is not on the denomination ladder.
    #[error("{cents} cents is not a printable label denomination")]
    NotOnLadder { cents: u32 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used at the boundary before business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// The value is well-formed but cannot be used here.
    #[error("{field} is not allowed: {reason}")]
    NotAllowed { field: String, reason: String },

    /// Duplicate value (e.g., seller number already taken).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::UnknownSeller {
            seller_id: SellerId::new(4711).unwrap(),
        };
        assert_eq!(err.to_string(), "Seller 4711 is not registered or not active");

        let err = InvalidCodeError::TooShort { code: 4001 };
        assert_eq!(
            err.to_string(),
            "Article code 4001 is too short: expected at least 5 digits"
        );
    }

    #[test]
    fn test_invalid_code_converts_to_core_error() {
        let core_err: CoreError = InvalidCodeError::ZeroPrice { code: 40010000 }.into();
        assert!(matches!(core_err, CoreError::InvalidCode(_)));
        assert_eq!(core_err.to_string(), "Article code 40010000 carries no price");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "last_name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
