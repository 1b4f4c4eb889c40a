//! # Article Codes
//!
//! Every price tag carries one number that identifies both the seller and
//! the price. The till only ever sees this number.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Article Code 40011250                             │
//! │                                                                         │
//! │        ┌──────────────┬──────────────┐                                  │
//! │        │  4 0 0 1     │  1 2 5 0     │                                  │
//! │        │  seller id   │  price block │                                  │
//! │        │  (4 digits)  │  (4 digits)  │                                  │
//! │        └──────────────┴──────────────┘                                  │
//! │                                                                         │
//! │  code   = seller × 10⁴ + price                                          │
//! │  seller = code ÷ 10⁴      (4001)                                        │
//! │  price  = code mod 10⁴    (1250 cents = 12,50 €)                        │
//! │                                                                         │
//! │  The price block is ALWAYS four digits. 40010050 is seller 4001 at     │
//! │  0,50 €, never seller 4001 at 50 with a shifted boundary.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Splitting is done arithmetically on the fixed price width. Slicing the
//! decimal string at a fixed offset would misread codes of sellers below
//! 1000, whose decimal form is shorter than eight digits.
//!
//! ## Example
//! ```rust
//! use flohmarkt_core::article_code::{decode, encode};
//! use flohmarkt_core::types::{Denomination, SellerId};
//!
//! let seller = SellerId::new(4001).unwrap();
//! let price = Denomination::new(50).unwrap();
//!
//! let code = encode(seller, price);
//! assert_eq!(code.value(), 40010050);
//! assert_eq!(decode(code).unwrap(), (seller, price));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::InvalidCodeError;
use crate::types::{Denomination, SellerId};

/// Number of decimal digits reserved for the price.
pub const PRICE_DIGITS: u32 = 4;

/// Number of decimal digits reserved for the seller.
pub const SELLER_DIGITS: u32 = 4;

const PRICE_BLOCK: u64 = 10u64.pow(PRICE_DIGITS);
const MAX_CODE: u64 = 10u64.pow(PRICE_DIGITS + SELLER_DIGITS) - 1;

/// A combined seller + price number as printed on a tag and scanned at the till.
///
/// An `ArticleCode` may hold any number the cashier entered; whether it is
/// meaningful is decided by [`ArticleCode::decode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ArticleCode(u64);

impl ArticleCode {
    /// Wraps a raw number without validating it.
    #[inline]
    pub const fn from_raw(value: u64) -> Self {
        ArticleCode(value)
    }

    /// Returns the raw number.
    #[inline]
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Packs a seller and a price into one code.
    pub fn encode(seller_id: SellerId, price: Denomination) -> Self {
        ArticleCode(seller_id.value() as u64 * PRICE_BLOCK + price.cents() as u64)
    }

    /// Splits the code into seller and price.
    ///
    /// ## Errors
    /// - `TooShort` if the code has fewer than 5 digits
    /// - `TooLong` if the seller block is wider than 4 digits
    /// - `ZeroPrice` if the price block is `0000`
    pub fn decode(&self) -> Result<(SellerId, Denomination), InvalidCodeError> {
        let code = self.0;
        if code < PRICE_BLOCK {
            return Err(InvalidCodeError::TooShort { code });
        }
        if code > MAX_CODE {
            return Err(InvalidCodeError::TooLong { code });
        }

        let price_cents = (code % PRICE_BLOCK) as u32;
        let price = Denomination::new(price_cents).map_err(|_| InvalidCodeError::ZeroPrice { code })?;
        let seller_id =
            SellerId::new((code / PRICE_BLOCK) as u16).map_err(|_| InvalidCodeError::TooLong { code })?;

        Ok((seller_id, price))
    }

    /// Text for a Code 39 barcode font: start/stop `*` around the eight
    /// zero-padded digits.
    ///
    /// ```rust
    /// use flohmarkt_core::article_code::ArticleCode;
    ///
    /// assert_eq!(ArticleCode::from_raw(40010050).barcode_text(), "*40010050*");
    /// assert_eq!(ArticleCode::from_raw(1230050).barcode_text(), "*01230050*");
    /// ```
    pub fn barcode_text(&self) -> String {
        format!("*{:0width$}*", self.0, width = (SELLER_DIGITS + PRICE_DIGITS) as usize)
    }
}

impl fmt::Display for ArticleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parses what the scanner or the cashier typed.
///
/// Surrounding whitespace and barcode start/stop characters are tolerated;
/// anything else that is not a decimal digit is rejected.
impl FromStr for ArticleCode {
    type Err = InvalidCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_matches('*');
        let not_numeric = || InvalidCodeError::NotNumeric {
            input: s.to_string(),
        };

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(not_numeric());
        }

        let significant = digits.trim_start_matches('0');
        if significant.len() > (SELLER_DIGITS + PRICE_DIGITS) as usize {
            // Too wide for u64 arithmetic to matter; report the leading digits.
            let code = significant[..(SELLER_DIGITS + PRICE_DIGITS + 1) as usize]
                .parse()
                .map_err(|_| not_numeric())?;
            return Err(InvalidCodeError::TooLong { code });
        }

        let value = if significant.is_empty() {
            0
        } else {
            significant.parse().map_err(|_| not_numeric())?
        };
        Ok(ArticleCode(value))
    }
}

/// Packs a seller and a price into one code.
pub fn encode(seller_id: SellerId, price: Denomination) -> ArticleCode {
    ArticleCode::encode(seller_id, price)
}

/// Splits a code into seller and price. See [`ArticleCode::decode`].
pub fn decode(code: ArticleCode) -> Result<(SellerId, Denomination), InvalidCodeError> {
    code.decode()
}

// =============================================================================
// Unit Tests
// =============================================================================
