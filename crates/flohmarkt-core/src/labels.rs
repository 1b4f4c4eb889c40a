//! # Label Sheet Packing
//!
//! Sellers order price labels per denomination; labels are printed on
//! sheets with six slots each. This module decides which denomination goes
//! into which slot. Drawing the sheets is left to the caller.
//!
//! ## Packing Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Label Packing                                    │
//! │                                                                         │
//! │  LabelRequest { seller 4001, 0,50 € ×3, 1,00 € ×5, blank ×4 }           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  requested = 12, leftover = 12 mod 6 = 0 → no blank trimming            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Visit ladder ascending, blank last, fill 6 slots per sheet:           │
//! │                                                                         │
//! │  Sheet 1: [0,50][0,50][0,50][1,00][1,00][1,00]                          │
//! │  Sheet 2: [1,00][1,00][blank][blank][blank][blank]                      │
//! │                                                                         │
//! │  Fewer labels than slots → trailing slots stay Empty                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Blank Trimming
//! `leftover = requested mod 6` blank labels are dropped when the seller
//! ordered at least that many blanks, so the last sheet is not padded with
//! blank filler. If there are fewer blanks, nothing is trimmed and the
//! remainder of the last sheet stays empty. Priced labels are never added
//! or removed.
//!
//! The sheet count is taken after trimming.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::article_code::ArticleCode;
use crate::error::{CoreError, CoreResult};
use crate::types::{Denomination, SellerId};

// =============================================================================
// Constants
// =============================================================================

/// Slots on one printed sheet.
pub const SHEET_CAPACITY: usize = 6;

/// Printable price points in cents, ascending.
pub const DENOMINATION_LADDER: [u16; 45] = [
    50, 100, 150, 200, 250, 300, 350, 400, 450, 500, 550, 600, 650, 700, 750, 800, 850, 900, 950,
    1000, 1050, 1100, 1150, 1200, 1250, 1300, 1350, 1400, 1450, 1500, 1600, 1700, 1800, 1900, 2000,
    2100, 2200, 2300, 2400, 2500, 2600, 2700, 2800, 2900, 3000,
];

/// Value the order form uses for blank labels (no printed price).
pub const BLANK_SENTINEL: u32 = 11111;

// =============================================================================
// Label Value
// =============================================================================

/// What a seller can order: a label for one ladder price, or a blank label.
///
/// The derived ordering is the visiting order of the packer: priced labels
/// ascending by price, blank labels last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LabelValue {
    Priced(Denomination),
    Blank,
}

impl LabelValue {
    /// Maps an order-form value to a label value.
    ///
    /// ## Errors
    /// `NotOnLadder` for any price that is not printable.
    pub fn from_cents(cents: u32) -> CoreResult<Self> {
        if cents == BLANK_SENTINEL {
            return Ok(LabelValue::Blank);
        }
        if !DENOMINATION_LADDER.iter().any(|&c| c as u32 == cents) {
            return Err(CoreError::NotOnLadder { cents });
        }
        Ok(LabelValue::Priced(Denomination::new(cents)?))
    }

    /// All 46 orderable values in visiting order.
    pub fn ladder() -> impl Iterator<Item = LabelValue> {
        DENOMINATION_LADDER
            .iter()
            .filter_map(|&cents| Denomination::new(cents as u32).ok())
            .map(LabelValue::Priced)
            .chain(std::iter::once(LabelValue::Blank))
    }

    /// The order-form value of this label.
    pub fn form_cents(&self) -> u32 {
        match self {
            LabelValue::Priced(price) => price.cents() as u32,
            LabelValue::Blank => BLANK_SENTINEL,
        }
    }
}

impl From<LabelValue> for Slot {
    fn from(value: LabelValue) -> Self {
        match value {
            LabelValue::Priced(price) => Slot::Priced(price),
            LabelValue::Blank => Slot::Blank,
        }
    }
}

// =============================================================================
// Sheet
// =============================================================================

/// One slot on a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    /// A label with a printed price and barcode.
    Priced(Denomination),
    /// A blank label ordered by the seller; price is written by hand.
    Blank,
    /// Nothing was ordered for this slot.
    Empty,
}

impl Slot {
    /// True for slots that carry a label (priced or blank).
    #[inline]
    pub fn is_filled(&self) -> bool {
        !matches!(self, Slot::Empty)
    }
}

/// A printed page of six label slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Sheet {
    pub slots: [Slot; SHEET_CAPACITY],
}

impl Sheet {
    fn empty() -> Self {
        Sheet {
            slots: [Slot::Empty; SHEET_CAPACITY],
        }
    }

    /// Number of slots that carry a label.
    pub fn filled(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_filled()).count()
    }
}

// =============================================================================
// Label Request
// =============================================================================

/// A seller's label order: how many labels of each value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRequest {
    seller_id: SellerId,
    counts: BTreeMap<LabelValue, u32>,
}

impl LabelRequest {
    /// Creates an empty order for one seller.
    pub fn new(seller_id: SellerId) -> Self {
        LabelRequest {
            seller_id,
            counts: BTreeMap::new(),
        }
    }

    /// Builder-style [`LabelRequest::set`].
    pub fn with(mut self, value: LabelValue, count: u32) -> Self {
        self.set(value, count);
        self
    }

    /// Sets the count for one value. A count of zero removes the value.
    pub fn set(&mut self, value: LabelValue, count: u32) -> &mut Self {
        if count == 0 {
            self.counts.remove(&value);
        } else {
            self.counts.insert(value, count);
        }
        self
    }

    /// Builds an order from the order form: one count per ladder value in
    /// [`LabelValue::ladder`] order, the blank count last.
    ///
    /// ## Errors
    /// `OutOfRange` unless exactly 46 counts are given.
    pub fn from_form_counts(seller_id: SellerId, counts: &[u32]) -> CoreResult<Self> {
        let expected = DENOMINATION_LADDER.len() + 1;
        if counts.len() != expected {
            return Err(crate::error::ValidationError::OutOfRange {
                field: "label counts".to_string(),
                min: expected as i64,
                max: expected as i64,
            }
            .into());
        }

        let mut request = LabelRequest::new(seller_id);
        for (value, &count) in LabelValue::ladder().zip(counts) {
            request.set(value, count);
        }
        Ok(request)
    }

    /// The seller the labels are printed for.
    pub fn seller_id(&self) -> SellerId {
        self.seller_id
    }

    /// Ordered count for one value.
    pub fn count(&self, value: LabelValue) -> u32 {
        self.counts.get(&value).copied().unwrap_or(0)
    }

    /// Total number of labels ordered.
    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }
}

// =============================================================================
// Label Plan
// =============================================================================

/// The result of packing: sheets ready to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LabelPlan {
    pub seller_id: SellerId,
    /// Labels ordered, before blank trimming.
    pub requested_labels: u32,
    /// `requested_labels mod 6`.
    pub leftover_slots: u32,
    /// Blank labels dropped by trimming (0 or `leftover_slots`).
    pub blanks_trimmed: u32,
    pub sheets: Vec<Sheet>,
}

/// A slot with its position, for renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedSlot {
    pub sheet: usize,
    pub position: usize,
    pub slot: Slot,
    /// Code to print as barcode; only priced labels have one.
    pub code: Option<ArticleCode>,
}

impl LabelPlan {
    /// Number of sheets to print.
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Number of labels (priced or blank) that will be printed.
    pub fn printed_labels(&self) -> usize {
        self.sheets.iter().map(Sheet::filled).sum()
    }

    /// Every slot in print order with its article code.
    pub fn placed_slots(&self) -> impl Iterator<Item = PlacedSlot> + '_ {
        let seller_id = self.seller_id;
        self.sheets.iter().enumerate().flat_map(move |(sheet, page)| {
            page.slots
                .iter()
                .enumerate()
                .map(move |(position, &slot)| PlacedSlot {
                    sheet,
                    position,
                    slot,
                    code: match slot {
                        Slot::Priced(price) => Some(ArticleCode::encode(seller_id, price)),
                        Slot::Blank | Slot::Empty => None,
                    },
                })
        })
    }
}

// =============================================================================
// Packer
// =============================================================================

/// Packs an order into sheets.
///
/// The number of sheets is fixed by the order before blanks are trimmed:
/// `ceil(requested / 6)`. Slots freed by trimming stay empty.
///
/// Deterministic: identical requests always produce identical plans.
///
/// ## Example
/// ```rust
/// use flohmarkt_core::labels::{pack, LabelRequest, LabelValue, Slot};
/// use flohmarkt_core::types::{Denomination, SellerId};
///
/// let fifty = LabelValue::Priced(Denomination::new(50).unwrap());
/// let request = LabelRequest::new(SellerId::new(4001).unwrap()).with(fifty, 13);
///
/// let plan = pack(&request);
/// assert_eq!(plan.sheet_count(), 3);
/// assert_eq!(plan.sheets[2].filled(), 1);
/// assert_eq!(plan.sheets[2].slots[1], Slot::Empty);
/// ```
pub fn pack(request: &LabelRequest) -> LabelPlan {
    let requested_labels = request.total();
    let leftover_slots = requested_labels % SHEET_CAPACITY as u32;
    let sheet_count = (requested_labels as usize).div_ceil(SHEET_CAPACITY);

    let mut counts = request.counts.clone();
    let mut blanks_trimmed = 0;
    if let Some(blanks) = counts.get_mut(&LabelValue::Blank) {
        if *blanks >= leftover_slots {
            *blanks -= leftover_slots;
            blanks_trimmed = leftover_slots;
        }
    }

    let mut sheets = Vec::with_capacity(sheet_count);
    let mut current = Sheet::empty();
    let mut used = 0;

    for (&value, &count) in &counts {
        let slot = Slot::from(value);
        let mut pending = count as usize;

        while pending > 0 {
            let take = pending.min(SHEET_CAPACITY - used);
            current.slots[used..used + take].fill(slot);
            used += take;
            pending -= take;

            if used == SHEET_CAPACITY {
                sheets.push(std::mem::replace(&mut current, Sheet::empty()));
                used = 0;
            }
        }
    }

    if used > 0 {
        sheets.push(current);
    }

    // Trimmed blanks free slots but never pages
    sheets.resize(sheet_count, Sheet::empty());

    LabelPlan {
        seller_id: request.seller_id,
        requested_labels,
        leftover_slots,
        blanks_trimmed,
        sheets,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
