//! # Settlement
//!
//! Turns the scanned codes of a market into one payout record per seller.
//!
//! ## Settlement Run
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Settlement Run                                   │
//! │                                                                         │
//! │  Active sellers ──► one empty SettlementRecord each                     │
//! │                                                                         │
//! │  Finalized receipts                                                     │
//! │       │                                                                 │
//! │       ▼  for every sold item                                            │
//! │  decode(code) ──Err──► SettlementAnomaly::InvalidCode   (item dropped)  │
//! │       │                                                                 │
//! │       ▼ Ok((seller, price))                                             │
//! │  record for seller? ──no──► SettlementAnomaly::UnknownSeller (dropped)  │
//! │       │                                                                 │
//! │       ▼ yes                                                             │
//! │  record.denominations.push(price)                                       │
//! │                                                                         │
//! │  total = Σ denominations                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`aggregate`] is a pure function of its inputs. Deleting the previous
//! records and storing the new ones in one transaction is the job of the
//! database layer. Anomalies are returned, not logged.
//!
//! ## Report
//! ```text
//! VN: 4001, Anna Berger
//!   Price     Count   Subtotal
//!   5,00 €    x2      10,00 €
//!   15,00 €   x1      15,00 €
//!             3       25,00 €
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use ts_rs::TS;

use crate::article_code::ArticleCode;
use crate::error::InvalidCodeError;
use crate::money::Money;
use crate::types::{Denomination, MarketId, Receipt, Seller, SellerId};

// =============================================================================
// Settlement Record
// =============================================================================

/// What one seller sold at one market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SettlementRecord {
    pub market_id: MarketId,
    pub seller_id: SellerId,
    pub first_name: String,
    pub last_name: String,
    /// Prices of the sold items, in receipt and scan order.
    pub denominations: Vec<Denomination>,
    pub total: Money,
}

impl SettlementRecord {
    /// Empty record for a seller.
    pub fn empty(market_id: MarketId, seller: &Seller) -> Self {
        SettlementRecord {
            market_id,
            seller_id: seller.seller_id,
            first_name: seller.first_name.clone(),
            last_name: seller.last_name.clone(),
            denominations: Vec::new(),
            total: Money::zero(),
        }
    }

    /// Number of items sold.
    pub fn item_count(&self) -> usize {
        self.denominations.len()
    }

    fn recompute_total(&mut self) {
        self.total = self.denominations.iter().map(Denomination::to_money).sum();
    }
}

// =============================================================================
// Anomalies
// =============================================================================

/// A sold item that could not be attributed to any seller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementAnomaly {
    /// The stored code does not decode.
    InvalidCode {
        receipt_number: i64,
        code: ArticleCode,
        error: InvalidCodeError,
    },
    /// The code decodes to a seller that is not active.
    UnknownSeller {
        receipt_number: i64,
        code: ArticleCode,
        seller_id: SellerId,
    },
}

impl fmt::Display for SettlementAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettlementAnomaly::InvalidCode {
                receipt_number,
                error,
                ..
            } => write!(f, "receipt {receipt_number}: {error}"),
            SettlementAnomaly::UnknownSeller {
                receipt_number,
                code,
                seller_id,
            } => write!(
                f,
                "receipt {receipt_number}: code {code} belongs to seller {seller_id}, who is not active"
            ),
        }
    }
}

// =============================================================================
// Aggregation
// =============================================================================

/// Result of one settlement run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementRun {
    pub market_id: MarketId,
    /// One record per active seller, ordered by seller id.
    pub records: Vec<SettlementRecord>,
    pub anomalies: Vec<SettlementAnomaly>,
}

impl SettlementRun {
    /// Items attributed to a seller.
    pub fn item_count(&self) -> usize {
        self.records.iter().map(SettlementRecord::item_count).sum()
    }

    /// Sum of all record totals.
    pub fn revenue(&self) -> Money {
        self.records.iter().map(|r| r.total).sum()
    }
}

/// Builds the settlement records of a market.
///
/// Every active seller gets a record, even without sales. Inactive sellers
/// in `sellers` are ignored. Only finalized receipts of `market_id` count.
/// Items that do not decode, or decode to a seller without a record, are
/// reported as anomalies and never attributed to anyone.
///
/// ## Example
/// ```rust
/// use flohmarkt_core::settlement::aggregate;
/// use flohmarkt_core::types::MarketId;
///
/// let run = aggregate(MarketId(1), &[], &[]);
/// assert!(run.records.is_empty());
/// ```
pub fn aggregate(market_id: MarketId, sellers: &[Seller], receipts: &[Receipt]) -> SettlementRun {
    let mut records: BTreeMap<SellerId, SettlementRecord> = sellers
        .iter()
        .filter(|seller| seller.active)
        .map(|seller| (seller.seller_id, SettlementRecord::empty(market_id, seller)))
        .collect();
    let mut anomalies = Vec::new();

    let finalized = receipts
        .iter()
        .filter(|receipt| receipt.market_id == market_id && receipt.is_finalized());

    for receipt in finalized {
        for item in &receipt.items {
            match item.code.decode() {
                Err(error) => anomalies.push(SettlementAnomaly::InvalidCode {
                    receipt_number: receipt.number,
                    code: item.code,
                    error,
                }),
                Ok((seller_id, price)) => match records.get_mut(&seller_id) {
                    Some(record) => record.denominations.push(price),
                    None => anomalies.push(SettlementAnomaly::UnknownSeller {
                        receipt_number: receipt.number,
                        code: item.code,
                        seller_id,
                    }),
                },
            }
        }
    }

    let mut records: Vec<SettlementRecord> = records.into_values().collect();
    for record in &mut records {
        record.recompute_total();
    }

    SettlementRun {
        market_id,
        records,
        anomalies,
    }
}

// =============================================================================
// Per-Seller Report
// =============================================================================

/// All sold items of one seller at one price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceBucket {
    pub price: Denomination,
    pub count: u32,
    pub subtotal: Money,
}

/// One page of the settlement report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SellerReport {
    pub seller_id: SellerId,
    pub first_name: String,
    pub last_name: String,
    /// Ascending by price.
    pub buckets: Vec<PriceBucket>,
    pub item_count: u32,
    pub revenue: Money,
}

impl SellerReport {
    /// Groups a record's prices into buckets.
    pub fn from_record(record: &SettlementRecord) -> Self {
        let mut histogram: BTreeMap<Denomination, u32> = BTreeMap::new();
        for &price in &record.denominations {
            *histogram.entry(price).or_insert(0) += 1;
        }

        let buckets: Vec<PriceBucket> = histogram
            .into_iter()
            .map(|(price, count)| PriceBucket {
                price,
                count,
                subtotal: price.to_money() * count as i64,
            })
            .collect();

        SellerReport {
            seller_id: record.seller_id,
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            item_count: buckets.iter().map(|b| b.count).sum(),
            revenue: buckets.iter().map(|b| b.subtotal).sum(),
            buckets,
        }
    }

    /// Page heading: `VN: 4001, Anna Berger`.
    pub fn heading(&self) -> String {
        format!("VN: {}, {} {}", self.seller_id, self.first_name, self.last_name)
    }
}

/// One report page per record, ordered by seller id.
pub fn per_seller_report(records: &[SettlementRecord]) -> Vec<SellerReport> {
    let mut reports: Vec<SellerReport> = records.iter().map(SellerReport::from_record).collect();
    reports.sort_by_key(|r| r.seller_id);
    reports
}

// =============================================================================
// Market Summary
// =============================================================================

/// Totals over all settlement records of a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MarketSummary {
    /// Sellers with a record.
    pub seller_count: u32,
    /// Sellers with at least one sold item.
    pub selling_sellers: u32,
    pub item_count: u32,
    pub revenue: Money,
}

/// Summarizes the records of one market.
pub fn market_summary(records: &[SettlementRecord]) -> MarketSummary {
    records.iter().fold(MarketSummary::default(), |mut summary, record| {
        summary.seller_count += 1;
        if record.item_count() > 0 {
            summary.selling_sellers += 1;
        }
        summary.item_count += record.item_count() as u32;
        summary.revenue += record.total;
        summary
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ReceiptStatus, SoldItem};
    use chrono::Utc;

    const MARKET: MarketId = MarketId(1);

    fn seller(id: u16, first: &str, active: bool) -> Seller {
        Seller {
            seller_id: SellerId::new(id).unwrap(),
            first_name: first.to_string(),
            last_name: "Muster".to_string(),
            email: None,
            active,
        }
    }

    fn receipt(number: i64, status: ReceiptStatus, codes: &[u64]) -> Receipt {
        Receipt {
            id: format!("r{number}"),
            market_id: MARKET,
            number,
            status,
            items: codes
                .iter()
                .enumerate()
                .map(|(i, &code)| SoldItem {
                    id: format!("r{number}-{i}"),
                    code: ArticleCode::from_raw(code),
                    added_at: Utc::now(),
                })
                .collect(),
            total: Money::zero(),
            created_at: Utc::now(),
            finalized_at: None,
        }
    }

    fn cents(record: &SettlementRecord) -> Vec<u16> {
        record.denominations.iter().map(|d| d.cents()).collect()
    }

    #[test]
    fn test_every_active_seller_gets_a_record() {
        let sellers = [
            seller(4002, "Bea", true),
            seller(4001, "Anna", true),
            seller(4003, "Carl", false),
        ];
        let run = aggregate(MARKET, &sellers, &[]);

        let ids: Vec<u16> = run.records.iter().map(|r| r.seller_id.value()).collect();
        assert_eq!(ids, vec![4001, 4002]);
        assert!(run.records.iter().all(|r| r.total.is_zero()));
        assert!(run.anomalies.is_empty());
    }

    #[test]
    fn test_items_are_attributed_to_their_seller() {
        let sellers = [seller(4001, "Anna", true), seller(4002, "Bea", true)];
        let receipts = [
            receipt(1, ReceiptStatus::Finalized, &[40010500, 40021500]),
            receipt(2, ReceiptStatus::Finalized, &[40010500, 40011500]),
        ];
        let run = aggregate(MARKET, &sellers, &receipts);

        assert_eq!(cents(&run.records[0]), vec![500, 500, 1500]);
        assert_eq!(run.records[0].total.cents(), 2500);
        assert_eq!(cents(&run.records[1]), vec![1500]);
        assert_eq!(run.revenue().cents(), 4000);
    }

    #[test]
    fn test_open_receipts_and_other_markets_are_ignored() {
        let sellers = [seller(4001, "Anna", true)];
        let mut foreign = receipt(3, ReceiptStatus::Finalized, &[40010500]);
        foreign.market_id = MarketId(2);
        let receipts = [
            receipt(1, ReceiptStatus::Open, &[40010500]),
            receipt(2, ReceiptStatus::Finalized, &[40010100]),
            foreign,
        ];
        let run = aggregate(MARKET, &sellers, &receipts);

        assert_eq!(cents(&run.records[0]), vec![100]);
    }

    #[test]
    fn test_unknown_and_invalid_codes_are_reported_not_attributed() {
        let sellers = [seller(4001, "Anna", true), seller(4003, "Carl", false)];
        let receipts = [receipt(
            5,
            ReceiptStatus::Finalized,
            &[40010500, 47110500, 40030200, 4001],
        )];
        let run = aggregate(MARKET, &sellers, &receipts);

        assert_eq!(run.records.len(), 1);
        assert_eq!(cents(&run.records[0]), vec![500]);
        assert_eq!(run.anomalies.len(), 3);
        assert!(matches!(
            run.anomalies[0],
            SettlementAnomaly::UnknownSeller { receipt_number: 5, .. }
        ));
        assert!(matches!(
            &run.anomalies[2],
            SettlementAnomaly::InvalidCode {
                error: InvalidCodeError::TooShort { code: 4001 },
                ..
            }
        ));
        assert_eq!(
            run.anomalies[1].to_string(),
            "receipt 5: code 40030200 belongs to seller 4003, who is not active"
        );
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let sellers = [seller(4001, "Anna", true), seller(4002, "Bea", true)];
        let receipts = [
            receipt(1, ReceiptStatus::Finalized, &[40010500, 40021500, 40010050]),
            receipt(2, ReceiptStatus::Finalized, &[40022000]),
        ];

        assert_eq!(
            aggregate(MARKET, &sellers, &receipts),
            aggregate(MARKET, &sellers, &receipts)
        );
    }

    #[test]
    fn test_item_count_matches_attributable_items() {
        let sellers = [seller(4001, "Anna", true), seller(4002, "Bea", false)];
        let receipts = [
            receipt(1, ReceiptStatus::Finalized, &[40010500, 40020500, 40011000]),
            receipt(2, ReceiptStatus::Finalized, &[40010100]),
            receipt(3, ReceiptStatus::Open, &[40010100]),
        ];
        let run = aggregate(MARKET, &sellers, &receipts);

        assert_eq!(run.item_count(), 3);
        assert_eq!(run.item_count() + run.anomalies.len(), 4);
    }

    #[test]
    fn test_report_histogram() {
        let sellers = [seller(4001, "Anna", true)];
        let receipts = [receipt(
            1,
            ReceiptStatus::Finalized,
            &[40011500, 40010500, 40010500],
        )];
        let run = aggregate(MARKET, &sellers, &receipts);
        let report = SellerReport::from_record(&run.records[0]);

        let rows: Vec<(u16, u32, i64)> = report
            .buckets
            .iter()
            .map(|b| (b.price.cents(), b.count, b.subtotal.cents()))
            .collect();
        assert_eq!(rows, vec![(500, 2, 1000), (1500, 1, 1500)]);
        assert_eq!(report.item_count, 3);
        assert_eq!(report.revenue.cents(), 2500);
        assert_eq!(report.heading(), "VN: 4001, Anna Muster");
    }

    #[test]
    fn test_report_for_seller_without_sales() {
        let run = aggregate(MARKET, &[seller(4001, "Anna", true)], &[]);
        let reports = per_seller_report(&run.records);

        assert_eq!(reports.len(), 1);
        assert!(reports[0].buckets.is_empty());
        assert_eq!(reports[0].item_count, 0);
        assert!(reports[0].revenue.is_zero());
    }

    #[test]
    fn test_market_summary() {
        let sellers = [
            seller(4001, "Anna", true),
            seller(4002, "Bea", true),
            seller(4003, "Carl", true),
        ];
        let receipts = [receipt(
            1,
            ReceiptStatus::Finalized,
            &[40010500, 40010500, 40021000],
        )];
        let run = aggregate(MARKET, &sellers, &receipts);
        let summary = market_summary(&run.records);

        assert_eq!(summary.seller_count, 3);
        assert_eq!(summary.selling_sellers, 2);
        assert_eq!(summary.item_count, 3);
        assert_eq!(summary.revenue.cents(), 2000);
    }
}
