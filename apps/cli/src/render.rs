//! # Plain-Text Rendering
//!
//! Turns label plans, settlement reports and receipts into text for the
//! terminal or a printer. Layout only; every number shown here was computed
//! in flohmarkt-core.

use flohmarkt_core::labels::{LabelPlan, PlacedSlot, Slot, SHEET_CAPACITY};
use flohmarkt_core::settlement::{MarketSummary, SellerReport};
use flohmarkt_core::validation::MARKET_DATE_FORMAT;
use flohmarkt_core::{Market, Receipt, ReceiptStatus, SellerId};

const RULE_WIDTH: usize = 34;

// =============================================================================
// Label Sheets
// =============================================================================

/// Columns of the printed grid; two rows make one sheet.
const GRID_COLUMNS: usize = 3;
const CELL_WIDTH: usize = 12;

/// Renders every sheet of a plan as a 3 x 2 grid of labels.
///
/// ```text
/// Seller 4001 - labels: 13, sheets: 3
/// -- Sheet 1 of 3 --
/// +--------------+--------------+--------------+
/// | VN 4001      | VN 4001      | VN 4001      |
/// | 0,50 €       | 0,50 €       | 0,50 €       |
/// | *40010050*   | *40010050*   | *40010050*   |
/// +--------------+--------------+--------------+
/// ...
/// ```
///
/// Blank labels get a line to write the price on; empty slots stay empty.
pub fn label_sheets(plan: &LabelPlan) -> String {
    let mut lines = vec![format!(
        "Seller {} - labels: {}, sheets: {}",
        plan.seller_id,
        plan.printed_labels(),
        plan.sheet_count()
    )];

    if plan.blanks_trimmed > 0 {
        lines.push(format!(
            "Blank labels dropped: {} (their slots stay empty)",
            plan.blanks_trimmed
        ));
    }

    let border = format!("+{}", format!("{}+", "-".repeat(CELL_WIDTH + 2)).repeat(GRID_COLUMNS));
    let slots: Vec<PlacedSlot> = plan.placed_slots().collect();

    for (index, sheet) in slots.chunks(SHEET_CAPACITY).enumerate() {
        lines.push(format!("-- Sheet {} of {} --", index + 1, plan.sheet_count()));
        lines.push(border.clone());

        for row in sheet.chunks(GRID_COLUMNS) {
            let cells: Vec<[String; 3]> = row
                .iter()
                .map(|placed| label_cell(plan.seller_id, placed))
                .collect();

            for part in 0..3 {
                let mut line = String::from("|");
                for cell in &cells {
                    line.push_str(&format!(" {:<width$} |", cell[part], width = CELL_WIDTH));
                }
                lines.push(line);
            }
            lines.push(border.clone());
        }
    }

    lines.join("\n")
}

/// Seller line, price line and barcode line of one label.
fn label_cell(seller_id: SellerId, placed: &PlacedSlot) -> [String; 3] {
    match (placed.slot, placed.code) {
        (Slot::Priced(price), code) => [
            format!("VN {seller_id}"),
            price.to_string(),
            code.map(|c| c.barcode_text()).unwrap_or_default(),
        ],
        (Slot::Blank, _) => [
            format!("VN {seller_id}"),
            "____ €".to_string(),
            "(blank)".to_string(),
        ],
        (Slot::Empty, _) => Default::default(),
    }
}

// =============================================================================
// Settlement
// =============================================================================

/// Renders one seller's settlement page.
pub fn seller_report(report: &SellerReport) -> String {
    let mut lines = vec![report.heading(), "-".repeat(RULE_WIDTH)];

    if report.buckets.is_empty() {
        lines.push("No items sold.".to_string());
    } else {
        lines.push(format!("{:>10}  {:>5}  {:>13}", "Price", "Count", "Subtotal"));
        for bucket in &report.buckets {
            lines.push(format!(
                "{:>10}  {:>5}  {:>13}",
                bucket.price.to_string(),
                bucket.count,
                bucket.subtotal.to_string()
            ));
        }
    }

    lines.push("-".repeat(RULE_WIDTH));
    lines.push(format!(
        "{:<10}  {:>5}  {:>13}",
        "Total",
        report.item_count,
        report.revenue.to_string()
    ));

    lines.join("\n")
}

/// Renders the totals of a settled market.
pub fn market_summary(market: &Market, summary: &MarketSummary) -> String {
    [
        format!("{} ({})", market.name, market.date.format(MARKET_DATE_FORMAT)),
        format!(
            "Sellers:  {} ({} with sales)",
            summary.seller_count, summary.selling_sellers
        ),
        format!("Items:    {}", summary.item_count),
        format!("Revenue:  {}", summary.revenue),
    ]
    .join("\n")
}

// =============================================================================
// Receipts
// =============================================================================

/// Renders a receipt with its items and total.
pub fn receipt(receipt: &Receipt) -> String {
    let status = match receipt.status {
        ReceiptStatus::Open => "open".to_string(),
        ReceiptStatus::Finalized => match receipt.finalized_at {
            Some(at) => format!("finalized {}", at.format("%d.%m.%Y %H:%M")),
            None => "finalized".to_string(),
        },
    };

    let mut lines = vec![format!("Receipt {} ({status})", receipt.number)];

    for (index, item) in receipt.items.iter().enumerate() {
        let detail = match item.code.decode() {
            Ok((seller_id, price)) => format!("VN {seller_id}  {price}"),
            Err(e) => format!("invalid ({e})"),
        };
        lines.push(format!("{:>3}  {:<8}  {detail}", index + 1, item.code.to_string()));
    }

    lines.push(format!("Total: {}", receipt.total));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use flohmarkt_core::labels::{pack, LabelRequest, LabelValue};
    use flohmarkt_core::settlement::{market_summary as summarize, SettlementRecord};
    use flohmarkt_core::{ArticleCode, Denomination, MarketId, Money, SellerId, SoldItem};

    fn price(cents: u32) -> Denomination {
        Denomination::new(cents).unwrap()
    }

    fn record(seller: u16, prices: &[u32]) -> SettlementRecord {
        let denominations: Vec<Denomination> = prices.iter().map(|&c| price(c)).collect();
        let total = denominations
            .iter()
            .fold(Money::zero(), |acc, d| acc + d.to_money());
        SettlementRecord {
            market_id: MarketId(1),
            seller_id: SellerId::new(seller).unwrap(),
            first_name: "Anna".to_string(),
            last_name: "Berger".to_string(),
            denominations,
            total,
        }
    }

    #[test]
    fn test_label_sheets_layout() {
        let request = LabelRequest::new(SellerId::new(4001).unwrap())
            .with(LabelValue::Priced(price(50)), 5)
            .with(LabelValue::Blank, 2);
        let text = label_sheets(&pack(&request));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Seller 4001 - labels: 6, sheets: 2");
        assert_eq!(lines[1], "Blank labels dropped: 1 (their slots stay empty)");
        assert_eq!(lines[2], "-- Sheet 1 of 2 --");
        assert_eq!(lines[3], "+--------------+--------------+--------------+");
        assert_eq!(lines[4], "| VN 4001      | VN 4001      | VN 4001      |");
        assert_eq!(lines[6], "| *40010050*   | *40010050*   | *40010050*   |");
        assert_eq!(lines[12], "-- Sheet 2 of 2 --");
        assert_eq!(lines.len(), 22);

        assert_eq!(text.matches("*40010050*").count(), 5);
        assert_eq!(text.matches("(blank)").count(), 1);
    }

    #[test]
    fn test_empty_order_renders_header_only() {
        let request = LabelRequest::new(SellerId::new(4001).unwrap());
        let text = label_sheets(&pack(&request));

        assert_eq!(text, "Seller 4001 - labels: 0, sheets: 0");
    }

    #[test]
    fn test_label_sheets_leave_empty_slots_blank() {
        let request =
            LabelRequest::new(SellerId::new(4002).unwrap()).with(LabelValue::Priced(price(100)), 7);
        let text = label_sheets(&pack(&request));
        let lines: Vec<&str> = text.lines().collect();

        assert!(text.contains("-- Sheet 2 of 2 --"));
        assert_eq!(text.matches("*40020100*").count(), 7);
        assert_eq!(text.matches("VN 4002").count(), 7);
        assert_eq!(*lines.last().unwrap(), "+--------------+--------------+--------------+");
        assert_eq!(lines[lines.len() - 2], format!("|{}", format!("{}|", " ".repeat(14)).repeat(3)));
    }

    #[test]
    fn test_seller_report_rows() {
        let report = SellerReport::from_record(&record(4001, &[500, 1500, 500]));
        let text = seller_report(&report);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "VN: 4001, Anna Berger");
        assert!(lines[3].contains("5,00 €") && lines[3].contains("10,00 €"));
        assert!(lines[4].contains("15,00 €"));
        assert!(lines.last().unwrap().starts_with("Total"));
        assert!(lines.last().unwrap().ends_with("25,00 €"));
    }

    #[test]
    fn test_seller_report_without_sales() {
        let report = SellerReport::from_record(&record(4003, &[]));
        let text = seller_report(&report);

        assert!(text.contains("No items sold."));
        assert!(text.ends_with("0,00 €"));
    }

    #[test]
    fn test_market_summary() {
        let market = Market {
            id: MarketId(1),
            name: "Herbst".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 9, 14).unwrap(),
        };
        let summary = summarize(&[record(4001, &[500, 300]), record(4002, &[])]);
        let text = market_summary(&market, &summary);

        assert_eq!(
            text,
            "Herbst (14.09.2024)\nSellers:  2 (1 with sales)\nItems:    2\nRevenue:  8,00 €"
        );
    }

    #[test]
    fn test_receipt_lines() {
        let receipt = Receipt {
            id: "r-1".to_string(),
            market_id: MarketId(1),
            number: 4,
            status: ReceiptStatus::Open,
            items: vec![SoldItem {
                id: "i-1".to_string(),
                code: ArticleCode::from_raw(40010500),
                added_at: Utc::now(),
            }],
            total: Money::from_cents(500),
            created_at: Utc::now(),
            finalized_at: None,
        };
        let text = super::receipt(&receipt);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Receipt 4 (open)");
        assert_eq!(lines[1], "  1  40010500  VN 4001  5,00 €");
        assert_eq!(lines[2], "Total: 5,00 €");
    }
}
