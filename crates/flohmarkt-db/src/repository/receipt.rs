//! # Receipt Repository
//!
//! Database operations for receipts ("Bons") and their sold items.
//!
//! ## Receipt Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Receipt Lifecycle                                 │
//! │                                                                         │
//! │  1. OPEN                                                                │
//! │     └── current_open(market) → Receipt { number: n, status: Open }      │
//! │                                                                         │
//! │  2. SCAN                                                                │
//! │     └── append_item(receipt, code)                                      │
//! │         ├── code must decode              (InvalidCode)                 │
//! │         ├── seller must be active         (UnknownSeller)               │
//! │         └── receipt must still be open    (ReceiptFinalized)            │
//! │                                                                         │
//! │  3. FINALIZE (one transaction)                                          │
//! │     ├── reject empty receipt              (EmptyReceipt)                │
//! │     ├── status = finalized, total stored, timestamp                     │
//! │     └── open receipt n + 1                                              │
//! │                                                                         │
//! │  4. ARCHIVE                                                             │
//! │     └── list / look up finalized receipts; items are frozen             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A partial unique index guarantees at most one open receipt per market,
//! and every state change is a conditional `UPDATE ... WHERE status = 'open'`,
//! so two tills racing on the same receipt finalize it at most once.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::market::market_exists;
use crate::repository::seller::find_seller;
use flohmarkt_core::{
    ArticleCode, CoreError, MarketId, Money, Receipt, ReceiptStatus, SellerId, SoldItem,
};

// =============================================================================
// Rows
// =============================================================================

#[derive(sqlx::FromRow)]
struct ReceiptRow {
    id: String,
    market_id: i64,
    number: i64,
    status: ReceiptStatus,
    total_cents: i64,
    created_at: DateTime<Utc>,
    finalized_at: Option<DateTime<Utc>>,
}

impl ReceiptRow {
    fn into_receipt(self, items: Vec<SoldItem>) -> Receipt {
        Receipt {
            id: self.id,
            market_id: MarketId(self.market_id),
            number: self.number,
            status: self.status,
            items,
            total: Money::from_cents(self.total_cents),
            created_at: self.created_at,
            finalized_at: self.finalized_at,
        }
    }

    fn ensure_open(&self) -> DbResult<()> {
        if self.status == ReceiptStatus::Finalized {
            return Err(CoreError::ReceiptFinalized {
                number: self.number,
            }
            .into());
        }
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct SoldItemRow {
    id: String,
    receipt_id: String,
    code: i64,
    added_at: DateTime<Utc>,
}

impl TryFrom<SoldItemRow> for SoldItem {
    type Error = DbError;

    fn try_from(row: SoldItemRow) -> Result<Self, Self::Error> {
        let code = u64::try_from(row.code).map_err(|e| DbError::corrupt("code", e))?;
        Ok(SoldItem {
            id: row.id,
            code: ArticleCode::from_raw(code),
            added_at: row.added_at,
        })
    }
}

/// A finalized receipt together with the receipt opened after it.
#[derive(Debug, Clone)]
pub struct Finalized {
    pub receipt: Receipt,
    pub next: Receipt,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for receipt database operations.
#[derive(Debug, Clone)]
pub struct ReceiptRepository {
    pool: SqlitePool,
}

impl ReceiptRepository {
    /// Creates a new ReceiptRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReceiptRepository { pool }
    }

    /// The open receipt of a market, created with the next number if the
    /// market has none.
    pub async fn current_open(&self, market_id: MarketId) -> DbResult<Receipt> {
        let mut tx = self.pool.begin().await?;

        if !market_exists(&mut *tx, market_id).await? {
            return Err(DbError::not_found("Market", market_id));
        }

        let id = match fetch_open_id(&mut *tx, market_id).await? {
            Some(id) => id,
            None => open_next(&mut *tx, market_id).await?,
        };

        let receipt = load_receipt(&mut *tx, &id)
            .await?
            .ok_or_else(|| DbError::not_found("Receipt", &id))?;
        tx.commit().await?;

        Ok(receipt)
    }

    /// Gets a receipt with its items.
    pub async fn get(&self, id: &str) -> DbResult<Option<Receipt>> {
        let mut conn = self.pool.acquire().await?;
        load_receipt(&mut *conn, id).await
    }

    /// Gets a receipt by its number within a market.
    pub async fn get_by_number(&self, market_id: MarketId, number: i64) -> DbResult<Option<Receipt>> {
        let mut conn = self.pool.acquire().await?;

        let id: Option<String> =
            sqlx::query_scalar("SELECT id FROM receipts WHERE market_id = ?1 AND number = ?2")
                .bind(market_id.0)
                .bind(number)
                .fetch_optional(&mut *conn)
                .await?;

        match id {
            Some(id) => load_receipt(&mut *conn, &id).await,
            None => Ok(None),
        }
    }

    /// Adds a scanned code to an open receipt.
    ///
    /// ## Errors
    /// - `Domain(InvalidCode)` if the code does not decode
    /// - `Domain(UnknownSeller)` if the seller is missing or inactive
    /// - `Domain(ReceiptFinalized)` if the receipt is closed
    /// - `NotFound` if the receipt does not exist
    pub async fn append_item(&self, receipt_id: &str, code: ArticleCode) -> DbResult<SoldItem> {
        let (seller_id, price) = code.decode()?;

        let mut tx = self.pool.begin().await?;

        let receipt = fetch_receipt_row(&mut *tx, receipt_id)
            .await?
            .ok_or_else(|| DbError::not_found("Receipt", receipt_id))?;
        receipt.ensure_open()?;
        ensure_active_seller(&mut *tx, seller_id).await?;

        let position: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(position), 0) + 1 FROM sold_items WHERE receipt_id = ?1",
        )
        .bind(receipt_id)
        .fetch_one(&mut *tx)
        .await?;

        let item = SoldItem {
            id: Uuid::new_v4().to_string(),
            code,
            added_at: Utc::now(),
        };

        debug!(receipt = receipt.number, %code, %seller_id, %price, "Adding sold item");

        sqlx::query(
            r#"
            INSERT INTO sold_items (id, receipt_id, position, code, added_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&item.id)
        .bind(receipt_id)
        .bind(position)
        .bind(code.value() as i64)
        .bind(item.added_at)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query(
            "UPDATE receipts SET total_cents = total_cents + ?2 WHERE id = ?1 AND status = 'open'",
        )
        .bind(receipt_id)
        .bind(price.to_money().cents())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ReceiptFinalized {
                number: receipt.number,
            }
            .into());
        }

        tx.commit().await?;
        Ok(item)
    }

    /// Finalizes an open receipt and opens the next one, atomically.
    ///
    /// ## What This Does
    /// 1. Rejects finalized or empty receipts
    /// 2. Stores the total computed from the codes
    /// 3. Stamps `finalized_at`
    /// 4. Opens receipt `number + 1` of the same market
    pub async fn finalize(&self, receipt_id: &str) -> DbResult<Finalized> {
        let mut tx = self.pool.begin().await?;

        let row = fetch_receipt_row(&mut *tx, receipt_id)
            .await?
            .ok_or_else(|| DbError::not_found("Receipt", receipt_id))?;
        row.ensure_open()?;

        let number = row.number;
        let market_id = MarketId(row.market_id);
        let items = fetch_items(&mut *tx, receipt_id).await?;
        if items.is_empty() {
            return Err(CoreError::EmptyReceipt { number }.into());
        }
        let total = row.into_receipt(items).computed_total();

        let result = sqlx::query(
            r#"
            UPDATE receipts SET
                status = 'finalized',
                total_cents = ?2,
                finalized_at = ?3
            WHERE id = ?1 AND status = 'open'
            "#,
        )
        .bind(receipt_id)
        .bind(total.cents())
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ReceiptFinalized { number }.into());
        }

        let next_id = open_next(&mut *tx, market_id).await?;

        let receipt = load_receipt(&mut *tx, receipt_id)
            .await?
            .ok_or_else(|| DbError::not_found("Receipt", receipt_id))?;
        let next = load_receipt(&mut *tx, &next_id)
            .await?
            .ok_or_else(|| DbError::not_found("Receipt", &next_id))?;

        tx.commit().await?;

        info!(%market_id, number, %total, next = next.number, "Receipt finalized");
        Ok(Finalized { receipt, next })
    }

    /// All finalized receipts of a market, ordered by number.
    pub async fn list_finalized(&self, market_id: MarketId) -> DbResult<Vec<Receipt>> {
        let mut conn = self.pool.acquire().await?;
        fetch_finalized(&mut *conn, market_id).await
    }

    /// The receipt archive: finalized receipts with a non-zero total,
    /// optionally only those containing one exact code.
    pub async fn archive(
        &self,
        market_id: MarketId,
        code: Option<ArticleCode>,
    ) -> DbResult<Vec<Receipt>> {
        let mut conn = self.pool.acquire().await?;

        let rows: Vec<ReceiptRow> = sqlx::query_as(
            r#"
            SELECT id, market_id, number, status, total_cents, created_at, finalized_at
            FROM receipts r
            WHERE r.market_id = ?1
              AND r.status = 'finalized'
              AND r.total_cents != 0
              AND (?2 IS NULL OR EXISTS (
                    SELECT 1 FROM sold_items si
                    WHERE si.receipt_id = r.id AND si.code = ?2))
            ORDER BY r.number
            "#,
        )
        .bind(market_id.0)
        .bind(code.map(|c| c.value() as i64))
        .fetch_all(&mut *conn)
        .await?;

        attach_items(&mut *conn, market_id, rows).await
    }

    /// Removes one item from an open receipt and updates its total.
    pub async fn remove_item(&self, receipt_id: &str, item_id: &str) -> DbResult<Receipt> {
        let mut tx = self.pool.begin().await?;

        let row = fetch_receipt_row(&mut *tx, receipt_id)
            .await?
            .ok_or_else(|| DbError::not_found("Receipt", receipt_id))?;
        row.ensure_open()?;

        let result = sqlx::query("DELETE FROM sold_items WHERE id = ?1 AND receipt_id = ?2")
            .bind(item_id)
            .bind(receipt_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sold item", item_id));
        }

        let items = fetch_items(&mut *tx, receipt_id).await?;
        let mut receipt = row.into_receipt(items);
        receipt.total = receipt.computed_total();

        sqlx::query("UPDATE receipts SET total_cents = ?2 WHERE id = ?1")
            .bind(receipt_id)
            .bind(receipt.total.cents())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(receipt = receipt.number, item_id, total = %receipt.total, "Sold item removed");
        Ok(receipt)
    }

    /// Recomputes the stored total of every receipt of a market from its
    /// codes. Returns how many totals changed.
    pub async fn recompute_totals(&self, market_id: MarketId) -> DbResult<usize> {
        let mut tx = self.pool.begin().await?;

        let rows: Vec<ReceiptRow> = sqlx::query_as(
            r#"
            SELECT id, market_id, number, status, total_cents, created_at, finalized_at
            FROM receipts
            WHERE market_id = ?1
            ORDER BY number
            "#,
        )
        .bind(market_id.0)
        .fetch_all(&mut *tx)
        .await?;

        let receipts = attach_items(&mut *tx, market_id, rows).await?;
        let mut changed = 0;

        for receipt in &receipts {
            let total = receipt.computed_total();
            if total == receipt.total {
                continue;
            }

            debug!(number = receipt.number, old = %receipt.total, new = %total, "Correcting receipt total");
            sqlx::query("UPDATE receipts SET total_cents = ?2 WHERE id = ?1")
                .bind(&receipt.id)
                .bind(total.cents())
                .execute(&mut *tx)
                .await?;
            changed += 1;
        }

        tx.commit().await?;

        info!(%market_id, receipts = receipts.len(), changed, "Receipt totals recomputed");
        Ok(changed)
    }
}

// =============================================================================
// Connection-level helpers
// =============================================================================

async fn ensure_active_seller(conn: &mut SqliteConnection, seller_id: SellerId) -> DbResult<()> {
    match find_seller(conn, seller_id).await? {
        Some(seller) if seller.active => Ok(()),
        _ => Err(CoreError::UnknownSeller { seller_id }.into()),
    }
}

async fn fetch_receipt_row(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<ReceiptRow>> {
    let row = sqlx::query_as(
        r#"
        SELECT id, market_id, number, status, total_cents, created_at, finalized_at
        FROM receipts
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(row)
}

async fn fetch_open_id(conn: &mut SqliteConnection, market_id: MarketId) -> DbResult<Option<String>> {
    let id = sqlx::query_scalar("SELECT id FROM receipts WHERE market_id = ?1 AND status = 'open'")
        .bind(market_id.0)
        .fetch_optional(conn)
        .await?;

    Ok(id)
}

/// Inserts an open receipt with the next number of the market.
async fn open_next(conn: &mut SqliteConnection, market_id: MarketId) -> DbResult<String> {
    let id = Uuid::new_v4().to_string();

    let number: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO receipts (id, market_id, number, status, total_cents, created_at)
        SELECT ?1, ?2, COALESCE(MAX(number), 0) + 1, 'open', 0, ?3
        FROM receipts
        WHERE market_id = ?2
        RETURNING number
        "#,
    )
    .bind(&id)
    .bind(market_id.0)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;

    debug!(%market_id, number, "Opened receipt");
    Ok(id)
}

async fn fetch_items(conn: &mut SqliteConnection, receipt_id: &str) -> DbResult<Vec<SoldItem>> {
    let rows: Vec<SoldItemRow> = sqlx::query_as(
        r#"
        SELECT id, receipt_id, code, added_at
        FROM sold_items
        WHERE receipt_id = ?1
        ORDER BY position
        "#,
    )
    .bind(receipt_id)
    .fetch_all(conn)
    .await?;

    rows.into_iter().map(SoldItem::try_from).collect()
}

async fn load_receipt(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Receipt>> {
    let Some(row) = fetch_receipt_row(&mut *conn, id).await? else {
        return Ok(None);
    };
    let items = fetch_items(conn, id).await?;
    Ok(Some(row.into_receipt(items)))
}

/// Loads the items of all receipts of a market in one query and attaches
/// them to `rows`, keeping the row order.
async fn attach_items(
    conn: &mut SqliteConnection,
    market_id: MarketId,
    rows: Vec<ReceiptRow>,
) -> DbResult<Vec<Receipt>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let item_rows: Vec<SoldItemRow> = sqlx::query_as(
        r#"
        SELECT si.id, si.receipt_id, si.code, si.added_at
        FROM sold_items si
        JOIN receipts r ON r.id = si.receipt_id
        WHERE r.market_id = ?1
        ORDER BY si.receipt_id, si.position
        "#,
    )
    .bind(market_id.0)
    .fetch_all(conn)
    .await?;

    let mut by_receipt: HashMap<String, Vec<SoldItem>> = HashMap::new();
    for row in item_rows {
        let receipt_id = row.receipt_id.clone();
        by_receipt
            .entry(receipt_id)
            .or_default()
            .push(SoldItem::try_from(row)?);
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let items = by_receipt.remove(&row.id).unwrap_or_default();
            row.into_receipt(items)
        })
        .collect())
}

/// Finalized receipts of a market with their items, ordered by number.
pub(crate) async fn fetch_finalized(
    conn: &mut SqliteConnection,
    market_id: MarketId,
) -> DbResult<Vec<Receipt>> {
    let rows: Vec<ReceiptRow> = sqlx::query_as(
        r#"
        SELECT id, market_id, number, status, total_cents, created_at, finalized_at
        FROM receipts
        WHERE market_id = ?1 AND status = 'finalized'
        ORDER BY number
        "#,
    )
    .bind(market_id.0)
    .fetch_all(&mut *conn)
    .await?;

    attach_items(conn, market_id, rows).await
}

// =============================================================================
// Unit Tests
// =============================================================================
