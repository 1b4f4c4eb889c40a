//! # Settlement Repository
//!
//! Stores settlement records and runs the settlement of a market.
//!
//! ## Settlement Run
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   SINGLE TRANSACTION PER MARKET                         │
//! │                                                                         │
//! │  1. DELETE FROM settlement_records WHERE market_id = ?                  │
//! │  2. SELECT active sellers                                               │
//! │  3. SELECT finalized receipts + sold items                              │
//! │  4. flohmarkt_core::settlement::aggregate(...)   (pure)                 │
//! │  5. INSERT one record per active seller                                 │
//! │                                                                         │
//! │  COMMIT ← either the old records or the complete new set are visible    │
//! │                                                                         │
//! │  Afterwards: warn! for every item that could not be attributed          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Runs are not incremental. Running twice without receipt changes yields
//! the same records; the last run wins.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::market::market_exists;
use crate::repository::receipt::fetch_finalized;
use crate::repository::seller::fetch_active;
use flohmarkt_core::settlement::{
    aggregate, market_summary, per_seller_report, MarketSummary, SellerReport, SettlementRecord,
    SettlementRun,
};
use flohmarkt_core::{Denomination, MarketId, Money, SellerId};

#[derive(sqlx::FromRow)]
struct SettlementRow {
    market_id: i64,
    seller_id: i64,
    first_name: String,
    last_name: String,
    denominations: String,
    total_cents: i64,
}

impl TryFrom<SettlementRow> for SettlementRecord {
    type Error = DbError;

    fn try_from(row: SettlementRow) -> Result<Self, Self::Error> {
        let cents: Vec<u32> = serde_json::from_str(&row.denominations)?;
        let denominations = cents
            .into_iter()
            .map(|c| Denomination::new(c).map_err(|e| DbError::corrupt("denominations", e)))
            .collect::<DbResult<Vec<_>>>()?;

        Ok(SettlementRecord {
            market_id: MarketId(row.market_id),
            seller_id: SellerId::try_from(row.seller_id)
                .map_err(|e| DbError::corrupt("seller_id", e))?,
            first_name: row.first_name,
            last_name: row.last_name,
            denominations,
            total: Money::from_cents(row.total_cents),
        })
    }
}

/// Repository for settlement records.
#[derive(Debug, Clone)]
pub struct SettlementRepository {
    pool: SqlitePool,
}

impl SettlementRepository {
    /// Creates a new SettlementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettlementRepository { pool }
    }

    /// Rebuilds all settlement records of a market.
    ///
    /// An unknown market yields an empty run and writes nothing.
    pub async fn run(&self, market_id: MarketId) -> DbResult<SettlementRun> {
        info!(%market_id, "Starting settlement run");
        let mut tx = self.pool.begin().await?;

        if !market_exists(&mut *tx, market_id).await? {
            warn!(%market_id, "Settlement requested for unknown market");
            return Ok(aggregate(market_id, &[], &[]));
        }

        let deleted = delete_records(&mut *tx, market_id).await?;
        let sellers = fetch_active(&mut *tx).await?;
        let receipts = fetch_finalized(&mut *tx, market_id).await?;

        let run = aggregate(market_id, &sellers, &receipts);

        for record in &run.records {
            upsert_record(&mut *tx, record).await?;
        }

        tx.commit().await?;

        for anomaly in &run.anomalies {
            warn!(%market_id, "Item not attributed: {anomaly}");
        }

        info!(
            %market_id,
            replaced = deleted,
            sellers = run.records.len(),
            receipts = receipts.len(),
            items = run.item_count(),
            unattributed = run.anomalies.len(),
            revenue = %run.revenue(),
            "Settlement run complete"
        );

        Ok(run)
    }

    /// Deletes all settlement records of a market. Returns how many.
    pub async fn delete_all(&self, market_id: MarketId) -> DbResult<u64> {
        let mut conn = self.pool.acquire().await?;
        delete_records(&mut *conn, market_id).await
    }

    /// Inserts or replaces one record.
    pub async fn upsert(&self, record: &SettlementRecord) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        upsert_record(&mut *conn, record).await
    }

    /// Records of a market ordered by seller number. Empty for unknown
    /// markets.
    pub async fn list_by_market(&self, market_id: MarketId) -> DbResult<Vec<SettlementRecord>> {
        let rows: Vec<SettlementRow> = sqlx::query_as(
            r#"
            SELECT market_id, seller_id, first_name, last_name, denominations, total_cents
            FROM settlement_records
            WHERE market_id = ?1
            ORDER BY seller_id
            "#,
        )
        .bind(market_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SettlementRecord::try_from).collect()
    }

    /// Report pages of the stored records.
    pub async fn report(&self, market_id: MarketId) -> DbResult<Vec<SellerReport>> {
        let records = self.list_by_market(market_id).await?;
        Ok(per_seller_report(&records))
    }

    /// Totals over the stored records.
    pub async fn summary(&self, market_id: MarketId) -> DbResult<MarketSummary> {
        let records = self.list_by_market(market_id).await?;
        Ok(market_summary(&records))
    }
}

async fn delete_records(conn: &mut SqliteConnection, market_id: MarketId) -> DbResult<u64> {
    let result = sqlx::query("DELETE FROM settlement_records WHERE market_id = ?1")
        .bind(market_id.0)
        .execute(conn)
        .await?;

    debug!(%market_id, deleted = result.rows_affected(), "Settlement records deleted");
    Ok(result.rows_affected())
}

async fn upsert_record(conn: &mut SqliteConnection, record: &SettlementRecord) -> DbResult<()> {
    let cents: Vec<u16> = record.denominations.iter().map(Denomination::cents).collect();
    let denominations = serde_json::to_string(&cents)?;

    debug!(seller_id = %record.seller_id, items = cents.len(), "Writing settlement record");

    sqlx::query(
        r#"
        INSERT INTO settlement_records
            (market_id, seller_id, first_name, last_name, denominations, total_cents)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT (market_id, seller_id) DO UPDATE SET
            first_name = excluded.first_name,
            last_name = excluded.last_name,
            denominations = excluded.denominations,
            total_cents = excluded.total_cents
        "#,
    )
    .bind(record.market_id.0)
    .bind(record.seller_id.value() as i64)
    .bind(&record.first_name)
    .bind(&record.last_name)
    .bind(denominations)
    .bind(record.total.cents())
    .execute(conn)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig};
    use chrono::NaiveDate;
    use flohmarkt_core::{ArticleCode, Market, MarketId, Seller, SellerId};

    async fn setup() -> (Database, Market) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let market = db
            .markets()
            .create("Herbst", NaiveDate::from_ymd_opt(2024, 9, 14).unwrap())
            .await
            .unwrap();

        for (id, first) in [(4001, "Anna"), (4002, "Bea")] {
            db.sellers()
                .insert(&Seller {
                    seller_id: SellerId::new(id).unwrap(),
                    first_name: first.to_string(),
                    last_name: "Berger".to_string(),
                    email: None,
                    active: true,
                })
                .await
                .unwrap();
        }

        (db, market)
    }

    async fn ring_up(db: &Database, market: MarketId, codes: &[u64]) {
        let receipt = db.receipts().current_open(market).await.unwrap();
        for &code in codes {
            db.receipts()
                .append_item(&receipt.id, ArticleCode::from_raw(code))
                .await
                .unwrap();
        }
        db.receipts().finalize(&receipt.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_run_stores_one_record_per_active_seller() {
        let (db, market) = setup().await;
        ring_up(&db, market.id, &[40010500, 40010500, 40011500]).await;

        let run = db.settlements().run(market.id).await.unwrap();
        assert_eq!(run.records.len(), 2);

        let stored = db.settlements().list_by_market(market.id).await.unwrap();
        assert_eq!(stored, run.records);
        assert_eq!(stored[0].total.cents(), 2500);
        assert!(stored[1].denominations.is_empty());
    }

    #[tokio::test]
    async fn test_run_is_idempotent() {
        let (db, market) = setup().await;
        ring_up(&db, market.id, &[40010500, 40020300]).await;

        let first = db.settlements().run(market.id).await.unwrap();
        let second = db.settlements().run(market.id).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(db.settlements().list_by_market(market.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_deactivated_seller_items_are_not_attributed() {
        let (db, market) = setup().await;
        ring_up(&db, market.id, &[40010500, 40020300]).await;
        db.sellers()
            .set_active(SellerId::new(4002).unwrap(), false)
            .await
            .unwrap();

        let run = db.settlements().run(market.id).await.unwrap();

        assert_eq!(run.records.len(), 1);
        assert_eq!(run.item_count(), 1);
        assert_eq!(run.anomalies.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_market_yields_empty_run() {
        let (db, _) = setup().await;
        let run = db.settlements().run(MarketId(42)).await.unwrap();

        assert!(run.records.is_empty());
        assert!(db.settlements().list_by_market(MarketId(42)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_report_and_summary() {
        let (db, market) = setup().await;
        ring_up(&db, market.id, &[40011500, 40010500]).await;
        ring_up(&db, market.id, &[40010500, 40021000]).await;
        db.settlements().run(market.id).await.unwrap();

        let report = db.settlements().report(market.id).await.unwrap();
        assert_eq!(report.len(), 2);
        let anna: Vec<(u16, u32)> = report[0]
            .buckets
            .iter()
            .map(|b| (b.price.cents(), b.count))
            .collect();
        assert_eq!(anna, vec![(500, 2), (1500, 1)]);
        assert_eq!(report[0].revenue.cents(), 2500);

        let summary = db.settlements().summary(market.id).await.unwrap();
        assert_eq!(summary.seller_count, 2);
        assert_eq!(summary.item_count, 4);
        assert_eq!(summary.revenue.cents(), 3500);
    }

    #[tokio::test]
    async fn test_delete_all_and_upsert() {
        let (db, market) = setup().await;
        let run = db.settlements().run(market.id).await.unwrap();

        assert_eq!(db.settlements().delete_all(market.id).await.unwrap(), 2);
        assert!(db.settlements().list_by_market(market.id).await.unwrap().is_empty());

        db.settlements().upsert(&run.records[0]).await.unwrap();
        db.settlements().upsert(&run.records[0]).await.unwrap();
        assert_eq!(db.settlements().list_by_market(market.id).await.unwrap().len(), 1);
    }
}
