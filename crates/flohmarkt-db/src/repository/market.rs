//! # Market Repository
//!
//! Database operations for markets (flea-market events).
//!
//! Market ids are handed out sequentially: the n-th market gets id n.

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use flohmarkt_core::validation::validate_name;
use flohmarkt_core::{Market, MarketId};

#[derive(sqlx::FromRow)]
struct MarketRow {
    id: i64,
    name: String,
    market_date: NaiveDate,
}

impl From<MarketRow> for Market {
    fn from(row: MarketRow) -> Self {
        Market {
            id: MarketId(row.id),
            name: row.name,
            date: row.market_date,
        }
    }
}

/// Repository for market database operations.
#[derive(Debug, Clone)]
pub struct MarketRepository {
    pool: SqlitePool,
}

impl MarketRepository {
    /// Creates a new MarketRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MarketRepository { pool }
    }

    /// Creates a market and assigns the next id.
    pub async fn create(&self, name: &str, date: NaiveDate) -> DbResult<Market> {
        let name = validate_name("market name", name)?;
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar("SELECT COUNT(*) + 1 FROM markets")
            .fetch_one(&mut *tx)
            .await?;

        debug!(id, name = %name, %date, "Creating market");

        sqlx::query(
            r#"
            INSERT INTO markets (id, name, market_date, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(id)
        .bind(&name)
        .bind(date)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Market {
            id: MarketId(id),
            name,
            date,
        })
    }

    /// Gets a market by id.
    pub async fn get(&self, id: MarketId) -> DbResult<Option<Market>> {
        let row: Option<MarketRow> = sqlx::query_as(
            "SELECT id, name, market_date FROM markets WHERE id = ?1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Market::from))
    }

    /// Lists all markets, earliest first.
    pub async fn list(&self) -> DbResult<Vec<Market>> {
        let rows: Vec<MarketRow> = sqlx::query_as(
            "SELECT id, name, market_date FROM markets ORDER BY market_date, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Market::from).collect())
    }
}

/// True if the market exists. Usable inside a transaction.
pub(crate) async fn market_exists(conn: &mut SqliteConnection, id: MarketId) -> DbResult<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM markets WHERE id = ?1")
        .bind(id.0)
        .fetch_optional(conn)
        .await?;
    Ok(found.is_some())
}
