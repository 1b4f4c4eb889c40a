//! # Seller Repository
//!
//! Database operations for the seller registry.
//!
//! ## Registry Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  • One row per seller number (1..=9999), shared by all markets          │
//! │  • Inactive sellers stay registered but cannot sell                     │
//! │  • New numbers start at 4001, gaps are reused                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use flohmarkt_core::validation::{
    next_free_seller_id, validate_email, validate_name, validate_seller_id,
};
use flohmarkt_core::{Seller, SellerId};

#[derive(sqlx::FromRow)]
struct SellerRow {
    seller_id: i64,
    first_name: String,
    last_name: String,
    email: Option<String>,
    active: bool,
}

impl TryFrom<SellerRow> for Seller {
    type Error = DbError;

    fn try_from(row: SellerRow) -> Result<Self, Self::Error> {
        let seller_id =
            SellerId::try_from(row.seller_id).map_err(|e| DbError::corrupt("seller_id", e))?;
        Ok(Seller {
            seller_id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            active: row.active,
        })
    }
}

fn into_sellers(rows: Vec<SellerRow>) -> DbResult<Vec<Seller>> {
    rows.into_iter().map(Seller::try_from).collect()
}

/// Repository for seller database operations.
#[derive(Debug, Clone)]
pub struct SellerRepository {
    pool: SqlitePool,
}

impl SellerRepository {
    /// Creates a new SellerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SellerRepository { pool }
    }

    /// Registers a seller.
    ///
    /// Names and e-mail are validated and trimmed; number 0 is refused.
    ///
    /// ## Errors
    /// `UniqueViolation` if the seller number is already registered.
    pub async fn insert(&self, seller: &Seller) -> DbResult<Seller> {
        validate_seller_id(seller.seller_id.value() as i64)?;
        let first_name = validate_name("first_name", &seller.first_name)?;
        let last_name = validate_name("last_name", &seller.last_name)?;
        let email = validate_email(seller.email.as_deref())?;

        debug!(seller_id = %seller.seller_id, "Registering seller");

        sqlx::query(
            r#"
            INSERT INTO sellers (seller_id, first_name, last_name, email, active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(seller.seller_id.value() as i64)
        .bind(&first_name)
        .bind(&last_name)
        .bind(&email)
        .bind(seller.active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|err| match DbError::from(err) {
            DbError::UniqueViolation { .. } => DbError::duplicate("seller_id", seller.seller_id),
            other => other,
        })?;

        info!(seller_id = %seller.seller_id, "Seller registered");

        Ok(Seller {
            seller_id: seller.seller_id,
            first_name,
            last_name,
            email,
            active: seller.active,
        })
    }

    /// Finds a seller by number, active or not.
    pub async fn find_by_seller_id(&self, seller_id: SellerId) -> DbResult<Option<Seller>> {
        let mut conn = self.pool.acquire().await?;
        find_seller(&mut *conn, seller_id).await
    }

    /// Active sellers, ordered by number.
    ///
    /// The registry is shared by all markets, so no market is needed.
    pub async fn list_active(&self) -> DbResult<Vec<Seller>> {
        let mut conn = self.pool.acquire().await?;
        fetch_active(&mut *conn).await
    }

    /// Inactive sellers, ordered by number.
    pub async fn list_inactive(&self) -> DbResult<Vec<Seller>> {
        let rows: Vec<SellerRow> = sqlx::query_as(
            r#"
            SELECT seller_id, first_name, last_name, email, active
            FROM sellers
            WHERE active = 0
            ORDER BY seller_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        into_sellers(rows)
    }

    /// Sets the active flag.
    pub async fn set_active(&self, seller_id: SellerId, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE sellers SET active = ?2 WHERE seller_id = ?1")
            .bind(seller_id.value() as i64)
            .bind(active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Seller", seller_id));
        }

        info!(%seller_id, active, "Seller status changed");
        Ok(())
    }

    /// Flips the active flag and returns the updated seller.
    pub async fn toggle_active(&self, seller_id: SellerId) -> DbResult<Seller> {
        let result = sqlx::query("UPDATE sellers SET active = NOT active WHERE seller_id = ?1")
            .bind(seller_id.value() as i64)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Seller", seller_id));
        }

        let seller = self
            .find_by_seller_id(seller_id)
            .await?
            .ok_or_else(|| DbError::not_found("Seller", seller_id))?;

        info!(%seller_id, active = seller.active, "Seller status toggled");
        Ok(seller)
    }

    /// Removes a seller from the registry.
    ///
    /// Stored settlement records keep their name snapshot.
    pub async fn delete(&self, seller_id: SellerId) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM sellers WHERE seller_id = ?1")
            .bind(seller_id.value() as i64)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Seller", seller_id));
        }

        info!(%seller_id, "Seller deleted");
        Ok(())
    }

    /// The number to offer the next new seller. `None` when all are taken.
    pub async fn next_free_seller_id(&self) -> DbResult<Option<SellerId>> {
        let numbers: Vec<i64> = sqlx::query_scalar("SELECT seller_id FROM sellers")
            .fetch_all(&self.pool)
            .await?;

        let taken = numbers
            .into_iter()
            .map(|n| SellerId::try_from(n).map_err(|e| DbError::corrupt("seller_id", e)))
            .collect::<DbResult<Vec<_>>>()?;

        Ok(next_free_seller_id(&taken))
    }
}

// =============================================================================
// Connection-level helpers (shared with receipt and settlement repositories)
// =============================================================================

pub(crate) async fn find_seller(
    conn: &mut SqliteConnection,
    seller_id: SellerId,
) -> DbResult<Option<Seller>> {
    let row: Option<SellerRow> = sqlx::query_as(
        r#"
        SELECT seller_id, first_name, last_name, email, active
        FROM sellers
        WHERE seller_id = ?1
        "#,
    )
    .bind(seller_id.value() as i64)
    .fetch_optional(conn)
    .await?;

    row.map(Seller::try_from).transpose()
}

pub(crate) async fn fetch_active(conn: &mut SqliteConnection) -> DbResult<Vec<Seller>> {
    let rows: Vec<SellerRow> = sqlx::query_as(
        r#"
        SELECT seller_id, first_name, last_name, email, active
        FROM sellers
        WHERE active = 1
        ORDER BY seller_id
        "#,
    )
    .fetch_all(conn)
    .await?;

    into_sellers(rows)
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig, DbError};
    use flohmarkt_core::{Seller, SellerId};

    fn seller(id: u16, first: &str, active: bool) -> Seller {
        Seller {
            seller_id: SellerId::new(id).unwrap(),
            first_name: first.to_string(),
            last_name: "Berger".to_string(),
            email: Some(format!("{}@example.org", first.to_lowercase())),
            active,
        }
    }

    #[tokio::test]
    async fn test_register_and_list() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let sellers = db.sellers();

        sellers.insert(&seller(4002, "Bea", true)).await.unwrap();
        sellers.insert(&seller(4001, "Anna", true)).await.unwrap();
        sellers.insert(&seller(4003, "Carl", false)).await.unwrap();

        let active: Vec<u16> = sellers
            .list_active()
            .await
            .unwrap()
            .iter()
            .map(|s| s.seller_id.value())
            .collect();
        assert_eq!(active, vec![4001, 4002]);

        let inactive = sellers.list_inactive().await.unwrap();
        assert_eq!(inactive.len(), 1);
        assert_eq!(inactive[0].first_name, "Carl");
    }

    #[tokio::test]
    async fn test_duplicate_number_is_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let sellers = db.sellers();

        sellers.insert(&seller(4001, "Anna", true)).await.unwrap();
        let err = sellers.insert(&seller(4001, "Bea", true)).await.unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { ref value, .. } if value == "4001"));
    }

    #[tokio::test]
    async fn test_insert_trims_and_validates() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut input = seller(4001, "  Anna ", true);
        input.email = Some("   ".to_string());

        let stored = db.sellers().insert(&input).await.unwrap();
        assert_eq!(stored.first_name, "Anna");
        assert_eq!(stored.email, None);

        let mut bad = seller(4002, "Bea", true);
        bad.last_name = String::new();
        assert!(matches!(
            db.sellers().insert(&bad).await,
            Err(DbError::Domain(_))
        ));
    }

    #[tokio::test]
    async fn test_toggle_and_delete() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let sellers = db.sellers();
        let id = SellerId::new(4001).unwrap();

        sellers.insert(&seller(4001, "Anna", true)).await.unwrap();
        assert!(!sellers.toggle_active(id).await.unwrap().active);
        assert!(sellers.toggle_active(id).await.unwrap().active);

        sellers.set_active(id, false).await.unwrap();
        assert!(!sellers.find_by_seller_id(id).await.unwrap().unwrap().active);

        sellers.delete(id).await.unwrap();
        assert!(sellers.find_by_seller_id(id).await.unwrap().is_none());
        assert!(matches!(
            sellers.delete(id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_next_free_seller_id_fills_gaps() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let sellers = db.sellers();

        assert_eq!(sellers.next_free_seller_id().await.unwrap().unwrap().value(), 4001);

        sellers.insert(&seller(4001, "Anna", true)).await.unwrap();
        sellers.insert(&seller(4003, "Carl", false)).await.unwrap();
        assert_eq!(sellers.next_free_seller_id().await.unwrap().unwrap().value(), 4002);
    }
}
