//! # Cart Repository
//!
//! One cart document per user, stored as a row with JSON columns.
//!
//! ## Optimistic Concurrency
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                Compare-and-Swap on `version`                            │
//! │                                                                         │
//! │  Request A                         Request B                           │
//! │  ─────────                         ─────────                           │
//! │  get()        → version 4          get()        → version 4            │
//! │  mutate                            mutate                              │
//! │  save()                                                                │
//! │    UPDATE ... version = 5                                              │
//! │    WHERE version = 4   → 1 row ✓                                       │
//! │                                    save()                              │
//! │                                      UPDATE ... version = 5            │
//! │                                      WHERE version = 4   → 0 rows      │
//! │                                      → DbError::VersionConflict        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No update is ever lost: the loser gets a conflict instead of silently
//! overwriting the winner.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use vitrine_core::{Cart, CartItem};

/// Stored shape of a cart.
#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    user_id: String,
    items: String,
    applied_coupons: String,
    total_discount_cents: i64,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CartRow {
    fn into_cart(self) -> DbResult<Cart> {
        let items: Vec<CartItem> = serde_json::from_str(&self.items)?;
        let applied_coupons: Vec<String> = serde_json::from_str(&self.applied_coupons)?;

        Ok(Cart {
            user_id: self.user_id,
            items,
            applied_coupons,
            total_discount_cents: self.total_discount_cents,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Repository for cart database operations.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Gets a user's cart.
    ///
    /// ## Returns
    /// * `Ok(None)` - The user has never had a cart
    pub async fn get(&self, user_id: &str) -> DbResult<Option<Cart>> {
        let mut conn = self.pool.acquire().await?;
        self.get_tx(&mut conn, user_id).await
    }

    /// Same as [`get`](Self::get) on the caller's connection.
    pub async fn get_tx(
        &self,
        conn: &mut SqliteConnection,
        user_id: &str,
    ) -> DbResult<Option<Cart>> {
        let row = sqlx::query_as::<_, CartRow>(
            r#"
            SELECT
                user_id, items, applied_coupons, total_discount_cents, version,
                created_at, updated_at
            FROM carts
            WHERE user_id = ?1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

        row.map(CartRow::into_cart).transpose()
    }

    /// Gets a user's cart, creating an empty one on first access.
    ///
    /// Safe under concurrent first access: the insert is `OR IGNORE`, so both
    /// callers end up reading the same row.
    pub async fn get_or_create(&self, user_id: &str) -> DbResult<Cart> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO carts (
                user_id, items, applied_coupons, total_discount_cents, version,
                created_at, updated_at
            ) VALUES (?1, '[]', '[]', 0, 0, ?2, ?2)
            "#,
        )
        .bind(user_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            debug!(user_id = %user_id, "Created cart");
        }

        self.get(user_id)
            .await?
            .ok_or_else(|| DbError::not_found("Cart", user_id))
    }

    /// Writes `cart` if its stored version still equals `cart.version`.
    ///
    /// ## Returns
    /// * `Ok(Cart)` - The saved cart with its new version
    /// * `Err(DbError::VersionConflict)` - Someone else saved first, or the
    ///   cart no longer exists
    pub async fn save(&self, cart: &Cart) -> DbResult<Cart> {
        let mut conn = self.pool.acquire().await?;
        self.save_tx(&mut conn, cart).await
    }

    /// Same as [`save`](Self::save) on the caller's connection.
    pub async fn save_tx(&self, conn: &mut SqliteConnection, cart: &Cart) -> DbResult<Cart> {
        let now = Utc::now();
        let items = serde_json::to_string(&cart.items)?;
        let applied_coupons = serde_json::to_string(&cart.applied_coupons)?;

        let result = sqlx::query(
            r#"
            UPDATE carts SET
                items = ?1,
                applied_coupons = ?2,
                total_discount_cents = ?3,
                version = version + 1,
                updated_at = ?4
            WHERE user_id = ?5 AND version = ?6
            "#,
        )
        .bind(&items)
        .bind(&applied_coupons)
        .bind(cart.total_discount_cents)
        .bind(now)
        .bind(&cart.user_id)
        .bind(cart.version)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            debug!(user_id = %cart.user_id, version = cart.version, "Cart version conflict");
            return Err(DbError::conflict("Cart", &cart.user_id));
        }

        let mut saved = cart.clone();
        saved.version += 1;
        saved.updated_at = now;
        Ok(saved)
    }

    /// Takes the database write lock by touching the cart row.
    ///
    /// Run as the first statement of a transaction so that everything read
    /// afterwards stays current until commit.
    ///
    /// ## Returns
    /// * `Ok(false)` - The user has no cart
    pub async fn lock_tx(&self, conn: &mut SqliteConnection, user_id: &str) -> DbResult<bool> {
        let result = sqlx::query("UPDATE carts SET updated_at = updated_at WHERE user_id = ?1")
            .bind(user_id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use vitrine_core::{NewCartItem, PriceSnapshot};

    fn line(product_id: &str, quantity: i64) -> NewCartItem {
        NewCartItem {
            product_id: product_id.to_string(),
            size: "M".to_string(),
            color: "navy".to_string(),
            quantity,
            snapshot: PriceSnapshot {
                title: "Wave Tee".to_string(),
                price_cents: 2200,
                image: Some("https://cdn.example.com/wave.png".to_string()),
            },
        }
    }

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let db = db().await;
        let repo = db.carts();

        assert!(repo.get("u1").await.unwrap().is_none());

        let first = repo.get_or_create("u1").await.unwrap();
        let second = repo.get_or_create("u1").await.unwrap();

        assert!(first.is_empty());
        assert_eq!(first.version, 0);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_save_round_trips_document() {
        let db = db().await;
        let repo = db.carts();

        let mut cart = repo.get_or_create("u1").await.unwrap();
        cart.add_item(line("p1", 2)).unwrap();
        cart.apply_coupon("c1", "SAVE10").unwrap();
        cart.total_discount_cents = 440;

        let saved = repo.save(&cart).await.unwrap();
        assert_eq!(saved.version, 1);

        let loaded = repo.get("u1").await.unwrap().unwrap();
        assert_eq!(loaded.version, 1);
        assert_eq!(loaded.items, cart.items);
        assert_eq!(loaded.applied_coupons, vec!["c1".to_string()]);
        assert_eq!(loaded.total_discount_cents, 440);
    }

    #[tokio::test]
    async fn test_stale_save_conflicts() {
        let db = db().await;
        let repo = db.carts();

        let base = repo.get_or_create("u1").await.unwrap();

        let mut a = base.clone();
        a.add_item(line("p1", 1)).unwrap();
        let mut b = base;
        b.add_item(line("p2", 1)).unwrap();

        repo.save(&a).await.unwrap();
        let err = repo.save(&b).await.unwrap_err();
        assert!(matches!(err, DbError::VersionConflict { .. }));

        // The winner's write is intact
        let stored = repo.get("u1").await.unwrap().unwrap();
        assert_eq!(stored.items.len(), 1);
        assert_eq!(stored.items[0].product_id, "p1");
    }

    #[tokio::test]
    async fn test_lock_requires_existing_cart() {
        let db = db().await;
        let repo = db.carts();
        repo.get_or_create("u1").await.unwrap();

        let mut tx = db.begin().await.unwrap();
        assert!(repo.lock_tx(&mut tx, "u1").await.unwrap());
        assert!(!repo.lock_tx(&mut tx, "nobody").await.unwrap());
        tx.commit().await.unwrap();

        // Locking leaves the version alone
        assert_eq!(repo.get("u1").await.unwrap().unwrap().version, 0);
    }
}
