//! # Product Repository
//!
//! Database operations for catalog products (designs).
//!
//! ## Stock Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    take_stock_tx(p1, 2)                                 │
//! │                                                                         │
//! │  UPDATE products                                                       │
//! │     SET stock = stock - 2, sales = sales + 2                           │
//! │   WHERE id = 'p1' AND stock >= 2                                       │
//! │       │                                                                 │
//! │       ├── 1 row  → true   (stock taken)                                │
//! │       └── 0 rows → false  (missing or not enough stock)                │
//! │                                                                         │
//! │  The guard lives in the WHERE clause, so two checkouts can never       │
//! │  both take the last unit.                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use vitrine_core::Product;

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        self.get_by_id_tx(&mut conn, id).await
    }

    /// Same as [`get_by_id`](Self::get_by_id) on the caller's connection.
    pub async fn get_by_id_tx(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                id, title, price_cents, stock, sales, image, designer_id,
                created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(product)
    }

    /// Lists products, newest first.
    pub async fn list(&self, limit: u32, offset: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                id, title, price_cents, stock, sales, image, designer_id,
                created_at, updated_at
            FROM products
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?1 OFFSET ?2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Counts all products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Inserts a new product.
    ///
    /// ## Arguments
    /// * `product` - Product to insert (id should be generated beforehand)
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(id = %product.id, title = %product.title, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, title, price_cents, stock, sales, image, designer_id,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.title)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.sales)
        .bind(&product.image)
        .bind(&product.designer_id)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product.clone())
    }

    /// Takes `quantity` units from stock and records them as sales.
    ///
    /// ## Returns
    /// * `Ok(true)` - Stock decremented
    /// * `Ok(false)` - Product missing or fewer than `quantity` units left;
    ///   nothing changed
    pub async fn take_stock_tx(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        debug!(id = %id, quantity = quantity, "Taking stock");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                stock = stock - ?1,
                sales = sales + ?1,
                updated_at = ?2
            WHERE id = ?3 AND stock >= ?1
            "#,
        )
        .bind(quantity)
        .bind(now)
        .bind(id)
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

    fn product(id: &str, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            title: format!("Design {}", id),
            price_cents: 2500,
            stock,
            sales: 0,
            image: None,
            designer_id: Some("designer-1".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = db().await;
        let repo = db.products();

        repo.insert(&product("p1", 5)).await.unwrap();

        let found = repo.get_by_id("p1").await.unwrap().unwrap();
        assert_eq!(found.title, "Design p1");
        assert_eq!(found.stock, 5);
        assert_eq!(found.designer_id.as_deref(), Some("designer-1"));

        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_take_stock_guard() {
        let db = db().await;
        let repo = db.products();
        repo.insert(&product("p1", 3)).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        assert!(repo.take_stock_tx(&mut conn, "p1", 2, Utc::now()).await.unwrap());
        assert!(!repo.take_stock_tx(&mut conn, "p1", 2, Utc::now()).await.unwrap());
        assert!(!repo.take_stock_tx(&mut conn, "missing", 1, Utc::now()).await.unwrap());
        drop(conn);

        let after = repo.get_by_id("p1").await.unwrap().unwrap();
        assert_eq!(after.stock, 1);
        assert_eq!(after.sales, 2);
    }

    #[tokio::test]
    async fn test_list_and_count() {
        let db = db().await;
        let repo = db.products();
        for i in 0..3 {
            repo.insert(&product(&format!("p{}", i), 1)).await.unwrap();
        }

        assert_eq!(repo.count().await.unwrap(), 3);
        assert_eq!(repo.list(2, 0).await.unwrap().len(), 2);
        assert_eq!(repo.list(10, 2).await.unwrap().len(), 1);
    }
}
