//! # Order Repository
//!
//! Orders are written once, inside the checkout transaction. After that only
//! `status` (and `updated_at`) ever changes.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use vitrine_core::{Order, OrderItem, OrderStatus, PaymentInfo, ShippingAddress};

/// Stored shape of an order.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    user_id: String,
    items: String,
    total_cents: i64,
    discount_cents: i64,
    final_cents: i64,
    status: OrderStatus,
    shipping_address: String,
    payment_info: Option<String>,
    applied_coupons: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self) -> DbResult<Order> {
        let items: Vec<OrderItem> = serde_json::from_str(&self.items)?;
        let shipping_address: ShippingAddress = serde_json::from_str(&self.shipping_address)?;
        let payment_info: Option<PaymentInfo> = self
            .payment_info
            .as_deref()
            .map(serde_json::from_str::<PaymentInfo>)
            .transpose()?;
        let applied_coupons: Vec<String> = serde_json::from_str(&self.applied_coupons)?;

        Ok(Order {
            id: self.id,
            user_id: self.user_id,
            items,
            total_cents: self.total_cents,
            discount_cents: self.discount_cents,
            final_cents: self.final_cents,
            status: self.status,
            shipping_address,
            payment_info,
            applied_coupons,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn into_orders(rows: Vec<OrderRow>) -> DbResult<Vec<Order>> {
    rows.into_iter().map(OrderRow::into_order).collect()
}

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Inserts an order on the caller's connection (normally the checkout
    /// transaction).
    pub async fn insert_tx(&self, conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
        debug!(id = %order.id, user_id = %order.user_id, "Inserting order");

        let items = serde_json::to_string(&order.items)?;
        let shipping_address = serde_json::to_string(&order.shipping_address)?;
        let payment_info = order
            .payment_info
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let applied_coupons = serde_json::to_string(&order.applied_coupons)?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, user_id, items, total_cents, discount_cents, final_cents,
                status, shipping_address, payment_info, applied_coupons,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&order.id)
        .bind(&order.user_id)
        .bind(&items)
        .bind(order.total_cents)
        .bind(order.discount_cents)
        .bind(order.final_cents)
        .bind(order.status)
        .bind(&shipping_address)
        .bind(&payment_info)
        .bind(&applied_coupons)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Gets an order by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT
                id, user_id, items, total_cents, discount_cents, final_cents,
                status, shipping_address, payment_info, applied_coupons,
                created_at, updated_at
            FROM orders
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(OrderRow::into_order).transpose()
    }

    /// Lists a user's orders, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT
                id, user_id, items, total_cents, discount_cents, final_cents,
                status, shipping_address, payment_info, applied_coupons,
                created_at, updated_at
            FROM orders
            WHERE user_id = ?1
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        into_orders(rows)
    }

    /// Lists every order, newest first.
    pub async fn list_all(&self) -> DbResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT
                id, user_id, items, total_cents, discount_cents, final_cents,
                status, shipping_address, payment_info, applied_coupons,
                created_at, updated_at
            FROM orders
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        into_orders(rows)
    }

    /// Sets an order's status.
    ///
    /// ## Returns
    /// * `Ok(Order)` - The updated order
    /// * `Err(DbError::NotFound)` - No such order
    pub async fn update_status(&self, id: &str, status: OrderStatus) -> DbResult<Order> {
        debug!(id = %id, status = %status, "Updating order status");

        let result = sqlx::query("UPDATE orders SET status = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(status)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::Duration;
    use vitrine_core::PriceSnapshot;

    fn order(id: &str, user_id: &str, created_at: DateTime<Utc>) -> Order {
        Order {
            id: id.to_string(),
            user_id: user_id.to_string(),
            items: vec![OrderItem {
                product_id: "p1".to_string(),
                size: "L".to_string(),
                color: "white".to_string(),
                quantity: 2,
                snapshot: PriceSnapshot {
                    title: "Grid Tee".to_string(),
                    price_cents: 3000,
                    image: None,
                },
            }],
            total_cents: 6000,
            discount_cents: 600,
            final_cents: 5400,
            status: OrderStatus::Pending,
            shipping_address: ShippingAddress {
                address: "1 Main St".to_string(),
                city: "Lyon".to_string(),
                postal_code: "69001".to_string(),
                country: "FR".to_string(),
            },
            payment_info: Some(PaymentInfo {
                id: "pay_123".to_string(),
                status: "authorized".to_string(),
            }),
            applied_coupons: vec!["c1".to_string()],
            created_at,
            updated_at: created_at,
        }
    }

    async fn db_with(orders: &[Order]) -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut tx = db.begin().await.unwrap();
        for o in orders {
            db.orders().insert_tx(&mut tx, o).await.unwrap();
        }
        tx.commit().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let original = order("o1", "u1", Utc::now());
        let db = db_with(&[original.clone()]).await;

        let loaded = db.orders().get_by_id("o1").await.unwrap().unwrap();
        assert_eq!(loaded, original);
        assert!(db.orders().get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let now = Utc::now();
        let db = db_with(&[
            order("old", "u1", now - Duration::hours(2)),
            order("new", "u1", now),
            order("other", "u2", now - Duration::hours(1)),
        ])
        .await;

        let mine: Vec<_> = db
            .orders()
            .list_for_user("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(mine, vec!["new", "old"]);

        let all = db.orders().list_all().await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].id, "new");
        assert_eq!(all[1].id, "other");
    }

    #[tokio::test]
    async fn test_update_status() {
        let db = db_with(&[order("o1", "u1", Utc::now())]).await;

        let updated = db
            .orders()
            .update_status("o1", OrderStatus::Shipped)
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Shipped);
        assert_eq!(updated.total_cents, 6000);

        let err = db
            .orders()
            .update_status("missing", OrderStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
