//! # Coupon Repository
//!
//! Coupon lookup, creation and usage-slot redemption.
//!
//! Codes are stored in canonical form (see
//! [`normalize_code`](vitrine_core::coupon::normalize_code)), so lookups by
//! code normalize their input first.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use vitrine_core::coupon::normalize_code;
use vitrine_core::Coupon;

/// Repository for coupon database operations.
#[derive(Debug, Clone)]
pub struct CouponRepository {
    pool: SqlitePool,
}

impl CouponRepository {
    /// Creates a new CouponRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CouponRepository { pool }
    }

    /// Inserts a new coupon.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Code already exists
    pub async fn insert(&self, coupon: &Coupon) -> DbResult<Coupon> {
        debug!(code = %coupon.code, "Inserting coupon");

        sqlx::query(
            r#"
            INSERT INTO coupons (
                id, code, discount_type, discount_value, min_purchase_cents,
                expires_at, usage_limit, used_count, assigned_to, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&coupon.id)
        .bind(&coupon.code)
        .bind(coupon.discount_type)
        .bind(coupon.discount_value)
        .bind(coupon.min_purchase_cents)
        .bind(coupon.expires_at)
        .bind(coupon.usage_limit)
        .bind(coupon.used_count)
        .bind(&coupon.assigned_to)
        .bind(coupon.is_active)
        .bind(coupon.created_at)
        .bind(coupon.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("code", &coupon.code),
            other => other,
        })?;

        Ok(coupon.clone())
    }

    /// Gets a coupon by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Coupon>> {
        let mut conn = self.pool.acquire().await?;
        self.get_by_id_tx(&mut conn, id).await
    }

    /// Same as [`get_by_id`](Self::get_by_id) on the caller's connection.
    pub async fn get_by_id_tx(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Coupon>> {
        let coupon = sqlx::query_as::<_, Coupon>(
            r#"
            SELECT
                id, code, discount_type, discount_value, min_purchase_cents,
                expires_at, usage_limit, used_count, assigned_to, is_active,
                created_at, updated_at
            FROM coupons
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(coupon)
    }

    /// Gets a coupon by code. Case and surrounding whitespace are ignored.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Coupon>> {
        let code = normalize_code(code);

        let coupon = sqlx::query_as::<_, Coupon>(
            r#"
            SELECT
                id, code, discount_type, discount_value, min_purchase_cents,
                expires_at, usage_limit, used_count, assigned_to, is_active,
                created_at, updated_at
            FROM coupons
            WHERE code = ?1
            "#,
        )
        .bind(&code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(coupon)
    }

    /// Lists every coupon, newest first. Callers filter by visibility.
    pub async fn list_all(&self) -> DbResult<Vec<Coupon>> {
        let coupons = sqlx::query_as::<_, Coupon>(
            r#"
            SELECT
                id, code, discount_type, discount_value, min_purchase_cents,
                expires_at, usage_limit, used_count, assigned_to, is_active,
                created_at, updated_at
            FROM coupons
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(coupons)
    }

    /// Resolves coupon ids in the given order. Ids with no coupon are skipped.
    pub async fn get_many(&self, ids: &[String]) -> DbResult<Vec<Coupon>> {
        let mut conn = self.pool.acquire().await?;
        self.get_many_tx(&mut conn, ids).await
    }

    /// Same as [`get_many`](Self::get_many) on the caller's connection.
    pub async fn get_many_tx(
        &self,
        conn: &mut SqliteConnection,
        ids: &[String],
    ) -> DbResult<Vec<Coupon>> {
        let mut coupons = Vec::with_capacity(ids.len());
        for id in ids {
            match self.get_by_id_tx(conn, id).await? {
                Some(coupon) => coupons.push(coupon),
                None => debug!(id = %id, "Applied coupon no longer exists"),
            }
        }
        Ok(coupons)
    }

    /// Consumes one usage slot.
    ///
    /// ## Returns
    /// * `Ok(true)` - `used_count` incremented
    /// * `Ok(false)` - Coupon missing or already at its usage limit
    pub async fn redeem_tx(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        debug!(id = %id, "Redeeming coupon");

        let result = sqlx::query(
            r#"
            UPDATE coupons SET
                used_count = used_count + 1,
                updated_at = ?1
            WHERE id = ?2 AND used_count < usage_limit
            "#,
        )
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
