//! Cart service.
//!
//! Every write follows the same shape:
//!
//! ```text
//! read cart (version v) → mutate in memory → recompute discount
//!                       → save WHERE version = v
//!                              ├── ok        → cart (version v+1)
//!                              └── 0 rows    → 409 CART_CONFLICT
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ApiResult;
use crate::services::{refresh_discount, save_cart};
use vitrine_core::validation::validate_uuid;
use vitrine_core::{Cart, CartItem, CoreError, NewCartItem};
use vitrine_db::{Database, DbError};

// =============================================================================
// DTOs
// =============================================================================

/// Body of `POST /cart` and each entry of `POST /cart/sync`.
///
/// `title`, `price` (cents) and `image` default to the catalog values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub design_id: String,
    pub quantity: i64,
    pub size: String,
    pub color: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Body of `POST /cart/sync`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncCartRequest {
    pub items: Vec<AddToCartRequest>,
}

/// The cart as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub applied_coupons: Vec<String>,
    /// Cents.
    pub total_discount: i64,
    /// Cents.
    pub subtotal: i64,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        CartView {
            items: cart.items.clone(),
            applied_coupons: cart.applied_coupons.clone(),
            total_discount: cart.total_discount_cents,
            subtotal: cart.subtotal().cents(),
        }
    }
}

// =============================================================================
// Operations
// =============================================================================

/// Returns the user's cart, creating it on first access.
///
/// The cached discount is recomputed against current coupon state and
/// persisted when it changed.
pub async fn get_cart(db: &Database, user_id: &str) -> ApiResult<Cart> {
    let mut cart = db.carts().get_or_create(user_id).await?;

    let cached = cart.total_discount_cents;
    refresh_discount(db, &mut cart, Utc::now()).await?;
    if cart.total_discount_cents == cached {
        return Ok(cart);
    }

    match db.carts().save(&cart).await {
        Ok(saved) => Ok(saved),
        // Lost the race: show the recomputed figure without persisting it
        Err(DbError::VersionConflict { .. }) => {
            debug!(user_id = %user_id, "Skipped discount write-back after conflict");
            Ok(cart)
        }
        Err(e) => Err(e.into()),
    }
}

/// Adds a line, or sums the quantity into the line with the same
/// design/size/color.
///
/// ## Errors
/// - `INVALID_ID` if `design_id` is not a UUID
/// - `PRODUCT_NOT_FOUND`
/// - `VALIDATION_ERROR` for bad quantity/size/color or a full cart
pub async fn add_item(db: &Database, user_id: &str, req: AddToCartRequest) -> ApiResult<Cart> {
    let item = resolve_item(db, req).await?;

    let mut cart = db.carts().get_or_create(user_id).await?;
    cart.add_item(item)?;

    let cart = save_cart(db, cart).await?;
    info!(user_id = %user_id, lines = cart.items.len(), "Cart item added");
    Ok(cart)
}

/// Removes the line with row id `item_id`. Unknown ids are a no-op.
///
/// ## Errors
/// - `CART_NOT_FOUND` if the user has no cart
pub async fn remove_item(db: &Database, user_id: &str, item_id: &str) -> ApiResult<Cart> {
    let mut cart = load_existing(db, user_id).await?;

    if !cart.remove_item(item_id) {
        debug!(user_id = %user_id, item_id = %item_id, "No such cart line");
        return Ok(cart);
    }

    Ok(save_cart(db, cart).await?)
}

/// Empties the cart's items. Applied coupons stay.
///
/// ## Errors
/// - `CART_NOT_FOUND` if the user has no cart
pub async fn clear(db: &Database, user_id: &str) -> ApiResult<Cart> {
    let mut cart = load_existing(db, user_id).await?;
    cart.clear_items();
    Ok(save_cart(db, cart).await?)
}

/// Merges an offline cart: lines whose key is absent are appended, lines
/// already present keep their quantity. Invalid lines and unknown designs
/// are skipped.
pub async fn sync(db: &Database, user_id: &str, items: Vec<AddToCartRequest>) -> ApiResult<Cart> {
    let mut resolved = Vec::with_capacity(items.len());
    for req in items {
        match resolve_item(db, req).await {
            Ok(item) => resolved.push(item),
            Err(LineError::Rejected(e)) => debug!(error = %e, "Skipping local cart line"),
            Err(LineError::Db(e)) => return Err(e.into()),
        }
    }

    let mut cart = db.carts().get_or_create(user_id).await?;
    let added = cart.sync(resolved);
    if added == 0 {
        return Ok(cart);
    }

    let cart = save_cart(db, cart).await?;
    info!(user_id = %user_id, added = added, "Cart synced");
    Ok(cart)
}

// =============================================================================
// Helpers
// =============================================================================

async fn load_existing(db: &Database, user_id: &str) -> ApiResult<Cart> {
    Ok(db
        .carts()
        .get(user_id)
        .await?
        .ok_or_else(|| CoreError::CartNotFound(user_id.to_string()))?)
}

/// Why a request line could not become a cart line. Sync skips
/// `Rejected` lines but never `Db` failures.
enum LineError {
    Rejected(CoreError),
    Db(DbError),
}

impl From<LineError> for crate::error::ApiError {
    fn from(err: LineError) -> Self {
        match err {
            LineError::Rejected(e) => e.into(),
            LineError::Db(e) => e.into(),
        }
    }
}

/// Validates the design id and fills the snapshot from the catalog.
async fn resolve_item(db: &Database, req: AddToCartRequest) -> Result<NewCartItem, LineError> {
    validate_uuid(&req.design_id)
        .map_err(|_| LineError::Rejected(CoreError::InvalidId(req.design_id.clone())))?;

    let product = db
        .products()
        .get_by_id(&req.design_id)
        .await
        .map_err(LineError::Db)?
        .ok_or_else(|| LineError::Rejected(CoreError::ProductNotFound(req.design_id.clone())))?;

    let mut snapshot = product.snapshot();
    if let Some(title) = req.title {
        snapshot.title = title;
    }
    if let Some(price_cents) = req.price {
        snapshot.price_cents = price_cents;
    }
    if req.image.is_some() {
        snapshot.image = req.image;
    }

    let item = NewCartItem {
        product_id: product.id,
        size: req.size,
        color: req.color,
        quantity: req.quantity,
        snapshot,
    };
    item.validate().map_err(LineError::Rejected)?;

    Ok(item)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::coupon_service;
    use crate::services::test_support::{coupon, db, product};
    use vitrine_core::DiscountType;

    fn req(design_id: &str, quantity: i64) -> AddToCartRequest {
        AddToCartRequest {
            design_id: design_id.to_string(),
            quantity,
            size: "M".to_string(),
            color: "black".to_string(),
            title: None,
            price: None,
            image: None,
        }
    }

    #[tokio::test]
    async fn test_get_cart_creates_empty() {
        let db = db().await;
        let cart = get_cart(&db, "u1").await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total_discount_cents, 0);
    }

    #[tokio::test]
    async fn test_add_item_fills_snapshot_and_merges() {
        let db = db().await;
        let p = product(&db, 2500, 10).await;

        add_item(&db, "u1", req(&p.id, 1)).await.unwrap();
        let cart = add_item(&db, "u1", req(&p.id, 2)).await.unwrap();

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 3);
        assert_eq!(cart.items[0].snapshot.title, "Wave Tee");
        assert_eq!(cart.items[0].snapshot.price_cents, 2500);
        assert_eq!(cart.subtotal().cents(), 7500);
    }

    #[tokio::test]
    async fn test_add_item_errors() {
        let db = db().await;

        let err = add_item(&db, "u1", req("not-a-uuid", 1)).await.unwrap_err();
        assert_eq!(err.code, "INVALID_ID");

        let missing = uuid::Uuid::new_v4().to_string();
        let err = add_item(&db, "u1", req(&missing, 1)).await.unwrap_err();
        assert_eq!(err.code, "PRODUCT_NOT_FOUND");

        let p = product(&db, 1000, 5).await;
        let err = add_item(&db, "u1", req(&p.id, 0)).await.unwrap_err();
        assert_eq!(err.code, "VALIDATION_ERROR");

        add_item(&db, "u1", req(&p.id, 999)).await.unwrap();
        let err = add_item(&db, "u1", req(&p.id, 1)).await.unwrap_err();
        assert_eq!(err.code, "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_add_item_rejects_out_of_range_price() {
        let db = db().await;
        let p = product(&db, 1000, 5).await;

        let mut huge = req(&p.id, 2);
        huge.price = Some(i64::MAX / 2 + 1);
        let err = add_item(&db, "u1", huge).await.unwrap_err();
        assert_eq!(err.code, "VALIDATION_ERROR");

        let mut capped = req(&p.id, 1);
        capped.price = Some(vitrine_core::MAX_PRICE_CENTS + 1);
        assert_eq!(add_item(&db, "u1", capped).await.unwrap_err().code, "VALIDATION_ERROR");

        let cart = get_cart(&db, "u1").await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(CartView::from(&cart).subtotal, 0);
    }

    #[tokio::test]
    async fn test_remove_and_clear_need_a_cart() {
        let db = db().await;
        assert_eq!(remove_item(&db, "u1", "x").await.unwrap_err().code, "CART_NOT_FOUND");
        assert_eq!(clear(&db, "u1").await.unwrap_err().code, "CART_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let db = db().await;
        let a = product(&db, 1000, 5).await;
        let b = product(&db, 2000, 5).await;
        add_item(&db, "u1", req(&a.id, 1)).await.unwrap();
        let cart = add_item(&db, "u1", req(&b.id, 1)).await.unwrap();

        let first = cart.items[0].id.clone();
        let cart = remove_item(&db, "u1", &first).await.unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].product_id, b.id);

        let c = coupon(&db, "KEEP", DiscountType::Percentage, 1000, None).await;
        coupon_service::apply(&db, "u1", "KEEP").await.unwrap();

        let cart = clear(&db, "u1").await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.applied_coupons, vec![c.id]);
        assert_eq!(cart.total_discount_cents, 0);
    }

    #[tokio::test]
    async fn test_sync_appends_absent_lines_only() {
        let db = db().await;
        let a = product(&db, 1000, 5).await;
        let b = product(&db, 2000, 5).await;
        add_item(&db, "u1", req(&a.id, 2)).await.unwrap();

        let local = vec![
            req(&a.id, 5),                               // present: quantity kept
            req(&b.id, 1),                               // absent: appended
            req(&uuid::Uuid::new_v4().to_string(), 1),   // unknown design: skipped
            req(&b.id, 0),                               // invalid: skipped
        ];
        let cart = sync(&db, "u1", local).await.unwrap();

        assert_eq!(cart.items.len(), 2);
        assert_eq!(cart.items[0].quantity, 2);
        assert_eq!(cart.items[1].product_id, b.id);
    }

    #[tokio::test]
    async fn test_get_cart_refreshes_stale_discount() {
        let db = db().await;
        let p = product(&db, 10000, 5).await;
        add_item(&db, "u1", req(&p.id, 1)).await.unwrap();
        coupon(&db, "TEN", DiscountType::Percentage, 1000, None).await;
        coupon_service::apply(&db, "u1", "TEN").await.unwrap();

        // Write a stale cached figure directly
        let mut stale = db.carts().get("u1").await.unwrap().unwrap();
        stale.total_discount_cents = 0;
        db.carts().save(&stale).await.unwrap();

        let cart = get_cart(&db, "u1").await.unwrap();
        assert_eq!(cart.total_discount_cents, 1000);
        assert_eq!(db.carts().get("u1").await.unwrap().unwrap().total_discount_cents, 1000);
    }

    #[tokio::test]
    async fn test_cart_view_shape() {
        let db = db().await;
        let p = product(&db, 1500, 5).await;
        let cart = add_item(&db, "u1", req(&p.id, 2)).await.unwrap();

        let json = serde_json::to_value(CartView::from(&cart)).unwrap();
        assert_eq!(json["subtotal"], 3000);
        assert_eq!(json["totalDiscount"], 0);
        assert!(json["appliedCoupons"].is_array());
        assert_eq!(json["items"][0]["productId"], p.id.as_str());
    }
}
