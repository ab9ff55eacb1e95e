//! Product service: publishing and reading designs.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::error::ApiResult;
use vitrine_core::validation::validate_uuid;
use vitrine_core::{CoreError, NewProduct, Product};
use vitrine_db::Database;

/// Publishes a design owned by `designer_id`.
///
/// ## Errors
/// - `VALIDATION_ERROR` for a bad title, negative price or negative stock
pub async fn create(db: &Database, designer_id: &str, new: NewProduct) -> ApiResult<Product> {
    new.validate().map_err(CoreError::from)?;

    let now = Utc::now();
    let product = Product {
        id: Uuid::new_v4().to_string(),
        title: new.title.trim().to_string(),
        price_cents: new.price_cents,
        stock: new.stock,
        sales: 0,
        image: new.image,
        designer_id: Some(designer_id.to_string()),
        created_at: now,
        updated_at: now,
    };

    let product = db.products().insert(&product).await?;
    info!(id = %product.id, designer_id = %designer_id, "Product published");
    Ok(product)
}

/// ## Errors
/// - `INVALID_ID` if `id` is not a UUID
/// - `PRODUCT_NOT_FOUND`
pub async fn get(db: &Database, id: &str) -> ApiResult<Product> {
    validate_uuid(id).map_err(|_| CoreError::InvalidId(id.to_string()))?;

    Ok(db
        .products()
        .get_by_id(id)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?)
}
