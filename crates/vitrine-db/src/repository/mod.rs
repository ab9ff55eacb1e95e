//! # Repository Module
//!
//! Database repository implementations for Vitrine.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Service (apps/api)                                                    │
//! │       │                                                                 │
//! │       │  db.carts().get_or_create("user-1")                            │
//! │       ▼                                                                 │
//! │  CartRepository                                                        │
//! │  ├── get / get_or_create / save           (pooled connection)          │
//! │  └── lock_tx / get_tx / save_tx           (caller's transaction)       │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Methods ending in `_tx` take `&mut SqliteConnection` so several
//! repositories can write inside one transaction:
//!
//! ```rust,ignore
//! let mut tx = db.begin().await?;
//! db.products().take_stock_tx(&mut tx, "p1", 2, now).await?;
//! db.coupons().redeem_tx(&mut tx, "c1", now).await?;
//! tx.commit().await?;
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog reads and stock decrements
//! - [`CouponRepository`](coupon::CouponRepository) - Coupon lookup and redemption
//! - [`CartRepository`](cart::CartRepository) - Versioned per-user cart documents
//! - [`OrderRepository`](order::OrderRepository) - Order records and status changes

pub mod cart;
pub mod coupon;
pub mod order;
pub mod product;
