//! Flash-sale campaign models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use flashmart_core::types::{Cents, DbId, Timestamp};

/// A row from the `flash_sales` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FlashSale {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    /// Canonical daily slot code (e.g. `09:00-12:00`). Informational only.
    pub time_slot: String,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    /// Display cache; may lag the wall clock. Never consulted for
    /// allocation decisions.
    pub status: String,
    pub total_views: i64,
    pub total_orders: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// One offer as submitted inside `POST /admin/flash-sales`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOffer {
    #[validate(length(min = 1, max = 128))]
    pub product_id: String,
    #[validate(length(min = 1, max = 128))]
    pub variant_id: String,
    pub original_price_cents: Cents,
    pub flash_price_cents: Cents,
    pub total_stock: i32,
    pub max_per_order: i32,
    pub badge: Option<String>,
}

/// DTO for creating a flash sale with its embedded offers.
///
/// The offer list is immutable in shape after creation; only `sold_count`
/// (allocation) and `total_stock` (explicit restock) change later.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateFlashSale {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    /// Must be one of the canonical slot codes.
    pub time_slot: String,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    #[validate(nested)]
    #[validate(length(min = 1))]
    pub offers: Vec<CreateOffer>,
}

/// DTO for `PATCH /admin/flash-sales/{id}`. Display metadata only; the
/// window and the offer list are immutable through this path.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateFlashSale {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
}
