//! Offer models: the persisted row and the allocation snapshot.

use serde::Serialize;
use sqlx::FromRow;

use flashmart_core::allocation::OfferTerms;
use flashmart_core::sale::discount_percent;
use flashmart_core::types::{Cents, DbId, Timestamp};

/// A row from the `flash_sale_offers` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Offer {
    pub id: DbId,
    pub sale_id: DbId,
    pub product_id: String,
    pub variant_id: String,
    pub original_price_cents: Cents,
    pub flash_price_cents: Cents,
    pub total_stock: i32,
    pub sold_count: i32,
    pub max_per_order: i32,
    pub badge: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Offer {
    pub fn discount_percent(&self) -> i16 {
        discount_percent(self.original_price_cents, self.flash_price_cents)
    }
}

/// Offer payload as rendered to the storefront: the row plus the derived
/// discount. `sold_count` / `total_stock` feed the progress bar.
#[derive(Debug, Clone, Serialize)]
pub struct OfferView {
    pub id: DbId,
    pub sale_id: DbId,
    pub product_id: String,
    pub variant_id: String,
    pub original_price_cents: Cents,
    pub flash_price_cents: Cents,
    pub discount_percent: i16,
    pub total_stock: i32,
    pub sold_count: i32,
    pub max_per_order: i32,
    pub badge: Option<String>,
}

impl From<Offer> for OfferView {
    fn from(offer: Offer) -> Self {
        let discount_percent = offer.discount_percent();
        OfferView {
            id: offer.id,
            sale_id: offer.sale_id,
            product_id: offer.product_id,
            variant_id: offer.variant_id,
            original_price_cents: offer.original_price_cents,
            flash_price_cents: offer.flash_price_cents,
            discount_percent,
            total_stock: offer.total_stock,
            sold_count: offer.sold_count,
            max_per_order: offer.max_per_order,
            badge: offer.badge,
        }
    }
}

/// The minimal offer + parent-window projection the allocation controller
/// reads under the per-offer row lock. Kept narrow on purpose: locking
/// never drags the whole sale record along.
#[derive(Debug, Clone, FromRow)]
pub struct OfferSnapshot {
    pub id: DbId,
    pub sale_id: DbId,
    pub sold_count: i32,
    pub total_stock: i32,
    pub max_per_order: i32,
    pub flash_price_cents: Cents,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
}

impl OfferSnapshot {
    /// Project into the pure precondition-check input.
    pub fn terms(&self) -> OfferTerms {
        OfferTerms {
            sold_count: self.sold_count,
            total_stock: self.total_stock,
            max_per_order: self.max_per_order,
            flash_price_cents: self.flash_price_cents,
            window_start: self.start_time,
            window_end: self.end_time,
        }
    }
}
