//! Repository for the `flash_sale_offers` table.
//!
//! `lock_snapshot` is the per-offer serialization point: a
//! `SELECT ... FOR UPDATE NOWAIT` on the single offer row. `NOWAIT` turns
//! lock contention into SQLSTATE 55P03 so the engine can apply its own
//! bounded retry/backoff policy instead of queueing on the lock.

use sqlx::{PgPool, Postgres, Transaction};

use flashmart_core::types::DbId;

use crate::models::offer::{Offer, OfferSnapshot};

/// Column list for `flash_sale_offers` queries.
const COLUMNS: &str = "\
    id, sale_id, product_id, variant_id, original_price_cents, \
    flash_price_cents, total_stock, sold_count, max_per_order, badge, \
    created_at, updated_at";

/// Joined projection for the allocation path: the offer's mutable stock
/// fields plus the parent sale's window, nothing else.
const SNAPSHOT_COLUMNS: &str = "\
    o.id, o.sale_id, o.sold_count, o.total_stock, o.max_per_order, \
    o.flash_price_cents, s.start_time, s.end_time";

/// PostgreSQL `lock_not_available`, raised by `FOR UPDATE NOWAIT`.
pub const SQLSTATE_LOCK_NOT_AVAILABLE: &str = "55P03";

/// Returns true if `err` is the NOWAIT lock-contention error.
pub fn is_lock_contention(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some(SQLSTATE_LOCK_NOT_AVAILABLE)
        }
        _ => false,
    }
}

/// Provides point lookups and stock mutations for offers.
pub struct OfferRepo;

impl OfferRepo {
    /// Find an offer row by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Offer>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM flash_sale_offers WHERE id = $1");
        sqlx::query_as::<_, Offer>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Unlocked snapshot read (display, existence checks).
    pub async fn find_snapshot(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<OfferSnapshot>, sqlx::Error> {
        let query = format!(
            "SELECT {SNAPSHOT_COLUMNS} \
             FROM flash_sale_offers o \
             JOIN flash_sales s ON s.id = o.sale_id \
             WHERE o.id = $1"
        );
        sqlx::query_as::<_, OfferSnapshot>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lock the offer row for the duration of the transaction and return
    /// its snapshot. Only the offer row is locked (`FOR UPDATE OF o`);
    /// the parent sale row stays unlocked so other offers of the same sale
    /// never serialize against each other.
    ///
    /// Fails with SQLSTATE 55P03 (see [`is_lock_contention`]) when another
    /// allocation currently holds the row.
    pub async fn lock_snapshot(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
    ) -> Result<Option<OfferSnapshot>, sqlx::Error> {
        let query = format!(
            "SELECT {SNAPSHOT_COLUMNS} \
             FROM flash_sale_offers o \
             JOIN flash_sales s ON s.id = o.sale_id \
             WHERE o.id = $1 \
             FOR UPDATE OF o NOWAIT"
        );
        sqlx::query_as::<_, OfferSnapshot>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Apply a committed decrement while holding the row lock taken by
    /// [`Self::lock_snapshot`]. Returns the new `sold_count`.
    ///
    /// The `sold_count <= total_stock` CHECK constraint is the last line of
    /// defence; with the preconditions evaluated under the lock it never
    /// fires.
    pub async fn apply_allocation(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
        quantity: i32,
    ) -> Result<i32, sqlx::Error> {
        let (sold_count,): (i32,) = sqlx::query_as(
            "UPDATE flash_sale_offers \
             SET sold_count = sold_count + $2, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING sold_count",
        )
        .bind(id)
        .bind(quantity)
        .fetch_one(&mut **tx)
        .await?;
        Ok(sold_count)
    }

    /// Restock an offer for the external order system: raise `total_stock`
    /// by `add_stock` and/or lower `sold_count` by `release_sold`.
    ///
    /// A single conditional UPDATE, so it takes the same per-offer row lock
    /// as allocation. Returns `None` when the offer does not exist or
    /// releasing would drive `sold_count` negative.
    pub async fn restock(
        pool: &PgPool,
        id: DbId,
        add_stock: i32,
        release_sold: i32,
    ) -> Result<Option<Offer>, sqlx::Error> {
        let query = format!(
            "UPDATE flash_sale_offers \
             SET total_stock = total_stock + $2, \
                 sold_count = sold_count - $3, \
                 updated_at = NOW() \
             WHERE id = $1 AND sold_count - $3 >= 0 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Offer>(&query)
            .bind(id)
            .bind(add_stock)
            .bind(release_sold)
            .fetch_optional(pool)
            .await
    }
}
