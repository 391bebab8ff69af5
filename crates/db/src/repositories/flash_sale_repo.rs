//! Repository for the `flash_sales` table (the sale window store).
//!
//! Creation is transactional: the sale row and every offer row land
//! together or not at all. Input validation happens in the handler via
//! `flashmart_core::sale` before any SQL runs.

use sqlx::PgPool;

use flashmart_core::status::SaleStatus;
use flashmart_core::types::{DbId, Timestamp};

use crate::models::flash_sale::{CreateFlashSale, FlashSale, UpdateFlashSale};
use crate::models::offer::Offer;

/// Column list for `flash_sales` queries.
const COLUMNS: &str = "\
    id, name, description, time_slot, start_time, end_time, status, \
    total_views, total_orders, created_at, updated_at";

/// Column list for `flash_sale_offers` queries.
const OFFER_COLUMNS: &str = "\
    id, sale_id, product_id, variant_id, original_price_cents, \
    flash_price_cents, total_stock, sold_count, max_per_order, badge, \
    created_at, updated_at";

/// Provides CRUD and window queries for flash-sale campaigns.
pub struct FlashSaleRepo;

impl FlashSaleRepo {
    /// Insert a sale and its offers in one transaction.
    ///
    /// New sales start as `upcoming` with zero `sold_count` on every offer
    /// (the scheduling workflow creates them ahead of their window).
    pub async fn create(
        pool: &PgPool,
        input: &CreateFlashSale,
    ) -> Result<(FlashSale, Vec<Offer>), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO flash_sales (name, description, time_slot, start_time, end_time, status) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        let sale = sqlx::query_as::<_, FlashSale>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.time_slot)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(SaleStatus::Upcoming.as_str())
            .fetch_one(&mut *tx)
            .await?;

        let offer_query = format!(
            "INSERT INTO flash_sale_offers \
                (sale_id, product_id, variant_id, original_price_cents, \
                 flash_price_cents, total_stock, max_per_order, badge) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {OFFER_COLUMNS}"
        );
        let mut offers = Vec::with_capacity(input.offers.len());
        for o in &input.offers {
            let offer = sqlx::query_as::<_, Offer>(&offer_query)
                .bind(sale.id)
                .bind(&o.product_id)
                .bind(&o.variant_id)
                .bind(o.original_price_cents)
                .bind(o.flash_price_cents)
                .bind(o.total_stock)
                .bind(o.max_per_order)
                .bind(&o.badge)
                .fetch_one(&mut *tx)
                .await?;
            offers.push(offer);
        }

        tx.commit().await?;
        Ok((sale, offers))
    }

    /// Find a sale by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<FlashSale>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM flash_sales WHERE id = $1");
        sqlx::query_as::<_, FlashSale>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a sale together with its offers (ordered by offer ID).
    pub async fn find_detail(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<(FlashSale, Vec<Offer>)>, sqlx::Error> {
        let Some(sale) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let offers = Self::list_offers(pool, id).await?;
        Ok(Some((sale, offers)))
    }

    /// List the offers embedded in a sale, in creation order.
    pub async fn list_offers(pool: &PgPool, sale_id: DbId) -> Result<Vec<Offer>, sqlx::Error> {
        let query = format!(
            "SELECT {OFFER_COLUMNS} FROM flash_sale_offers \
             WHERE sale_id = $1 ORDER BY id ASC"
        );
        sqlx::query_as::<_, Offer>(&query)
            .bind(sale_id)
            .fetch_all(pool)
            .await
    }

    /// Update display metadata. Only non-`None` fields in `input` are
    /// applied. Returns `None` if the sale does not exist.
    pub async fn update_metadata(
        pool: &PgPool,
        id: DbId,
        input: &UpdateFlashSale,
    ) -> Result<Option<FlashSale>, sqlx::Error> {
        let query = format!(
            "UPDATE flash_sales SET \
                name = COALESCE($2, name), \
                description = COALESCE($3, description), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FlashSale>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_optional(pool)
            .await
    }

    /// Sales currently inside their window: `start_time <= now AND
    /// end_time >= now`, the active-query predicate of the status resolver.
    pub async fn list_active(pool: &PgPool, now: Timestamp) -> Result<Vec<FlashSale>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM flash_sales \
             WHERE start_time <= $1 AND end_time >= $1 \
             ORDER BY start_time ASC"
        );
        sqlx::query_as::<_, FlashSale>(&query)
            .bind(now)
            .fetch_all(pool)
            .await
    }

    /// Sales starting strictly after `now`, soonest first.
    pub async fn list_upcoming(
        pool: &PgPool,
        now: Timestamp,
        limit: i64,
    ) -> Result<Vec<FlashSale>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM flash_sales \
             WHERE start_time > $1 \
             ORDER BY start_time ASC \
             LIMIT $2"
        );
        sqlx::query_as::<_, FlashSale>(&query)
            .bind(now)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Candidate rows for the homepage aggregator: anything not yet ended
    /// whose window starts before `until` (end of the next calendar day).
    /// The in-process partition step classifies them precisely.
    pub async fn list_window_candidates(
        pool: &PgPool,
        now: Timestamp,
        until: Timestamp,
    ) -> Result<Vec<FlashSale>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM flash_sales \
             WHERE end_time >= $1 AND start_time < $2 \
             ORDER BY start_time ASC"
        );
        sqlx::query_as::<_, FlashSale>(&query)
            .bind(now)
            .bind(until)
            .fetch_all(pool)
            .await
    }

    /// Rewrite the denormalized `status` display cache.
    pub async fn refresh_status_cache(
        pool: &PgPool,
        id: DbId,
        status: SaleStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE flash_sales SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Force-close a sale: move its window entirely into the past so the
    /// resolver reports `ended` for every later instant.
    ///
    /// `start_time` is pulled back when the sale had not started yet,
    /// keeping the `start_time < end_time` constraint satisfied. Returns
    /// `None` if the sale does not exist or has already ended.
    pub async fn force_close(
        pool: &PgPool,
        id: DbId,
        now: Timestamp,
    ) -> Result<Option<FlashSale>, sqlx::Error> {
        let query = format!(
            "UPDATE flash_sales SET \
                end_time = $2 - INTERVAL '1 millisecond', \
                start_time = LEAST(start_time, $2 - INTERVAL '2 milliseconds'), \
                status = $3, \
                updated_at = NOW() \
             WHERE id = $1 AND end_time > $2 - INTERVAL '1 millisecond' \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FlashSale>(&query)
            .bind(id)
            .bind(now)
            .bind(SaleStatus::Ended.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Best-effort view counter. Lost updates are acceptable.
    pub async fn bump_views(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE flash_sales SET total_views = total_views + 1 WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Best-effort order counter, bumped after an allocation commits.
    pub async fn bump_orders(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE flash_sales SET total_orders = total_orders + 1 WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
