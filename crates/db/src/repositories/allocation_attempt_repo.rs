//! Repository for the `allocation_attempts` idempotency ledger.

use sqlx::{PgPool, Postgres, Transaction};

use flashmart_core::types::{Cents, DbId, Timestamp};

use crate::models::allocation_attempt::AllocationAttempt;

/// Column list for `allocation_attempts` queries.
const COLUMNS: &str = "\
    id, offer_id, idempotency_key, outcome, quantity, max_per_order, \
    committed_quantity, unit_price_cents, created_at";

/// Provides lookup and append operations for allocation attempts.
pub struct AllocationAttemptRepo;

impl AllocationAttemptRepo {
    /// Look up a previously recorded attempt inside the allocation
    /// transaction.
    pub async fn find(
        tx: &mut Transaction<'_, Postgres>,
        offer_id: DbId,
        idempotency_key: &str,
    ) -> Result<Option<AllocationAttempt>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM allocation_attempts \
             WHERE offer_id = $1 AND idempotency_key = $2"
        );
        sqlx::query_as::<_, AllocationAttempt>(&query)
            .bind(offer_id)
            .bind(idempotency_key)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Pool-level lookup, used to replay the winner after losing a
    /// unique-key race.
    pub async fn find_by_key(
        pool: &PgPool,
        offer_id: DbId,
        idempotency_key: &str,
    ) -> Result<Option<AllocationAttempt>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM allocation_attempts \
             WHERE offer_id = $1 AND idempotency_key = $2"
        );
        sqlx::query_as::<_, AllocationAttempt>(&query)
            .bind(offer_id)
            .bind(idempotency_key)
            .fetch_optional(pool)
            .await
    }

    /// Record a terminal outcome. Fails with a unique violation on
    /// `uq_allocation_attempts_key` if another call recorded the same
    /// intent first.
    #[allow(clippy::too_many_arguments)]
    pub async fn record(
        tx: &mut Transaction<'_, Postgres>,
        offer_id: DbId,
        idempotency_key: &str,
        outcome: &str,
        quantity: i32,
        max_per_order: i32,
        committed_quantity: i32,
        unit_price_cents: Option<Cents>,
    ) -> Result<AllocationAttempt, sqlx::Error> {
        let query = format!(
            "INSERT INTO allocation_attempts \
                (offer_id, idempotency_key, outcome, quantity, \
                 max_per_order, committed_quantity, unit_price_cents) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AllocationAttempt>(&query)
            .bind(offer_id)
            .bind(idempotency_key)
            .bind(outcome)
            .bind(quantity)
            .bind(max_per_order)
            .bind(committed_quantity)
            .bind(unit_price_cents)
            .fetch_one(&mut **tx)
            .await
    }

    /// Delete ledger rows created before `cutoff`. Returns the number of
    /// rows removed. Called by the retention background task.
    pub async fn purge_older_than(pool: &PgPool, cutoff: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM allocation_attempts WHERE created_at < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
