//! The allocation controller.
//!
//! Guarantees `sold_count <= total_stock` per offer under any interleaving
//! of concurrent calls. The serialization point is a row-level lock on the
//! single offer row (`SELECT ... FOR UPDATE NOWAIT`); every read-check-write
//! of `sold_count` happens inside one transaction while holding it.
//!
//! Lock contention (SQLSTATE 55P03) is retried with doubling, jittered
//! backoff up to a configured budget, after which the caller gets
//! `Contention` -- transient and safe to retry with the same idempotency
//! key. A caller-supplied deadline turns into `DeadlineExceeded`, which
//! makes no claim about the outcome: a commit may have landed after the
//! caller stopped listening, and reconciliation goes through the
//! idempotency ledger.

use std::time::Duration;

use rand::Rng;
use sqlx::PgPool;

use flashmart_core::allocation::{check, AllocationError};
use flashmart_core::types::{DbId, Timestamp};
use flashmart_db::models::allocation_attempt::{AllocationReceipt, OUTCOME_COMMITTED};
use flashmart_db::repositories::offer_repo::is_lock_contention;
use flashmart_db::repositories::{AllocationAttemptRepo, FlashSaleRepo, OfferRepo};

use crate::error::AppError;
use crate::state::AppState;

/// A purchase intent from the order-creation workflow.
#[derive(Debug, Clone)]
pub struct AllocationRequest {
    pub offer_id: DbId,
    pub quantity: i32,
    /// Caller-supplied key; network retries of the same intent replay the
    /// recorded outcome instead of decrementing twice.
    pub idempotency_key: String,
    /// Optional caller deadline for the whole call.
    pub deadline: Option<Duration>,
}

/// What a single transactional attempt produced.
enum AttemptOutcome {
    /// This call committed the decrement.
    Committed {
        receipt: AllocationReceipt,
        sale_id: DbId,
    },
    /// A previous call with the same idempotency key already resolved this
    /// intent; its outcome is replayed verbatim.
    Replayed(Result<AllocationReceipt, AllocationError>),
    /// A terminal precondition rejection, recorded in the ledger.
    Rejected(AllocationError),
}

/// Atomically allocate `quantity` units of an offer, or reject with a
/// reason from the engine taxonomy.
pub async fn try_allocate(
    state: &AppState,
    request: AllocationRequest,
) -> Result<AllocationReceipt, AppError> {
    match request.deadline {
        Some(deadline) => {
            match tokio::time::timeout(deadline, allocate_with_retries(state, &request)).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(
                        offer_id = request.offer_id,
                        idempotency_key = %request.idempotency_key,
                        "Allocation deadline expired with unknown outcome"
                    );
                    Err(AppError::Allocation(AllocationError::DeadlineExceeded))
                }
            }
        }
        None => allocate_with_retries(state, &request).await,
    }
}

/// Run transactional attempts until one resolves, retrying only on lock
/// contention and idempotency-key races, bounded by the configured budget.
async fn allocate_with_retries(
    state: &AppState,
    request: &AllocationRequest,
) -> Result<AllocationReceipt, AppError> {
    let budget = state.config.allocation_retry_budget.max(1);
    let base_backoff = state.config.allocation_retry_base_backoff_ms;

    for attempt in 0..budget {
        let now = state.clock.now();
        match allocate_once(&state.pool, request, now).await {
            Ok(AttemptOutcome::Committed { receipt, sale_id }) => {
                // Advisory counter; a lost update here is acceptable.
                let pool = state.pool.clone();
                tokio::spawn(async move {
                    if let Err(e) = FlashSaleRepo::bump_orders(&pool, sale_id).await {
                        tracing::debug!(error = %e, sale_id, "Order counter bump failed");
                    }
                });
                tracing::info!(
                    offer_id = request.offer_id,
                    quantity = request.quantity,
                    "Allocation committed"
                );
                return Ok(receipt);
            }
            Ok(AttemptOutcome::Replayed(result)) => {
                tracing::debug!(
                    offer_id = request.offer_id,
                    idempotency_key = %request.idempotency_key,
                    "Replayed recorded allocation outcome"
                );
                return result.map_err(AppError::Allocation);
            }
            Ok(AttemptOutcome::Rejected(reject)) => {
                return Err(AppError::Allocation(reject));
            }
            Err(e) if is_lock_contention(&e) => {
                tracing::debug!(
                    offer_id = request.offer_id,
                    attempt,
                    "Offer row contended, backing off"
                );
                backoff(base_backoff, attempt).await;
            }
            Err(e) if is_attempt_key_race(&e) => {
                // Lost the unique-key race on the ledger: some concurrent
                // call with the same intent recorded first. Replay it.
                if let Some(winner) = AllocationAttemptRepo::find_by_key(
                    &state.pool,
                    request.offer_id,
                    &request.idempotency_key,
                )
                .await?
                {
                    return winner.replay().map_err(AppError::Allocation);
                }
                backoff(base_backoff, attempt).await;
            }
            Err(e) => return Err(AppError::Database(e)),
        }
    }

    Err(AppError::Allocation(AllocationError::Contention))
}

/// One transactional attempt: replay check, row lock, precondition check,
/// decrement, ledger append, commit.
async fn allocate_once(
    pool: &PgPool,
    request: &AllocationRequest,
    now: Timestamp,
) -> Result<AttemptOutcome, sqlx::Error> {
    let mut tx = pool.begin().await?;

    if let Some(attempt) =
        AllocationAttemptRepo::find(&mut tx, request.offer_id, &request.idempotency_key).await?
    {
        return Ok(AttemptOutcome::Replayed(attempt.replay()));
    }

    let Some(snapshot) = OfferRepo::lock_snapshot(&mut tx, request.offer_id).await? else {
        // Nothing to attach the idempotency key to; NotFound re-evaluates
        // identically on retry.
        return Ok(AttemptOutcome::Rejected(AllocationError::NotFound {
            offer_id: request.offer_id,
        }));
    };

    // Status is re-derived from `now` here; the cached `status` column is
    // display-only and plays no part in this decision.
    match check(&snapshot.terms(), request.quantity, now) {
        Ok(()) => {
            OfferRepo::apply_allocation(&mut tx, request.offer_id, request.quantity).await?;
            AllocationAttemptRepo::record(
                &mut tx,
                request.offer_id,
                &request.idempotency_key,
                OUTCOME_COMMITTED,
                request.quantity,
                snapshot.max_per_order,
                request.quantity,
                Some(snapshot.flash_price_cents),
            )
            .await?;
            tx.commit().await?;
            Ok(AttemptOutcome::Committed {
                receipt: AllocationReceipt {
                    offer_id: request.offer_id,
                    committed_quantity: request.quantity,
                    unit_price_cents: snapshot.flash_price_cents,
                },
                sale_id: snapshot.sale_id,
            })
        }
        Err(reject) if reject.is_terminal() => {
            AllocationAttemptRepo::record(
                &mut tx,
                request.offer_id,
                &request.idempotency_key,
                reject.code(),
                request.quantity,
                snapshot.max_per_order,
                0,
                None,
            )
            .await?;
            tx.commit().await?;
            Ok(AttemptOutcome::Rejected(reject))
        }
        // `check` only produces terminal errors; kept for exhaustiveness.
        Err(reject) => Ok(AttemptOutcome::Rejected(reject)),
    }
}

/// Doubling backoff with jitter: `base * 2^attempt + rand(0..=base)` ms,
/// capped at 250 ms per sleep.
async fn backoff(base_ms: u64, attempt: u32) {
    let base = base_ms.max(1);
    let jitter = rand::rng().random_range(0..=base);
    let delay = base.saturating_mul(1 << attempt.min(8)) + jitter;
    tokio::time::sleep(Duration::from_millis(delay.min(250))).await;
}

/// Returns true for a unique violation on the idempotency ledger.
fn is_attempt_key_race(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some("23505")
                && db_err.constraint() == Some("uq_allocation_attempts_key")
        }
        _ => false,
    }
}
