//! Idempotency ledger models for allocation calls.

use serde::Serialize;
use sqlx::FromRow;

use flashmart_core::allocation::AllocationError;
use flashmart_core::status::SaleStatus;
use flashmart_core::types::{Cents, DbId, Timestamp};

/// Outcome code for a committed allocation, matching the
/// `allocation_attempts.outcome` CHECK constraint.
pub const OUTCOME_COMMITTED: &str = "committed";

/// A row from the `allocation_attempts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AllocationAttempt {
    pub id: DbId,
    pub offer_id: DbId,
    pub idempotency_key: String,
    /// `committed`, `window_closed`, `quantity_invalid` or
    /// `insufficient_stock`.
    pub outcome: String,
    pub quantity: i32,
    /// The offer's cap at decision time, kept so replays report the bound
    /// the original call was judged against.
    pub max_per_order: i32,
    pub committed_quantity: i32,
    pub unit_price_cents: Option<Cents>,
    pub created_at: Timestamp,
}

/// Successful allocation result returned to the order workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AllocationReceipt {
    pub offer_id: DbId,
    pub committed_quantity: i32,
    pub unit_price_cents: Cents,
}

impl AllocationAttempt {
    /// Replay a recorded attempt as the outcome the original call produced.
    ///
    /// Rejection rows carry the quantity and per-order cap the decision was
    /// made against; stock numbers are not snapshotted, so a replayed
    /// `InsufficientStock` reports a neutral remaining count.
    pub fn replay(&self) -> Result<AllocationReceipt, AllocationError> {
        match self.outcome.as_str() {
            OUTCOME_COMMITTED => Ok(AllocationReceipt {
                offer_id: self.offer_id,
                committed_quantity: self.committed_quantity,
                unit_price_cents: self.unit_price_cents.unwrap_or_default(),
            }),
            "window_closed" => Err(AllocationError::WindowClosed {
                status: SaleStatus::Ended,
            }),
            "quantity_invalid" => Err(AllocationError::QuantityInvalid {
                quantity: self.quantity,
                max_per_order: self.max_per_order,
            }),
            "insufficient_stock" => Err(AllocationError::InsufficientStock {
                requested: self.quantity,
                remaining: 0,
            }),
            // Unreachable while the CHECK constraint holds.
            other => {
                tracing::error!(outcome = other, attempt_id = self.id, "Unknown attempt outcome");
                Err(AllocationError::Contention)
            }
        }
    }
}
