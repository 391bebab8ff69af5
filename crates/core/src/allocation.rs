//! Allocation preconditions and the engine's error taxonomy.
//!
//! The checks here are pure so they can be unit-tested without a database;
//! the api crate runs them inside the per-offer transaction while holding
//! the row lock, with `now` taken from the live clock (never the cached
//! `status` column).

use crate::status::{resolve, SaleStatus};
use crate::types::{Cents, Timestamp};

/// Why an allocation call did not commit.
///
/// `NotFound`, `WindowClosed`, `QuantityInvalid` and `InsufficientStock` are
/// terminal: retrying the same intent cannot succeed. `Contention` is
/// transient and safe to retry with the same idempotency key.
/// `DeadlineExceeded` means the outcome is unknown; the caller must
/// reconcile via its idempotency key instead of blindly retrying.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocationError {
    #[error("Offer {offer_id} not found")]
    NotFound { offer_id: i64 },

    #[error("Sale window is not active (status: {status})")]
    WindowClosed { status: SaleStatus },

    #[error("Invalid quantity {quantity} (must be between 1 and {max_per_order})")]
    QuantityInvalid { quantity: i32, max_per_order: i32 },

    #[error("Insufficient stock: requested {requested}, remaining {remaining}")]
    InsufficientStock { requested: i32, remaining: i32 },

    #[error("Could not commit within the retry budget, safe to retry")]
    Contention,

    #[error("Deadline expired before a definitive outcome, reconcile via idempotency key")]
    DeadlineExceeded,
}

impl AllocationError {
    /// Stable machine-readable code, used in HTTP bodies and the attempt
    /// ledger's `outcome` column.
    pub fn code(&self) -> &'static str {
        match self {
            AllocationError::NotFound { .. } => "not_found",
            AllocationError::WindowClosed { .. } => "window_closed",
            AllocationError::QuantityInvalid { .. } => "quantity_invalid",
            AllocationError::InsufficientStock { .. } => "insufficient_stock",
            AllocationError::Contention => "contention",
            AllocationError::DeadlineExceeded => "deadline_exceeded",
        }
    }

    /// Terminal errors are recorded in the attempt ledger and replayed on
    /// idempotent retries; transient ones are not.
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            AllocationError::Contention | AllocationError::DeadlineExceeded
        )
    }
}

/// Snapshot of the fields the precondition checks need, read under the
/// per-offer row lock.
#[derive(Debug, Clone, Copy)]
pub struct OfferTerms {
    pub sold_count: i32,
    pub total_stock: i32,
    pub max_per_order: i32,
    pub flash_price_cents: Cents,
    pub window_start: Timestamp,
    pub window_end: Timestamp,
}

impl OfferTerms {
    pub fn remaining(&self) -> i32 {
        self.total_stock - self.sold_count
    }
}

/// Evaluate the allocation preconditions, in contract order.
///
/// 1. Window is active at `now` (re-derived, inclusive bounds).
/// 2. `0 < quantity <= max_per_order`.
/// 3. `sold_count + quantity <= total_stock`.
///
/// Existence of the offer is checked by the caller before a snapshot can be
/// produced. Pure: no side effects, same inputs always give the same answer.
pub fn check(terms: &OfferTerms, quantity: i32, now: Timestamp) -> Result<(), AllocationError> {
    let status = resolve(now, terms.window_start, terms.window_end);
    if status != SaleStatus::Active {
        return Err(AllocationError::WindowClosed { status });
    }

    if quantity <= 0 || quantity > terms.max_per_order {
        return Err(AllocationError::QuantityInvalid {
            quantity,
            max_per_order: terms.max_per_order,
        });
    }

    // Widened so a cap near i32::MAX cannot overflow the sum.
    if i64::from(terms.sold_count) + i64::from(quantity) > i64::from(terms.total_stock) {
        return Err(AllocationError::InsufficientStock {
            requested: quantity,
            remaining: terms.remaining(),
        });
    }

    Ok(())
}
