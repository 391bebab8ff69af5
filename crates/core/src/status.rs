//! Sale lifecycle status and the resolver that derives it from time.
//!
//! The `status` column on `flash_sales` is a display cache only. Every
//! allocation decision re-derives the status from the live clock via
//! [`resolve`]; the stored value may be stale between recomputations.

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Lifecycle state of a sale window. Transitions only ever move forward:
/// `Upcoming -> Active -> Ended` as `now` advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Upcoming,
    Active,
    Ended,
}

impl SaleStatus {
    /// Stable string code, matching the `flash_sales.status` column values.
    pub fn as_str(self) -> &'static str {
        match self {
            SaleStatus::Upcoming => "upcoming",
            SaleStatus::Active => "active",
            SaleStatus::Ended => "ended",
        }
    }
}

impl std::fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive the lifecycle status of a window at instant `now`.
///
/// Inclusive on both bounds: a sale is active at exactly `start` and at
/// exactly `end`. Total for any three well-formed instants.
pub fn resolve(now: Timestamp, start: Timestamp, end: Timestamp) -> SaleStatus {
    if now < start {
        SaleStatus::Upcoming
    } else if now <= end {
        SaleStatus::Active
    } else {
        SaleStatus::Ended
    }
}
