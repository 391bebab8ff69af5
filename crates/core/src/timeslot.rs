//! Canonical daily time slots for grouping sales on the storefront.
//!
//! Informational only: slot membership never feeds a correctness decision.
//! Window comparisons always use `start_time` / `end_time` directly.

use serde::{Deserialize, Serialize};

/// Fixed enumeration of the storefront's daily slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeSlot {
    #[serde(rename = "00:00-09:00")]
    EarlyBird,
    #[serde(rename = "09:00-12:00")]
    Morning,
    #[serde(rename = "12:00-15:00")]
    Midday,
    #[serde(rename = "15:00-18:00")]
    Afternoon,
    #[serde(rename = "18:00-21:00")]
    Evening,
    #[serde(rename = "21:00-24:00")]
    Night,
}

/// All slots in display order.
pub const ALL_SLOTS: [TimeSlot; 6] = [
    TimeSlot::EarlyBird,
    TimeSlot::Morning,
    TimeSlot::Midday,
    TimeSlot::Afternoon,
    TimeSlot::Evening,
    TimeSlot::Night,
];

impl TimeSlot {
    /// Stable slot code, matching the `flash_sales.time_slot` column values.
    pub fn as_str(self) -> &'static str {
        match self {
            TimeSlot::EarlyBird => "00:00-09:00",
            TimeSlot::Morning => "09:00-12:00",
            TimeSlot::Midday => "12:00-15:00",
            TimeSlot::Afternoon => "15:00-18:00",
            TimeSlot::Evening => "18:00-21:00",
            TimeSlot::Night => "21:00-24:00",
        }
    }

    /// Parse a slot code. Returns `None` for anything outside the canon.
    pub fn parse(code: &str) -> Option<Self> {
        ALL_SLOTS.iter().copied().find(|s| s.as_str() == code)
    }
}

impl std::fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
