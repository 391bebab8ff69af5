//! Creation-time validation for sale definitions.
//!
//! Violations reject the whole sale; nothing is clamped or partially
//! created. The same checks are mirrored by CHECK constraints in the
//! schema, but we validate here first to return a readable message
//! instead of a constraint-violation error.

use crate::error::CoreError;
use crate::types::{Cents, Timestamp};

/// Shape of a single offer as submitted at sale creation.
#[derive(Debug, Clone)]
pub struct OfferDefinition {
    pub product_id: String,
    pub variant_id: String,
    pub original_price_cents: Cents,
    pub flash_price_cents: Cents,
    pub total_stock: i32,
    pub max_per_order: i32,
}

/// `start_time < end_time`, strictly.
pub fn validate_window(start: Timestamp, end: Timestamp) -> Result<(), CoreError> {
    if start >= end {
        return Err(CoreError::Validation(format!(
            "start_time ({start}) must be strictly before end_time ({end})"
        )));
    }
    Ok(())
}

/// Per-offer invariants: non-negative prices, `flash <= original`,
/// `total_stock >= 1`, `max_per_order >= 1`.
pub fn validate_offer(offer: &OfferDefinition) -> Result<(), CoreError> {
    if offer.original_price_cents < 0 || offer.flash_price_cents < 0 {
        return Err(CoreError::Validation(format!(
            "Offer {}/{}: prices must be non-negative",
            offer.product_id, offer.variant_id
        )));
    }
    if offer.flash_price_cents > offer.original_price_cents {
        return Err(CoreError::Validation(format!(
            "Offer {}/{}: flash price {} exceeds original price {}",
            offer.product_id,
            offer.variant_id,
            offer.flash_price_cents,
            offer.original_price_cents
        )));
    }
    if offer.total_stock < 1 {
        return Err(CoreError::Validation(format!(
            "Offer {}/{}: total_stock must be at least 1",
            offer.product_id, offer.variant_id
        )));
    }
    if offer.max_per_order < 1 {
        return Err(CoreError::Validation(format!(
            "Offer {}/{}: max_per_order must be at least 1",
            offer.product_id, offer.variant_id
        )));
    }
    Ok(())
}

/// Validate a whole sale definition: window, at least one offer, every
/// offer well-formed, no duplicate (product, variant) pair.
pub fn validate_sale(
    start: Timestamp,
    end: Timestamp,
    offers: &[OfferDefinition],
) -> Result<(), CoreError> {
    validate_window(start, end)?;

    if offers.is_empty() {
        return Err(CoreError::Validation(
            "A flash sale must contain at least one offer".into(),
        ));
    }

    let mut seen = std::collections::HashSet::new();
    for offer in offers {
        validate_offer(offer)?;
        if !seen.insert((offer.product_id.as_str(), offer.variant_id.as_str())) {
            return Err(CoreError::Validation(format!(
                "Duplicate offer for variant {}/{}",
                offer.product_id, offer.variant_id
            )));
        }
    }
    Ok(())
}

/// Display discount: `round(100 * (1 - flash/original))`.
///
/// A free original price (0) has no meaningful discount; reported as 0.
pub fn discount_percent(original_cents: Cents, flash_cents: Cents) -> i16 {
    if original_cents <= 0 {
        return 0;
    }
    let off = 100.0 * (1.0 - flash_cents as f64 / original_cents as f64);
    off.round() as i16
}
