//! The homepage aggregator.
//!
//! Read-only: composes the `active`, `upcoming_today` and `tomorrow`
//! sections from a single candidate scan plus an in-process partition
//! step. Staleness of a few seconds is fine here; nothing on this path
//! touches allocation state.

use std::collections::HashMap;

use chrono::Duration;
use serde::Serialize;

use flashmart_core::status::{resolve, SaleStatus};
use flashmart_core::types::{DbId, Timestamp};
use flashmart_db::models::flash_sale::FlashSale;
use flashmart_db::models::offer::OfferView;
use flashmart_db::repositories::FlashSaleRepo;

use crate::error::AppResult;
use crate::state::AppState;

const DAY_SECS: i64 = 86_400;

/// A sale as rendered on the storefront: row fields, freshly derived
/// status, and its offers with live stock numbers.
#[derive(Debug, Serialize)]
pub struct SaleView {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub time_slot: String,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    /// Derived at response time, not the cached column.
    pub status: SaleStatus,
    pub offers: Vec<OfferView>,
}

impl SaleView {
    pub fn build(sale: FlashSale, offers: Vec<OfferView>, now: Timestamp) -> Self {
        let status = resolve(now, sale.start_time, sale.end_time);
        SaleView {
            id: sale.id,
            name: sale.name,
            description: sale.description,
            time_slot: sale.time_slot,
            start_time: sale.start_time,
            end_time: sale.end_time,
            status,
            offers,
        }
    }
}

/// The homepage payload: three pairwise-disjoint sections.
#[derive(Debug, Serialize)]
pub struct HomepagePayload {
    pub active: Vec<SaleView>,
    pub upcoming_today: Vec<SaleView>,
    pub tomorrow: Vec<SaleView>,
}

/// Calendar-day boundaries in the display timezone, expressed as UTC
/// instants. Pure integer arithmetic on a fixed offset, so no DST
/// ambiguity can arise.
pub fn day_boundaries(now: Timestamp, tz_offset_minutes: i32) -> (Timestamp, Timestamp) {
    let local_secs = now.timestamp() + i64::from(tz_offset_minutes) * 60;
    let secs_into_day = local_secs.rem_euclid(DAY_SECS);
    let end_of_today = now + Duration::seconds(DAY_SECS - secs_into_day);
    let end_of_tomorrow = end_of_today + Duration::seconds(DAY_SECS);
    (end_of_today, end_of_tomorrow)
}

/// Classify candidate sales into the three homepage sections.
///
/// `candidates` must be ordered by `start_time` ascending (the store query
/// guarantees it), which makes both upcoming sections come out sorted and
/// lets the `tomorrow` cap keep the earliest starters. Every sale lands in
/// at most one section.
pub fn partition(
    candidates: Vec<FlashSale>,
    now: Timestamp,
    tz_offset_minutes: i32,
    tomorrow_cap: usize,
) -> (Vec<FlashSale>, Vec<FlashSale>, Vec<FlashSale>) {
    let (end_of_today, end_of_tomorrow) = day_boundaries(now, tz_offset_minutes);

    let mut active = Vec::new();
    let mut today = Vec::new();
    let mut tomorrow = Vec::new();

    for sale in candidates {
        match resolve(now, sale.start_time, sale.end_time) {
            SaleStatus::Active => active.push(sale),
            SaleStatus::Upcoming if sale.start_time < end_of_today => today.push(sale),
            SaleStatus::Upcoming if sale.start_time < end_of_tomorrow => {
                if tomorrow.len() < tomorrow_cap {
                    tomorrow.push(sale);
                }
            }
            // Ended, or starting beyond tomorrow: not shown.
            _ => {}
        }
    }

    (active, today, tomorrow)
}

/// Build the full homepage payload.
pub async fn get_for_homepage(state: &AppState) -> AppResult<HomepagePayload> {
    let now = state.clock.now();
    let (_, end_of_tomorrow) = day_boundaries(now, state.config.display_tz_offset_minutes);

    let candidates =
        FlashSaleRepo::list_window_candidates(&state.pool, now, end_of_tomorrow).await?;

    let (active, today, tomorrow) = partition(
        candidates,
        now,
        state.config.display_tz_offset_minutes,
        state.config.homepage_tomorrow_limit,
    );

    let mut offers_by_sale = load_offers(state, [&active, &today, &tomorrow]).await?;
    let mut build = |sales: Vec<FlashSale>| -> Vec<SaleView> {
        sales
            .into_iter()
            .map(|sale| {
                let offers = offers_by_sale.remove(&sale.id).unwrap_or_default();
                SaleView::build(sale, offers, now)
            })
            .collect()
    };

    Ok(HomepagePayload {
        active: build(active),
        upcoming_today: build(today),
        tomorrow: build(tomorrow),
    })
}

/// Fetch and group the offers for every sale in the given sections.
async fn load_offers(
    state: &AppState,
    sections: [&Vec<FlashSale>; 3],
) -> AppResult<HashMap<DbId, Vec<OfferView>>> {
    let mut grouped: HashMap<DbId, Vec<OfferView>> = HashMap::new();
    for sale in sections.into_iter().flatten() {
        let offers = FlashSaleRepo::list_offers(&state.pool, sale.id).await?;
        grouped.insert(sale.id, offers.into_iter().map(OfferView::from).collect());
    }
    Ok(grouped)
}
