//! Handlers for the public storefront surface.
//!
//! All read endpoints are safe to call at high frequency and tolerate a
//! few seconds of staleness; only `allocate` mutates allocation state.

use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use flashmart_core::error::CoreError;
use flashmart_core::status::resolve;
use flashmart_core::types::DbId;
use flashmart_db::models::offer::OfferView;
use flashmart_db::repositories::FlashSaleRepo;

use crate::engine::allocator::{self, AllocationRequest};
use crate::engine::homepage::{self, SaleView};
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Homepage
// ---------------------------------------------------------------------------

/// GET /api/v1/flash-sales/homepage
///
/// The three-section payload the storefront homepage renders:
/// `active`, `upcoming_today` and `tomorrow` (capped).
pub async fn homepage(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let payload = homepage::get_for_homepage(&state).await?;
    Ok(Json(DataResponse { data: payload }))
}

// ---------------------------------------------------------------------------
// Active / upcoming
// ---------------------------------------------------------------------------

/// GET /api/v1/flash-sales/active
///
/// All sales currently inside their window, with live stock numbers.
pub async fn active(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let now = state.clock.now();
    let sales = FlashSaleRepo::list_active(&state.pool, now).await?;

    let mut views = Vec::with_capacity(sales.len());
    for sale in sales {
        let offers = FlashSaleRepo::list_offers(&state.pool, sale.id).await?;
        views.push(SaleView::build(
            sale,
            offers.into_iter().map(OfferView::from).collect(),
            now,
        ));
    }
    Ok(Json(DataResponse { data: views }))
}

/// Query parameters for `GET /flash-sales/upcoming`.
#[derive(Debug, Deserialize)]
pub struct UpcomingQuery {
    /// Maximum number of results. Defaults to 10, capped at 50.
    pub limit: Option<i64>,
}

/// GET /api/v1/flash-sales/upcoming
///
/// Sales starting after now, soonest first.
pub async fn upcoming(
    State(state): State<AppState>,
    Query(params): Query<UpcomingQuery>,
) -> AppResult<impl IntoResponse> {
    let now = state.clock.now();
    let limit = params.limit.unwrap_or(10).clamp(1, 50);
    let sales = FlashSaleRepo::list_upcoming(&state.pool, now, limit).await?;

    let mut views = Vec::with_capacity(sales.len());
    for sale in sales {
        let offers = FlashSaleRepo::list_offers(&state.pool, sale.id).await?;
        views.push(SaleView::build(
            sale,
            offers.into_iter().map(OfferView::from).collect(),
            now,
        ));
    }
    Ok(Json(DataResponse { data: views }))
}

// ---------------------------------------------------------------------------
// Sale detail
// ---------------------------------------------------------------------------

/// GET /api/v1/flash-sales/{id}
///
/// Sale detail with offers. Bumps the advisory view counter and lazily
/// refreshes the denormalized status cache, both best-effort.
pub async fn get_sale(
    State(state): State<AppState>,
    Path(sale_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let now = state.clock.now();
    let (sale, offers) = FlashSaleRepo::find_detail(&state.pool, sale_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "FlashSale",
            id: sale_id,
        }))?;

    let derived = resolve(now, sale.start_time, sale.end_time);
    if sale.status != derived.as_str() {
        let pool = state.pool.clone();
        tokio::spawn(async move {
            if let Err(e) = FlashSaleRepo::refresh_status_cache(&pool, sale_id, derived).await {
                tracing::debug!(error = %e, sale_id, "Status cache refresh failed");
            }
        });
    }

    let pool = state.pool.clone();
    tokio::spawn(async move {
        if let Err(e) = FlashSaleRepo::bump_views(&pool, sale_id).await {
            tracing::debug!(error = %e, sale_id, "View counter bump failed");
        }
    });

    let view = SaleView::build(sale, offers.into_iter().map(OfferView::from).collect(), now);
    Ok(Json(DataResponse { data: view }))
}

// ---------------------------------------------------------------------------
// Allocation
// ---------------------------------------------------------------------------

/// Body of `POST /flash-sales/offers/{id}/allocate`.
#[derive(Debug, Deserialize)]
pub struct AllocateBody {
    pub quantity: i32,
    /// Required so network retries of the same purchase intent never
    /// double-decrement.
    pub idempotency_key: String,
    /// Optional caller deadline in milliseconds.
    pub deadline_ms: Option<u64>,
}

/// POST /api/v1/flash-sales/offers/{id}/allocate
///
/// Atomically claim `quantity` units of an offer. Returns 201 with the
/// committed quantity and unit price, or a rejection from the engine
/// taxonomy (404 / 410 / 400 / 409 / 503 / 504).
pub async fn allocate(
    State(state): State<AppState>,
    Path(offer_id): Path<DbId>,
    Json(body): Json<AllocateBody>,
) -> AppResult<impl IntoResponse> {
    if body.idempotency_key.trim().is_empty() {
        return Err(AppError::BadRequest("idempotency_key must not be empty".into()));
    }

    let receipt = allocator::try_allocate(
        &state,
        AllocationRequest {
            offer_id,
            quantity: body.quantity,
            idempotency_key: body.idempotency_key,
            deadline: body.deadline_ms.map(Duration::from_millis),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: receipt })))
}
