//! Handlers for the admin back-office surface.
//!
//! All endpoints require the shared admin token via [`AdminAuth`].
//! Creation validates the full sale definition before any SQL runs; a
//! malformed sale is rejected outright and never partially created.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use flashmart_core::error::CoreError;
use flashmart_core::sale::{validate_sale, OfferDefinition};
use flashmart_core::timeslot::TimeSlot;
use flashmart_core::types::DbId;
use flashmart_db::models::flash_sale::{CreateFlashSale, UpdateFlashSale};
use flashmart_db::models::offer::OfferView;
use flashmart_db::repositories::{FlashSaleRepo, OfferRepo};

use crate::engine::homepage::SaleView;
use crate::error::{AppError, AppResult};
use crate::middleware::admin::AdminAuth;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// POST /api/v1/admin/flash-sales
///
/// Create a sale with its embedded offers. Validates the window and every
/// offer invariant, verifies each variant against the catalog service,
/// then inserts everything in one transaction. Returns 201.
pub async fn create_sale(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Json(input): Json<CreateFlashSale>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    if TimeSlot::parse(&input.time_slot).is_none() {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Unknown time slot: {}",
            input.time_slot
        ))));
    }

    let definitions: Vec<OfferDefinition> = input
        .offers
        .iter()
        .map(|o| OfferDefinition {
            product_id: o.product_id.clone(),
            variant_id: o.variant_id.clone(),
            original_price_cents: o.original_price_cents,
            flash_price_cents: o.flash_price_cents,
            total_stock: o.total_stock,
            max_per_order: o.max_per_order,
        })
        .collect();
    validate_sale(input.start_time, input.end_time, &definitions)?;

    // Catalog existence check happens only here, never during allocation.
    for offer in &input.offers {
        let variant = state
            .catalog
            .get_variant(&offer.product_id, &offer.variant_id)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;
        if variant.is_none() {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Unknown catalog variant: {}/{}",
                offer.product_id, offer.variant_id
            ))));
        }
    }

    let (sale, offers) = FlashSaleRepo::create(&state.pool, &input).await?;

    tracing::info!(
        sale_id = sale.id,
        name = %sale.name,
        offers = offers.len(),
        "Flash sale created"
    );

    let now = state.clock.now();
    let view = SaleView::build(sale, offers.into_iter().map(OfferView::from).collect(), now);
    Ok((StatusCode::CREATED, Json(DataResponse { data: view })))
}

// ---------------------------------------------------------------------------
// Update metadata
// ---------------------------------------------------------------------------

/// PATCH /api/v1/admin/flash-sales/{id}
///
/// Update display metadata (name, description). The window and the offer
/// list are immutable through this path.
pub async fn update_sale(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Path(sale_id): Path<DbId>,
    Json(input): Json<UpdateFlashSale>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let sale = FlashSaleRepo::update_metadata(&state.pool, sale_id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "FlashSale",
            id: sale_id,
        }))?;

    Ok(Json(DataResponse { data: sale }))
}

// ---------------------------------------------------------------------------
// Force-close
// ---------------------------------------------------------------------------

/// POST /api/v1/admin/flash-sales/{id}/close
///
/// End a sale early: its window is moved into the past so every later
/// allocation reports `OFFER_ENDED`. 409 if the sale already ended.
pub async fn close_sale(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Path(sale_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let now = state.clock.now();

    let Some(sale) = FlashSaleRepo::force_close(&state.pool, sale_id, now).await? else {
        // Distinguish "never existed" from "already over".
        return match FlashSaleRepo::find_by_id(&state.pool, sale_id).await? {
            None => Err(AppError::Core(CoreError::NotFound {
                entity: "FlashSale",
                id: sale_id,
            })),
            Some(_) => Err(AppError::Core(CoreError::Conflict(
                "Sale has already ended".into(),
            ))),
        };
    };

    tracing::info!(sale_id = sale.id, "Flash sale force-closed");
    Ok(Json(DataResponse { data: sale }))
}

// ---------------------------------------------------------------------------
// Restock
// ---------------------------------------------------------------------------

/// Body of `POST /admin/offers/{id}/restock`.
///
/// Used by the external order system for refunds/cancellations: either
/// grow the allocation (`add_stock`) or hand back sold units
/// (`release_sold`). Never expressed as a negative allocation.
#[derive(Debug, Deserialize)]
pub struct RestockBody {
    pub add_stock: Option<i32>,
    pub release_sold: Option<i32>,
}

/// POST /api/v1/admin/offers/{id}/restock
///
/// Adjust an offer's stock under the same per-offer serialization point
/// as allocation.
pub async fn restock_offer(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Path(offer_id): Path<DbId>,
    Json(body): Json<RestockBody>,
) -> AppResult<impl IntoResponse> {
    let add_stock = body.add_stock.unwrap_or(0);
    let release_sold = body.release_sold.unwrap_or(0);

    if add_stock < 0 || release_sold < 0 {
        return Err(AppError::Core(CoreError::Validation(
            "add_stock and release_sold must be non-negative".into(),
        )));
    }
    if add_stock == 0 && release_sold == 0 {
        return Err(AppError::Core(CoreError::Validation(
            "Provide add_stock and/or release_sold".into(),
        )));
    }

    let Some(offer) = OfferRepo::restock(&state.pool, offer_id, add_stock, release_sold).await?
    else {
        return match OfferRepo::find_by_id(&state.pool, offer_id).await? {
            None => Err(AppError::Core(CoreError::NotFound {
                entity: "Offer",
                id: offer_id,
            })),
            Some(current) => Err(AppError::Core(CoreError::Validation(format!(
                "Cannot release {release_sold} units, only {} sold",
                current.sold_count
            )))),
        };
    };

    tracing::info!(
        offer_id,
        add_stock,
        release_sold,
        total_stock = offer.total_stock,
        sold_count = offer.sold_count,
        "Offer restocked"
    );
    Ok(Json(DataResponse {
        data: OfferView::from(offer),
    }))
}
