pub mod health;

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /flash-sales/homepage               GET   homepage payload
/// /flash-sales/active                 GET   active sales
/// /flash-sales/upcoming               GET   upcoming sales
/// /flash-sales/{id}                   GET   sale detail
/// /flash-sales/offers/{id}/allocate   POST  purchase-intent allocation
/// /admin/flash-sales                  POST  create sale
/// /admin/flash-sales/{id}             PATCH update display metadata
/// /admin/flash-sales/{id}/close       POST  force-close
/// /admin/offers/{id}/restock          POST  restock offer
/// ```
pub fn api_routes() -> Router<AppState> {
    let storefront = Router::new()
        .route("/homepage", get(handlers::storefront::homepage))
        .route("/active", get(handlers::storefront::active))
        .route("/upcoming", get(handlers::storefront::upcoming))
        .route("/{id}", get(handlers::storefront::get_sale))
        .route(
            "/offers/{id}/allocate",
            post(handlers::storefront::allocate),
        );

    let admin = Router::new()
        .route("/flash-sales", post(handlers::admin::create_sale))
        .route("/flash-sales/{id}", patch(handlers::admin::update_sale))
        .route("/flash-sales/{id}/close", post(handlers::admin::close_sale))
        .route("/offers/{id}/restock", post(handlers::admin::restock_offer));

    Router::new()
        .nest("/flash-sales", storefront)
        .nest("/admin", admin)
}
