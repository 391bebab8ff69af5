use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use flashmart_api::catalog::{CatalogClient, StaticCatalog};
use flashmart_api::config::ServerConfig;
use flashmart_api::router::build_app_router;
use flashmart_api::state::AppState;
use flashmart_core::clock::FixedClock;
use flashmart_core::types::Timestamp;
use flashmart_db::models::flash_sale::{CreateFlashSale, CreateOffer, FlashSale};
use flashmart_db::models::offer::Offer;
use flashmart_db::repositories::FlashSaleRepo;

/// Admin token the test config uses.
pub const ADMIN_TOKEN: &str = "test-admin-token";

/// A fixed "now" all tests anchor their windows on: 2026-03-01 12:00 UTC.
pub fn test_now() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

/// Build a test `ServerConfig` with safe defaults.
///
/// UTC display timezone, tomorrow section capped at 3, small retry
/// budget/backoff so contention tests stay fast.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        display_tz_offset_minutes: 0,
        homepage_tomorrow_limit: 3,
        allocation_retry_budget: 5,
        allocation_retry_base_backoff_ms: 2,
        attempt_retention_hours: 48,
        admin_api_token: ADMIN_TOKEN.to_string(),
        catalog_base_url: None,
    }
}

/// Build the full application router with all middleware layers, a pinned
/// clock, and a permissive catalog stub.
///
/// This mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack that production uses.
pub fn build_test_app(pool: PgPool, clock: Arc<FixedClock>) -> Router {
    build_test_app_with_catalog(pool, clock, Arc::new(StaticCatalog::permissive()))
}

/// Same as [`build_test_app`] but with an explicit catalog stub, for tests
/// exercising variant verification.
pub fn build_test_app_with_catalog(
    pool: PgPool,
    clock: Arc<FixedClock>,
    catalog: Arc<dyn CatalogClient>,
) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        clock,
        catalog,
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST with the admin token header set.
pub async fn post_json_admin(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-admin-token", ADMIN_TOKEN)
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// PATCH with the admin token header set.
pub async fn patch_json_admin(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method("PATCH")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-admin-token", ADMIN_TOKEN)
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Seed helpers
// ---------------------------------------------------------------------------

/// Insert a sale with a single offer via the repository layer.
///
/// Defaults: stock 10, max 5 per order, flash price 29.99.
pub async fn seed_sale(
    pool: &PgPool,
    start: Timestamp,
    end: Timestamp,
) -> (FlashSale, Vec<Offer>) {
    seed_sale_with_offer(pool, start, end, 10, 5).await
}

pub async fn seed_sale_with_offer(
    pool: &PgPool,
    start: Timestamp,
    end: Timestamp,
    total_stock: i32,
    max_per_order: i32,
) -> (FlashSale, Vec<Offer>) {
    let input = CreateFlashSale {
        name: "Test flash sale".to_string(),
        description: Some("seeded".to_string()),
        time_slot: "09:00-12:00".to_string(),
        start_time: start,
        end_time: end,
        offers: vec![CreateOffer {
            product_id: format!("p-{}", uuid::Uuid::new_v4()),
            variant_id: "v-1".to_string(),
            original_price_cents: 4999,
            flash_price_cents: 2999,
            total_stock,
            max_per_order,
            badge: Some("HOT".to_string()),
        }],
    };
    FlashSaleRepo::create(pool, &input)
        .await
        .expect("seed sale insert failed")
}
