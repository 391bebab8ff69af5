//! Integration tests for the admin surface: authentication, sale creation
//! and validation, metadata updates, force-close, and restock.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Duration;
use common::{
    body_json, get, patch_json_admin, post_json, post_json_admin, seed_sale, seed_sale_with_offer,
    test_now,
};
use flashmart_api::catalog::StaticCatalog;
use flashmart_core::clock::FixedClock;
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;

fn create_body(start: chrono::DateTime<chrono::Utc>, end: chrono::DateTime<chrono::Utc>) -> serde_json::Value {
    json!({
        "name": "Evening electronics blitz",
        "description": "Deep cuts on headphones",
        "time_slot": "18:00-21:00",
        "start_time": start,
        "end_time": end,
        "offers": [{
            "product_id": "p-100",
            "variant_id": "v-1",
            "original_price_cents": 4999,
            "flash_price_cents": 2999,
            "total_stock": 10,
            "max_per_order": 5,
            "badge": "HOT"
        }]
    })
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn admin_routes_require_token(pool: PgPool) {
    let now = test_now();
    let app = common::build_test_app(pool, Arc::new(FixedClock::new(now)));

    let body = create_body(now + Duration::hours(1), now + Duration::hours(2));
    let response = post_json(app, "/api/v1/admin/flash-sales", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn wrong_admin_token_is_rejected(pool: PgPool) {
    let now = test_now();
    let app = common::build_test_app(pool, Arc::new(FixedClock::new(now)));

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/admin/flash-sales")
        .header("content-type", "application/json")
        .header("x-admin-token", "not-the-token")
        .body(Body::from(
            create_body(now + Duration::hours(1), now + Duration::hours(2)).to_string(),
        ))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn create_sale_returns_created_view(pool: PgPool) {
    let now = test_now();
    let app = common::build_test_app(pool.clone(), Arc::new(FixedClock::new(now)));

    let body = create_body(now + Duration::hours(1), now + Duration::hours(2));
    let response = post_json_admin(app, "/api/v1/admin/flash-sales", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Evening electronics blitz");
    assert_eq!(json["data"]["status"], "upcoming");
    assert_eq!(json["data"]["offers"][0]["sold_count"], 0);
    assert_eq!(json["data"]["offers"][0]["discount_percent"], 40);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_rejects_inverted_window(pool: PgPool) {
    let now = test_now();
    let app = common::build_test_app(pool, Arc::new(FixedClock::new(now)));

    let body = create_body(now + Duration::hours(2), now + Duration::hours(1));
    let response = post_json_admin(app, "/api/v1/admin/flash-sales", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_rejects_flash_price_above_original(pool: PgPool) {
    let now = test_now();
    let app = common::build_test_app(pool, Arc::new(FixedClock::new(now)));

    let mut body = create_body(now + Duration::hours(1), now + Duration::hours(2));
    body["offers"][0]["flash_price_cents"] = json!(5999);
    let response = post_json_admin(app, "/api/v1/admin/flash-sales", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_rejects_zero_stock_offer(pool: PgPool) {
    let now = test_now();
    let app = common::build_test_app(pool, Arc::new(FixedClock::new(now)));

    let mut body = create_body(now + Duration::hours(1), now + Duration::hours(2));
    body["offers"][0]["total_stock"] = json!(0);
    let response = post_json_admin(app, "/api/v1/admin/flash-sales", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_rejects_unknown_time_slot(pool: PgPool) {
    let now = test_now();
    let app = common::build_test_app(pool, Arc::new(FixedClock::new(now)));

    let mut body = create_body(now + Duration::hours(1), now + Duration::hours(2));
    body["time_slot"] = json!("17:30-19:45");
    let response = post_json_admin(app, "/api/v1/admin/flash-sales", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_rejects_empty_offer_list(pool: PgPool) {
    let now = test_now();
    let app = common::build_test_app(pool, Arc::new(FixedClock::new(now)));

    let mut body = create_body(now + Duration::hours(1), now + Duration::hours(2));
    body["offers"] = json!([]);
    let response = post_json_admin(app, "/api/v1/admin/flash-sales", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_rejects_variant_missing_from_catalog(pool: PgPool) {
    let now = test_now();
    // Only p-100/v-1 exists; the second offer references an unknown variant.
    let catalog = StaticCatalog::default().with_variant("p-100", "v-1", 4999);
    let app = common::build_test_app_with_catalog(
        pool.clone(),
        Arc::new(FixedClock::new(now)),
        Arc::new(catalog),
    );

    let mut body = create_body(now + Duration::hours(1), now + Duration::hours(2));
    body["offers"]
        .as_array_mut()
        .unwrap()
        .push(json!({
            "product_id": "p-200",
            "variant_id": "v-ghost",
            "original_price_cents": 1999,
            "flash_price_cents": 999,
            "total_stock": 5,
            "max_per_order": 2,
            "badge": null
        }));
    let response = post_json_admin(app.clone(), "/api/v1/admin/flash-sales", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // A rejected creation must leave nothing behind.
    let json = body_json(get(app, "/api/v1/flash-sales/upcoming").await).await;
    assert!(json["data"].as_array().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Update metadata
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn update_metadata_changes_name_and_description(pool: PgPool) {
    let now = test_now();
    let (sale, _) = seed_sale(&pool, now + Duration::hours(1), now + Duration::hours(2)).await;
    let app = common::build_test_app(pool, Arc::new(FixedClock::new(now)));

    let response = patch_json_admin(
        app,
        &format!("/api/v1/admin/flash-sales/{}", sale.id),
        json!({ "name": "Renamed sale", "description": "fresh copy" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Renamed sale");
    assert_eq!(json["data"]["description"], "fresh copy");
    // Window is immutable through this path.
    let start: chrono::DateTime<chrono::Utc> =
        json["data"]["start_time"].as_str().unwrap().parse().unwrap();
    assert_eq!(start, sale.start_time);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn update_unknown_sale_is_not_found(pool: PgPool) {
    let app = common::build_test_app(pool, Arc::new(FixedClock::new(test_now())));
    let response = patch_json_admin(
        app,
        "/api/v1/admin/flash-sales/987654",
        json!({ "name": "whatever" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Force-close
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn force_close_ends_sale_and_blocks_allocation(pool: PgPool) {
    let now = test_now();
    let (sale, offers) = seed_sale(&pool, now - Duration::hours(1), now + Duration::hours(1)).await;
    let offer = &offers[0];
    let app = common::build_test_app(pool.clone(), Arc::new(FixedClock::new(now)));

    let response = post_json_admin(
        app.clone(),
        &format!("/api/v1/admin/flash-sales/{}/close", sale.id),
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Once closed, allocation against its offers is a window rejection.
    let response = post_json(
        app.clone(),
        &format!("/api/v1/flash-sales/offers/{}/allocate", offer.id),
        json!({ "quantity": 1, "idempotency_key": "after-close" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::GONE);
    assert_eq!(body_json(response).await["code"], "OFFER_ENDED");

    // Closing an already-ended sale conflicts.
    let response = post_json_admin(
        app,
        &format!("/api/v1/admin/flash-sales/{}/close", sale.id),
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn force_close_unknown_sale_is_not_found(pool: PgPool) {
    let app = common::build_test_app(pool, Arc::new(FixedClock::new(test_now())));
    let response =
        post_json_admin(app, "/api/v1/admin/flash-sales/31337/close", json!({})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Restock
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn restock_adds_stock(pool: PgPool) {
    let now = test_now();
    let (_, offers) = seed_sale(&pool, now - Duration::hours(1), now + Duration::hours(1)).await;
    let offer = &offers[0];
    let app = common::build_test_app(pool, Arc::new(FixedClock::new(now)));

    let response = post_json_admin(
        app,
        &format!("/api/v1/admin/offers/{}/restock", offer.id),
        json!({ "add_stock": 5 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["total_stock"], 15);
    assert_eq!(json["data"]["sold_count"], 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn restock_releases_sold_units(pool: PgPool) {
    let now = test_now();
    let (_, offers) = seed_sale(&pool, now - Duration::hours(1), now + Duration::hours(1)).await;
    let offer = &offers[0];
    let app = common::build_test_app(pool, Arc::new(FixedClock::new(now)));

    let response = post_json(
        app.clone(),
        &format!("/api/v1/flash-sales/offers/{}/allocate", offer.id),
        json!({ "quantity": 4, "idempotency_key": "to-be-refunded" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // A refund of 2 units hands them back to the pool.
    let response = post_json_admin(
        app,
        &format!("/api/v1/admin/offers/{}/restock", offer.id),
        json!({ "release_sold": 2 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["sold_count"], 2);
    assert_eq!(json["data"]["total_stock"], 10);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn releasing_more_than_sold_is_rejected(pool: PgPool) {
    let now = test_now();
    let (_, offers) = seed_sale(&pool, now - Duration::hours(1), now + Duration::hours(1)).await;
    let offer = &offers[0];
    let app = common::build_test_app(pool.clone(), Arc::new(FixedClock::new(now)));

    let response = post_json_admin(
        app,
        &format!("/api/v1/admin/offers/{}/restock", offer.id),
        json!({ "release_sold": 1 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn restock_rejects_negative_and_empty_adjustments(pool: PgPool) {
    let now = test_now();
    let (_, offers) = seed_sale(&pool, now - Duration::hours(1), now + Duration::hours(1)).await;
    let offer = &offers[0];
    let app = common::build_test_app(pool, Arc::new(FixedClock::new(now)));
    let uri = format!("/api/v1/admin/offers/{}/restock", offer.id);

    let response = post_json_admin(app.clone(), &uri, json!({ "add_stock": -3 })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json_admin(app, &uri, json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn restock_unknown_offer_is_not_found(pool: PgPool) {
    let app = common::build_test_app(pool, Arc::new(FixedClock::new(test_now())));
    let response = post_json_admin(
        app,
        "/api/v1/admin/offers/555555/restock",
        json!({ "add_stock": 1 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn restocked_units_become_allocatable(pool: PgPool) {
    let now = test_now();
    let (_, offers) =
        seed_sale_with_offer(&pool, now - Duration::hours(1), now + Duration::hours(1), 2, 5).await;
    let offer = &offers[0];
    let app = common::build_test_app(pool, Arc::new(FixedClock::new(now)));
    let allocate_uri = format!("/api/v1/flash-sales/offers/{}/allocate", offer.id);

    let response = post_json(
        app.clone(),
        &allocate_uri,
        json!({ "quantity": 2, "idempotency_key": "drain" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = post_json(
        app.clone(),
        &allocate_uri,
        json!({ "quantity": 1, "idempotency_key": "blocked" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = post_json_admin(
        app.clone(),
        &format!("/api/v1/admin/offers/{}/restock", offer.id),
        json!({ "add_stock": 3 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_json(
        app,
        &allocate_uri,
        json!({ "quantity": 3, "idempotency_key": "unblocked" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}
