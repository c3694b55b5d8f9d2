use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use marquee_api::{app, AppState};
use marquee_core::{BookingService, InMemorySeatInventory, MemoryBookingStore};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn test_app() -> Router {
    let service = Arc::new(BookingService::new(
        Arc::new(InMemorySeatInventory::new()),
        Arc::new(MemoryBookingStore::new()),
        3,
    ));
    app(AppState { service })
}

async fn post_booking(app: &Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/booking")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn get_last_booking(app: &Router) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/booking/last")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_booking_scenario() {
    let app = test_app();

    // First booking goes through and becomes the latest.
    let (status, body) = post_booking(
        &app,
        json!({ "movie": "m1", "slot": "2024-01-01T18:00", "seats": ["A1", "A2"] }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Booking saved successfully");

    let (status, body) = get_last_booking(&app).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["movie"], "m1");
    assert_eq!(body["slot"], "2024-01-01T18:00");
    assert_eq!(body["seats"], json!(["A1", "A2"]));
    assert!(body["id"].is_string());
    assert!(body["createdAt"].is_string());

    // Overlapping request is rejected with the conflicting seat.
    let (status, body) = post_booking(
        &app,
        json!({ "movie": "m1", "slot": "2024-01-01T18:00", "seats": ["A2", "A3"] }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["seats"], json!(["A2"]));

    // The rejected request claimed nothing, so A3 is still free.
    let (status, _) = post_booking(
        &app,
        json!({ "movie": "m1", "slot": "2024-01-01T18:00", "seats": ["A3"] }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_validation_errors_list_every_field() {
    let app = test_app();

    let (status, body) = post_booking(&app, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let errors = body["errors"].as_array().unwrap();
    let fields: Vec<&str> = errors
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["movie", "slot", "seats"]);
}

#[tokio::test]
async fn test_empty_seat_list_is_rejected() {
    let app = test_app();

    let (status, body) = post_booking(
        &app,
        json!({ "movie": "m1", "slot": "2024-01-01T18:00", "seats": [] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "seats");
}

#[tokio::test]
async fn test_last_booking_on_empty_store_is_404() {
    let app = test_app();

    let (status, _) = get_last_booking(&app).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_slots_do_not_share_inventory() {
    let app = test_app();

    let (status, _) = post_booking(
        &app,
        json!({ "movie": "m1", "slot": "2024-01-01T18:00", "seats": ["A1"] }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = post_booking(
        &app,
        json!({ "movie": "m1", "slot": "2024-01-01T21:00", "seats": ["A1"] }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}
