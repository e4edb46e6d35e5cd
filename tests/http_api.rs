use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{Value, json};
use ulid::Ulid;

use rentbook::auth::SessionStore;
use rentbook::engine::Engine;
use rentbook::http::{self, AppState};

const OWNER_TOKEN: &str = "owner-token";
const RENTER_TOKEN: &str = "renter-token";
const STRANGER_TOKEN: &str = "stranger-token";

// ── Test infrastructure ──────────────────────────────────────

async fn make_server() -> TestServer {
    let dir = std::env::temp_dir().join(format!("rentbook_http_test_{}", Ulid::new()));
    std::fs::create_dir_all(&dir).unwrap();
    let engine = Arc::new(Engine::new(dir.join("bookings.wal")).unwrap());
    engine
        .register_item(7, 1, Some("Emerald gown".into()))
        .await
        .unwrap();

    let sessions = Arc::new(SessionStore::new());
    sessions.open_with_token(OWNER_TOKEN.into(), 1);
    sessions.open_with_token(RENTER_TOKEN.into(), 2);
    sessions.open_with_token(STRANGER_TOKEN.into(), 3);

    TestServer::new(http::router(AppState::new(engine, sessions)))
}

async fn availability(server: &TestServer, start: &str, end: &str) -> bool {
    let resp = server
        .get("/items/7/availability")
        .add_query_param("startDate", start)
        .add_query_param("endDate", end)
        .await;
    resp.assert_status(StatusCode::OK);
    resp.json::<Value>()["available"].as_bool().unwrap()
}

async fn book(server: &TestServer, token: &str, start: &str, end: &str) -> axum_test::TestResponse {
    server
        .post("/bookings")
        .authorization_bearer(token)
        .json(&json!({
            "dress_id": 7,
            "start_date": start,
            "end_date": end,
            "total_price": 120.0,
            "security_deposit": 50.0
        }))
        .await
}

fn error_of(resp: &axum_test::TestResponse) -> String {
    resp.json::<Value>()["error"].as_str().unwrap().to_string()
}

// ── Availability ─────────────────────────────────────────────

#[tokio::test]
async fn health_reports_ok() {
    let server = make_server().await;
    let resp = server.get("/health").await;
    resp.assert_status(StatusCode::OK);
    resp.assert_json(&json!({ "status": "ok" }));
}

#[tokio::test]
async fn availability_requires_both_dates() {
    let server = make_server().await;

    let resp = server
        .get("/items/7/availability")
        .add_query_param("startDate", "2024-03-01")
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);
    resp.assert_json(&json!({ "error": "Start date and end date are required" }));

    let resp = server
        .get("/items/7/availability")
        .add_query_param("startDate", "")
        .add_query_param("endDate", "2024-03-05")
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_of(&resp), "Start date and end date are required");
}

#[tokio::test]
async fn availability_rejects_bad_dates() {
    let server = make_server().await;

    let resp = server
        .get("/items/7/availability")
        .add_query_param("startDate", "not-a-date")
        .add_query_param("endDate", "2024-03-05")
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);

    let resp = server
        .get("/items/7/availability")
        .add_query_param("startDate", "2024-03-05")
        .add_query_param("endDate", "2024-03-05")
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_of(&resp), "End date must be after start date");
}

#[tokio::test]
async fn unknown_item_reads_as_free() {
    let server = make_server().await;
    let resp = server
        .get("/items/999/availability")
        .add_query_param("startDate", "2024-03-01")
        .add_query_param("endDate", "2024-03-05")
        .await;
    resp.assert_json(&json!({ "available": true }));

    let resp = server.get("/items/999/bookedDates").await;
    resp.assert_json(&json!({ "bookedDates": [] }));
}

#[tokio::test]
async fn wide_and_early_queries_answer() {
    let server = make_server().await;
    book(&server, RENTER_TOKEN, "2024-06-01", "2024-06-03")
        .await
        .assert_status(StatusCode::CREATED);

    let resp = server
        .get("/items/7/availability")
        .add_query_param("startDate", "2024-01-01")
        .add_query_param("endDate", "2025-06-01")
        .await;
    resp.assert_status(StatusCode::OK);
    resp.assert_json(&json!({ "available": false }));

    assert!(availability(&server, "1999-12-01", "1999-12-05").await);
    assert!(availability(&server, "2024-06-03", "2024-06-06").await);
    assert!(!availability(&server, "2024-06-02", "2024-06-04").await);
}

// ── Booking creation ─────────────────────────────────────────

#[tokio::test]
async fn item_seven_end_to_end() {
    let server = make_server().await;

    assert!(availability(&server, "2024-03-01", "2024-03-05").await);

    let resp = book(&server, RENTER_TOKEN, "2024-03-01", "2024-03-05").await;
    resp.assert_status(StatusCode::CREATED);
    let body: Value = resp.json();
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["message"], json!("Booking created successfully"));
    assert!(body["bookingId"].as_str().unwrap().parse::<Ulid>().is_ok());

    assert!(!availability(&server, "2024-03-03", "2024-03-07").await);
    assert!(availability(&server, "2024-03-05", "2024-03-08").await);

    let resp = server.get("/items/7/bookedDates").await;
    resp.assert_status(StatusCode::OK);
    resp.assert_json(&json!({
        "bookedDates": [{ "startDate": "2024-03-01", "endDate": "2024-03-05" }]
    }));

    let resp = book(&server, STRANGER_TOKEN, "2024-03-02", "2024-03-04").await;
    resp.assert_status(StatusCode::CONFLICT);
    resp.assert_json(&json!({ "error": "Dates no longer available" }));
}

#[tokio::test]
async fn create_rejects_inverted_range() {
    let server = make_server().await;
    let resp = book(&server, RENTER_TOKEN, "2024-03-05", "2024-03-01").await;
    resp.assert_status(StatusCode::BAD_REQUEST);
    resp.assert_json(&json!({ "error": "End date must be after start date" }));

    let resp = server.get("/items/7/bookedDates").await;
    resp.assert_json(&json!({ "bookedDates": [] }));
}

#[tokio::test]
async fn create_requires_session() {
    let server = make_server().await;

    let resp = server
        .post("/bookings")
        .json(&json!({
            "dress_id": 7,
            "start_date": "2024-03-01",
            "end_date": "2024-03-05",
            "total_price": 120.0,
            "security_deposit": 50.0
        }))
        .await;
    resp.assert_status(StatusCode::UNAUTHORIZED);
    resp.assert_json(&json!({ "error": "Not authenticated" }));

    let resp = book(&server, "forged", "2024-03-01", "2024-03-05").await;
    resp.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_maps_client_errors() {
    let server = make_server().await;

    let resp = book(&server, OWNER_TOKEN, "2024-03-01", "2024-03-05").await;
    resp.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_of(&resp), "Cannot book your own item");

    let resp = server
        .post("/bookings")
        .authorization_bearer(RENTER_TOKEN)
        .json(&json!({
            "dress_id": 404,
            "start_date": "2024-03-01",
            "end_date": "2024-03-05",
            "total_price": 10.0,
            "security_deposit": 0.0
        }))
        .await;
    resp.assert_status(StatusCode::NOT_FOUND);

    let resp = server
        .post("/bookings")
        .authorization_bearer(RENTER_TOKEN)
        .json(&json!({
            "dress_id": 7,
            "start_date": "2024-03-01",
            "end_date": "2024-03-05",
            "total_price": -10.0,
            "security_deposit": 0.0
        }))
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);

    let resp = server
        .post("/bookings")
        .authorization_bearer(RENTER_TOKEN)
        .json(&json!({ "dress_id": 7 }))
        .await;
    resp.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    resp.assert_json(&json!({ "error": "Failed to create booking" }));

    let resp = server
        .post("/bookings")
        .authorization_bearer(RENTER_TOKEN)
        .json(&json!({
            "dress_id": 7,
            "start_date": "March 1st",
            "end_date": "2024-03-05",
            "total_price": 100.0
        }))
        .await;
    resp.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_of(&resp), "Failed to create booking");
}

#[tokio::test]
async fn racing_requests_book_once() {
    let server = make_server().await;

    let attempts = (0..8).map(|_| book(&server, RENTER_TOKEN, "2024-03-01", "2024-03-05"));
    let mut created = 0;
    let mut conflicted = 0;
    for resp in futures::future::join_all(attempts).await {
        match resp.status_code() {
            StatusCode::CREATED => created += 1,
            StatusCode::CONFLICT => conflicted += 1,
            other => panic!("unexpected status {other}"),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(conflicted, 7);
}

// ── Listings and cancellation ────────────────────────────────

#[tokio::test]
async fn booking_visible_to_renter_and_owner_only() {
    let server = make_server().await;
    let resp = book(&server, RENTER_TOKEN, "2024-03-01", "2024-03-05").await;
    let id = resp.json::<Value>()["bookingId"].as_str().unwrap().to_string();

    let resp = server
        .get(&format!("/bookings/{id}"))
        .authorization_bearer(RENTER_TOKEN)
        .await;
    resp.assert_status(StatusCode::OK);
    let body: Value = resp.json();
    assert_eq!(body["dress_id"], json!(7));
    assert_eq!(body["total_days"], json!(4));
    assert_eq!(body["status"], json!("active"));

    server
        .get(&format!("/bookings/{id}"))
        .authorization_bearer(OWNER_TOKEN)
        .await
        .assert_status(StatusCode::OK);
    server
        .get(&format!("/bookings/{id}"))
        .authorization_bearer(STRANGER_TOKEN)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    server
        .get(&format!("/bookings/{}", Ulid::new()))
        .authorization_bearer(RENTER_TOKEN)
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .get("/bookings/garbage")
        .authorization_bearer(RENTER_TOKEN)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn renter_and_owner_listings() {
    let server = make_server().await;
    book(&server, RENTER_TOKEN, "2024-03-01", "2024-03-05")
        .await
        .assert_status(StatusCode::CREATED);

    let mine: Value = server
        .get("/bookings")
        .authorization_bearer(RENTER_TOKEN)
        .await
        .json();
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let owned: Value = server
        .get("/bookings/owner")
        .authorization_bearer(OWNER_TOKEN)
        .await
        .json();
    assert_eq!(owned.as_array().unwrap().len(), 1);
    assert_eq!(owned[0]["renter_id"], json!(2));

    let none: Value = server
        .get("/bookings")
        .authorization_bearer(STRANGER_TOKEN)
        .await
        .json();
    assert!(none.as_array().unwrap().is_empty());

    let calendar: Value = server.get("/items/7/bookings").await.json();
    assert_eq!(calendar[0]["start_date"], json!("2024-03-01"));
    assert_eq!(calendar[0]["status"], json!("active"));
}

#[tokio::test]
async fn cancel_frees_dates() {
    let server = make_server().await;
    let resp = book(&server, RENTER_TOKEN, "2024-03-01", "2024-03-05").await;
    let id = resp.json::<Value>()["bookingId"].as_str().unwrap().to_string();

    server
        .delete(&format!("/bookings/{id}"))
        .authorization_bearer(STRANGER_TOKEN)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let resp = server
        .delete(&format!("/bookings/{id}"))
        .authorization_bearer(RENTER_TOKEN)
        .await;
    resp.assert_status(StatusCode::OK);
    resp.assert_json(&json!({ "message": "Booking cancelled" }));

    assert!(availability(&server, "2024-03-01", "2024-03-05").await);
    server
        .delete(&format!("/bookings/{id}"))
        .authorization_bearer(RENTER_TOKEN)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

// ── Items ────────────────────────────────────────────────────

#[tokio::test]
async fn register_and_fetch_items() {
    let server = make_server().await;

    let resp = server
        .post("/items")
        .json(&json!({ "id": 8, "owner_id": 3, "name": "Velvet coat" }))
        .await;
    resp.assert_status(StatusCode::CREATED);
    resp.assert_json(&json!({ "id": 8, "owner_id": 3, "name": "Velvet coat" }));

    server
        .post("/items")
        .json(&json!({ "id": 8, "owner_id": 3 }))
        .await
        .assert_status(StatusCode::CONFLICT);

    let items: Value = server.get("/items").await.json();
    assert_eq!(items.as_array().unwrap().len(), 2);

    server.get("/items/8").await.assert_status(StatusCode::OK);
    server.get("/items/9").await.assert_status(StatusCode::NOT_FOUND);
    server.get("/items/nine").await.assert_status(StatusCode::BAD_REQUEST);
}

// ── Sessions ─────────────────────────────────────────────────

#[tokio::test]
async fn logout_ends_session() {
    let server = make_server().await;

    server
        .delete("/session")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let resp = server.delete("/session").authorization_bearer(RENTER_TOKEN).await;
    resp.assert_status(StatusCode::OK);
    resp.assert_json(&json!({ "message": "Logged out" }));

    let resp = book(&server, RENTER_TOKEN, "2024-03-01", "2024-03-05").await;
    resp.assert_status(StatusCode::UNAUTHORIZED);
    server
        .delete("/session")
        .authorization_bearer(RENTER_TOKEN)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    // Other sessions are untouched.
    book(&server, STRANGER_TOKEN, "2024-03-01", "2024-03-05")
        .await
        .assert_status(StatusCode::CREATED);
}
