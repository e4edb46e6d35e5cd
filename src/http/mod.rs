//! HTTP surface of the booking engine.
//!
//! Handlers are thin: they parse the request, call one engine operation and
//! shape the JSON reply. Every error leaves as `{ "error": message }`.

mod bookings;
mod error;
mod items;

pub use error::ApiError;

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{delete, get};
use axum::{Json, Router};
use chrono::{DateTime, NaiveDate};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use crate::auth::{IdentityProvider, bearer_token};
use crate::engine::{BookingError, Engine};
use crate::model::{DateRange, ItemId, UserId};
use crate::observability;

use error::MSG_END_BEFORE_START;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(engine: Arc<Engine>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { engine, identity }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/session", delete(logout))
        .route("/items", get(items::list_items).post(items::register_item))
        .route("/items/{id}", get(items::get_item))
        .route("/items/{id}/availability", get(items::availability))
        .route("/items/{id}/bookedDates", get(items::booked_dates))
        .route("/items/{id}/bookings", get(items::item_bookings))
        .route(
            "/bookings",
            get(bookings::my_bookings).post(bookings::create_booking),
        )
        .route("/bookings/owner", get(bookings::owner_bookings))
        .route(
            "/bookings/{id}",
            get(bookings::get_booking).delete(bookings::cancel_booking),
        )
        .layer(middleware::from_fn(track_requests))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// DELETE /session: close the caller's session; the token stops working.
async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    if let Some(token) = request_token(&headers) {
        state.identity.revoke(token).await;
    }
    tracing::info!("user {user} logged out");
    Ok(Json(json!({ "message": "Logged out" })))
}

/// Request counter and latency histogram, labelled by route template.
async fn track_requests(req: Request, next: Next) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());
    let start = Instant::now();
    let response = next.run(req).await;

    metrics::histogram!(observability::REQUEST_DURATION_SECONDS, "route" => route.clone())
        .record(start.elapsed().as_secs_f64());
    metrics::counter!(
        observability::REQUESTS_TOTAL,
        "route" => route,
        "status" => response.status().as_u16().to_string()
    )
    .increment(1);
    response
}

/// Resolve the caller from `Authorization: Bearer <token>`.
pub(crate) async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<UserId, ApiError> {
    let user = match request_token(headers) {
        Some(token) => state.identity.resolve(token).await,
        None => None,
    };
    user.ok_or_else(|| {
        metrics::counter!(observability::AUTH_FAILURES_TOTAL).increment(1);
        ApiError::unauthorized()
    })
}

fn request_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
}

pub(crate) fn parse_item_id(raw: &str) -> Result<ItemId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid item id: {raw}")))
}

/// Accepts `YYYY-MM-DD`, or an RFC 3339 timestamp whose calendar date is used.
pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, ApiError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| ApiError::bad_request(format!("Invalid date: {raw}")))
}

pub(crate) fn parse_range(start: &str, end: &str) -> Result<DateRange, ApiError> {
    let (start, end) = (parse_date(start)?, parse_date(end)?);
    DateRange::new(start, end)
        .ok_or_else(|| BookingError::InvalidRange(MSG_END_BEFORE_START.into()).into())
}
