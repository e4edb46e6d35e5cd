use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use ulid::Ulid;

use crate::engine::BookingError;
use crate::model::{Booking, BookingStatus, DateRange, ItemId, NewBooking, UserId};

use super::error::MSG_END_BEFORE_START;
use super::{ApiError, AppState, authenticate, parse_date};

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub dress_id: ItemId,
    pub start_date: String,
    pub end_date: String,
    pub total_price: f64,
    #[serde(default)]
    pub security_deposit: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingResponse {
    pub success: bool,
    pub booking_id: Ulid,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: Ulid,
    pub dress_id: ItemId,
    pub renter_id: UserId,
    pub start_date: String,
    pub end_date: String,
    pub total_days: i64,
    pub total_price: f64,
    pub security_deposit: f64,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            dress_id: b.item_id,
            renter_id: b.renter_id,
            start_date: b.range.start.to_string(),
            end_date: b.range.end.to_string(),
            total_days: b.range.days(),
            total_price: b.total_price,
            security_deposit: b.security_deposit,
            status: b.status,
            created_at: b.created_at,
        }
    }
}

fn parse_booking_id(raw: &str) -> Result<Ulid, ApiError> {
    // An id that cannot exist is reported like one that does not.
    Ulid::from_string(raw).map_err(|_| BookingError::BookingNotFound(Ulid::nil()).into())
}

/// POST /bookings
pub async fn create_booking(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateBookingResponse>), ApiError> {
    let renter_id = authenticate(&state, &headers).await?;
    // Only an inverted range is reported back; other malformed input is a
    // generic creation failure.
    let Json(req) = payload.map_err(|e| ApiError::create_failed(e.body_text()))?;
    let start = parse_date(&req.start_date).map_err(|e| ApiError::create_failed(e.message))?;
    let end = parse_date(&req.end_date).map_err(|e| ApiError::create_failed(e.message))?;
    let range =
        DateRange::new(start, end).ok_or_else(|| ApiError::bad_request(MSG_END_BEFORE_START))?;

    let booking = state
        .engine
        .create_booking(NewBooking {
            item_id: req.dress_id,
            renter_id,
            range,
            total_price: req.total_price,
            security_deposit: req.security_deposit,
        })
        .await
        .map_err(ApiError::from_create)?;

    Ok((
        StatusCode::CREATED,
        Json(CreateBookingResponse {
            success: true,
            booking_id: booking.id,
            message: "Booking created successfully",
        }),
    ))
}

/// GET /bookings: the caller's bookings as renter.
pub async fn my_bookings(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<BookingResponse>>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let bookings = state.engine.bookings_for_renter(user).await;
    Ok(Json(bookings.into_iter().map(BookingResponse::from).collect()))
}

/// GET /bookings/owner: bookings on items the caller owns.
pub async fn owner_bookings(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<BookingResponse>>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let bookings = state.engine.bookings_for_owner(user).await;
    Ok(Json(bookings.into_iter().map(BookingResponse::from).collect()))
}

/// GET /bookings/{id}: visible to the renter and the item owner.
pub async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<BookingResponse>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let booking = state.engine.get_booking(parse_booking_id(&id)?).await?;
    if booking.renter_id != user {
        let owner = state
            .engine
            .get_item_info(booking.item_id)
            .await
            .map(|i| i.owner_id);
        if owner != Some(user) {
            return Err(BookingError::Forbidden.into());
        }
    }
    Ok(Json(booking.into()))
}

/// DELETE /bookings/{id}
pub async fn cancel_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    state
        .engine
        .cancel_booking(parse_booking_id(&id)?, user)
        .await?;
    Ok(Json(json!({ "message": "Booking cancelled" })))
}
