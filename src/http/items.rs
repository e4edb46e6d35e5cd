use axum::Json;
use axum::extract::{Path, Query, State};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::model::{Booking, BookingStatus, DateRange, ItemId, ItemInfo, UserId};

use super::error::MSG_DATES_REQUIRED;
use super::{ApiError, AppState, parse_item_id, parse_range};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    start_date: Option<String>,
    end_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub available: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookedRange {
    pub start_date: String,
    pub end_date: String,
}

impl From<DateRange> for BookedRange {
    fn from(r: DateRange) -> Self {
        Self {
            start_date: r.start.to_string(),
            end_date: r.end.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookedDatesResponse {
    pub booked_dates: Vec<BookedRange>,
}

/// Calendar entry for one active booking on an item.
#[derive(Debug, Serialize)]
pub struct ItemBooking {
    pub id: Ulid,
    pub start_date: String,
    pub end_date: String,
    pub status: BookingStatus,
}

impl From<Booking> for ItemBooking {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            start_date: b.range.start.to_string(),
            end_date: b.range.end.to_string(),
            status: b.status,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterItemRequest {
    pub id: ItemId,
    pub owner_id: UserId,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub id: ItemId,
    pub owner_id: UserId,
    pub name: Option<String>,
}

impl From<ItemInfo> for ItemResponse {
    fn from(i: ItemInfo) -> Self {
        Self {
            id: i.id,
            owner_id: i.owner_id,
            name: i.name,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// GET /items/{id}/availability?startDate=&endDate=
pub async fn availability(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let item_id = parse_item_id(&id)?;
    let (Some(start), Some(end)) = (non_empty(query.start_date), non_empty(query.end_date)) else {
        return Err(ApiError::bad_request(MSG_DATES_REQUIRED));
    };
    let range = parse_range(&start, &end)?;
    let available = state.engine.is_available(item_id, range).await?;
    Ok(Json(AvailabilityResponse { available }))
}

/// GET /items/{id}/bookedDates
pub async fn booked_dates(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BookedDatesResponse>, ApiError> {
    let item_id = parse_item_id(&id)?;
    let ranges = state.engine.booked_dates(item_id).await;
    Ok(Json(BookedDatesResponse {
        booked_dates: ranges.into_iter().map(BookedRange::from).collect(),
    }))
}

/// GET /items/{id}/bookings
pub async fn item_bookings(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ItemBooking>>, ApiError> {
    let item_id = parse_item_id(&id)?;
    let bookings = state.engine.item_bookings(item_id).await;
    Ok(Json(bookings.into_iter().map(ItemBooking::from).collect()))
}

/// POST /items
pub async fn register_item(
    State(state): State<AppState>,
    payload: Result<Json<RegisterItemRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ItemResponse>), ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let info = state
        .engine
        .register_item(req.id, req.owner_id, req.name)
        .await?;
    Ok((StatusCode::CREATED, Json(info.into())))
}

/// GET /items
pub async fn list_items(State(state): State<AppState>) -> Json<Vec<ItemResponse>> {
    let items = state.engine.list_items().await;
    Json(items.into_iter().map(ItemResponse::from).collect())
}

/// GET /items/{id}
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ItemResponse>, ApiError> {
    let item_id = parse_item_id(&id)?;
    let info = state
        .engine
        .get_item_info(item_id)
        .await
        .ok_or(crate::engine::BookingError::ItemNotFound(item_id))?;
    Ok(Json(info.into()))
}
