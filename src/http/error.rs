use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::engine::BookingError;

pub const MSG_DATES_REQUIRED: &str = "Start date and end date are required";
pub const MSG_END_BEFORE_START: &str = "End date must be after start date";
pub const MSG_DATES_TAKEN: &str = "Dates no longer available";
pub const MSG_CREATE_FAILED: &str = "Failed to create booking";
pub const MSG_SERVER_ERROR: &str = "Server error";
pub const MSG_NOT_AUTHENTICATED: &str = "Not authenticated";

/// An HTTP error answered as `{ "error": message }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, MSG_NOT_AUTHENTICATED)
    }

    /// The generic 500 of booking creation. `detail` is logged, never sent.
    pub fn create_failed(detail: impl std::fmt::Display) -> Self {
        tracing::warn!("booking creation failed: {detail}");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, MSG_CREATE_FAILED)
    }

    /// Booking creation keeps the client-visible classes (400/403/404/409)
    /// and collapses everything else into one generic 500.
    pub fn from_create(e: BookingError) -> Self {
        match e {
            BookingError::Storage(_) => Self::create_failed(e),
            other => other.into(),
        }
    }
}

impl From<BookingError> for ApiError {
    fn from(e: BookingError) -> Self {
        match e {
            BookingError::InvalidRange(msg) => Self::bad_request(msg),
            BookingError::InvalidAmount(_) | BookingError::LimitExceeded(_) => {
                Self::bad_request(e.to_string())
            }
            BookingError::Conflict(_) => Self::new(StatusCode::CONFLICT, MSG_DATES_TAKEN),
            BookingError::ItemNotFound(_) => Self::new(StatusCode::NOT_FOUND, "Item not found"),
            BookingError::BookingNotFound(_) => {
                Self::new(StatusCode::NOT_FOUND, "Booking not found")
            }
            BookingError::ItemAlreadyExists(_) => {
                Self::new(StatusCode::CONFLICT, "Item already exists")
            }
            BookingError::OwnItem(_) => Self::bad_request("Cannot book your own item"),
            BookingError::Forbidden => Self::new(StatusCode::FORBIDDEN, "Not authorized"),
            BookingError::InvalidTransition(_) => Self::bad_request("Booking already cancelled"),
            BookingError::Storage(_) => {
                tracing::error!("request failed: {e}");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, MSG_SERVER_ERROR)
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}
