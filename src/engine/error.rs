use ulid::Ulid;

use crate::model::ItemId;

#[derive(Debug)]
pub enum BookingError {
    /// Start date not strictly before end date, or a date that does not parse.
    InvalidRange(String),
    InvalidAmount(&'static str),
    /// Range overlaps the given active booking.
    Conflict(Ulid),
    ItemNotFound(ItemId),
    BookingNotFound(Ulid),
    ItemAlreadyExists(ItemId),
    OwnItem(ItemId),
    Forbidden,
    InvalidTransition(Ulid),
    LimitExceeded(&'static str),
    Storage(String),
}

impl std::fmt::Display for BookingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingError::InvalidRange(msg) => write!(f, "invalid range: {msg}"),
            BookingError::InvalidAmount(field) => {
                write!(f, "{field} must be a non-negative amount")
            }
            BookingError::Conflict(id) => write!(f, "dates overlap booking {id}"),
            BookingError::ItemNotFound(id) => write!(f, "item not found: {id}"),
            BookingError::BookingNotFound(id) => write!(f, "booking not found: {id}"),
            BookingError::ItemAlreadyExists(id) => write!(f, "item already exists: {id}"),
            BookingError::OwnItem(id) => write!(f, "cannot book your own item {id}"),
            BookingError::Forbidden => write!(f, "not authorized"),
            BookingError::InvalidTransition(id) => {
                write!(f, "booking {id} is already cancelled")
            }
            BookingError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            BookingError::Storage(e) => write!(f, "storage error: {e}"),
        }
    }
}

impl std::error::Error for BookingError {}
