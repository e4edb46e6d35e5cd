use chrono::NaiveDate;

use crate::limits::*;
use crate::model::*;

use super::BookingError;

fn bound((y, m, d): (i32, u32, u32)) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

pub(crate) fn validate_range(range: &DateRange) -> Result<(), BookingError> {
    if range.start < bound(MIN_VALID_DATE) || range.end > bound(MAX_VALID_DATE) {
        return Err(BookingError::LimitExceeded("date out of range"));
    }
    if range.days() > MAX_BOOKING_DAYS {
        return Err(BookingError::LimitExceeded("range too wide"));
    }
    Ok(())
}

pub(crate) fn validate_amount(value: f64, field: &'static str) -> Result<(), BookingError> {
    if !value.is_finite() || value < 0.0 {
        return Err(BookingError::InvalidAmount(field));
    }
    if value > MAX_AMOUNT {
        return Err(BookingError::LimitExceeded("amount too large"));
    }
    Ok(())
}

/// Fails with the first active booking overlapping `range`.
/// Caller must hold the item's lock for the result to stay valid.
pub(crate) fn check_no_conflict(item: &ItemState, range: &DateRange) -> Result<(), BookingError> {
    match item.overlapping(range).next() {
        Some(existing) => Err(BookingError::Conflict(existing.id)),
        None => Ok(()),
    }
}
