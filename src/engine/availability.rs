use crate::model::*;

// ── Availability predicate ───────────────────────────────────────

/// True iff no active booking on `item` overlaps `query`.
///
/// Overlap is half-open: a booking ending on `query.start`, or starting on
/// `query.end`, leaves the range free.
pub fn is_free(item: &ItemState, query: &DateRange) -> bool {
    item.overlapping(query).next().is_none()
}

/// Active booking ranges on `item`, ordered by start date.
pub fn booked_ranges(item: &ItemState) -> Vec<DateRange> {
    item.active().map(|b| b.range).collect()
}
