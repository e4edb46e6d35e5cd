//! Hard limits guarding the engine against runaway input.

/// Max registered items.
pub const MAX_ITEMS: usize = 100_000;

/// Max bookings (active or cancelled) recorded on one item.
pub const MAX_BOOKINGS_PER_ITEM: usize = 10_000;

/// Max item name length in bytes.
pub const MAX_NAME_LEN: usize = 256;

/// Longest bookable range, in days.
pub const MAX_BOOKING_DAYS: i64 = 366;

/// Earliest and latest dates accepted in any range (inclusive bounds, `YYYY-MM-DD`).
pub const MIN_VALID_DATE: (i32, u32, u32) = (2000, 1, 1);
pub const MAX_VALID_DATE: (i32, u32, u32) = (2100, 12, 31);

/// Largest accepted monetary amount.
pub const MAX_AMOUNT: f64 = 1_000_000_000.0;
