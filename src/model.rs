use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Identifier of a bookable item (a dress, in the storefront).
pub type ItemId = i64;

/// Identifier of a user, as yielded by the identity provider.
pub type UserId = i64;

/// Half-open date range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Returns `None` unless `start < end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    /// Number of nights covered.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Active,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Ulid,
    pub item_id: ItemId,
    pub renter_id: UserId,
    pub range: DateRange,
    pub total_price: f64,
    pub security_deposit: f64,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn is_active(&self) -> bool {
        self.status == BookingStatus::Active
    }
}

/// Input to the booking creator. The store assigns id, status and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub item_id: ItemId,
    pub renter_id: UserId,
    pub range: DateRange,
    pub total_price: f64,
    pub security_deposit: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemInfo {
    pub id: ItemId,
    pub owner_id: UserId,
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ItemState {
    pub id: ItemId,
    pub owner_id: UserId,
    pub name: Option<String>,
    /// Every booking ever made on this item, sorted by `range.start`.
    /// Cancelled bookings stay here; they are skipped by `overlapping`.
    pub bookings: Vec<Booking>,
}

impl ItemState {
    pub fn new(id: ItemId, owner_id: UserId, name: Option<String>) -> Self {
        Self {
            id,
            owner_id,
            name,
            bookings: Vec::new(),
        }
    }

    pub fn info(&self) -> ItemInfo {
        ItemInfo {
            id: self.id,
            owner_id: self.owner_id,
            name: self.name.clone(),
        }
    }

    /// Insert booking maintaining sort order by range start.
    pub fn insert_booking(&mut self, booking: Booking) {
        let pos = self
            .bookings
            .partition_point(|b| b.range.start <= booking.range.start);
        self.bookings.insert(pos, booking);
    }

    pub fn get_booking(&self, id: Ulid) -> Option<&Booking> {
        self.bookings.iter().find(|b| b.id == id)
    }

    /// Flip a booking to cancelled. Returns the updated booking.
    pub fn cancel_booking(&mut self, id: Ulid) -> Option<&Booking> {
        let booking = self.bookings.iter_mut().find(|b| b.id == id)?;
        booking.status = BookingStatus::Cancelled;
        Some(booking)
    }

    pub fn active(&self) -> impl Iterator<Item = &Booking> {
        self.bookings.iter().filter(|b| b.is_active())
    }

    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    /// Active bookings whose range overlaps `query`.
    /// Uses binary search to skip bookings starting at or after `query.end`.
    pub fn overlapping(&self, query: &DateRange) -> impl Iterator<Item = &Booking> {
        let right_bound = self
            .bookings
            .partition_point(|b| b.range.start < query.end);
        self.bookings[..right_bound]
            .iter()
            .filter(move |b| b.is_active() && b.range.end > query.start)
    }
}

/// The event types. This is the WAL record format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    ItemRegistered {
        id: ItemId,
        owner_id: UserId,
        name: Option<String>,
    },
    BookingCreated {
        booking: Booking,
    },
    BookingCancelled {
        id: Ulid,
        item_id: ItemId,
    },
}

impl Event {
    pub fn item_id(&self) -> ItemId {
        match self {
            Event::ItemRegistered { id, .. } => *id,
            Event::BookingCreated { booking } => booking.item_id,
            Event::BookingCancelled { item_id, .. } => *item_id,
        }
    }
}

#[cfg(test)]
pub(crate) fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[cfg(test)]
pub(crate) fn range(start: &str, end: &str) -> DateRange {
    DateRange::new(date(start), date(end)).unwrap()
}
