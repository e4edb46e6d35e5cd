use ulid::Ulid;

use crate::model::*;
use crate::observability;

use super::availability::{booked_ranges, is_free};
use super::{BookingError, Engine};

impl Engine {
    /// Whether `range` is free on `item_id`.
    ///
    /// An unknown item has no bookings and is reported as available; only
    /// booking creation insists on the item existing. The creation limits on
    /// width and date bounds do not apply to queries.
    pub async fn is_available(&self, item_id: ItemId, range: DateRange) -> Result<bool, BookingError> {
        let Some(item) = self.store.get_item(&item_id) else {
            return Ok(true);
        };
        let guard = item.read().await;
        let free = is_free(&guard, &range);
        metrics::counter!(
            observability::AVAILABILITY_CHECKS_TOTAL,
            "result" => if free { "available" } else { "taken" }
        )
        .increment(1);
        Ok(free)
    }

    /// Active booking ranges for calendar display, ordered by start date.
    pub async fn booked_dates(&self, item_id: ItemId) -> Vec<DateRange> {
        let Some(item) = self.store.get_item(&item_id) else {
            return Vec::new();
        };
        let guard = item.read().await;
        booked_ranges(&guard)
    }

    /// Active bookings on an item, ordered by start date.
    pub async fn item_bookings(&self, item_id: ItemId) -> Vec<Booking> {
        let Some(item) = self.store.get_item(&item_id) else {
            return Vec::new();
        };
        let guard = item.read().await;
        guard.active().cloned().collect()
    }

    pub async fn get_booking(&self, id: Ulid) -> Result<Booking, BookingError> {
        let item_id = self
            .store
            .item_for_booking(&id)
            .ok_or(BookingError::BookingNotFound(id))?;
        let item = self
            .store
            .get_item(&item_id)
            .ok_or(BookingError::ItemNotFound(item_id))?;
        let guard = item.read().await;
        guard
            .get_booking(id)
            .cloned()
            .ok_or(BookingError::BookingNotFound(id))
    }

    pub async fn get_item_info(&self, id: ItemId) -> Option<ItemInfo> {
        let item = self.store.get_item(&id)?;
        let info = item.read().await.info();
        Some(info)
    }

    pub async fn list_items(&self) -> Vec<ItemInfo> {
        let mut items = Vec::with_capacity(self.store.item_count());
        for shared in self.store.items() {
            items.push(shared.read().await.info());
        }
        items.sort_by_key(|i| i.id);
        items
    }

    /// Every booking made by `renter_id`, any status, newest first.
    pub async fn bookings_for_renter(&self, renter_id: UserId) -> Vec<Booking> {
        let mut out = Vec::new();
        for shared in self.store.items() {
            let guard = shared.read().await;
            out.extend(guard.bookings.iter().filter(|b| b.renter_id == renter_id).cloned());
        }
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }

    /// Every booking on items owned by `owner_id`, any status, newest first.
    pub async fn bookings_for_owner(&self, owner_id: UserId) -> Vec<Booking> {
        let mut out = Vec::new();
        for shared in self.store.items() {
            let guard = shared.read().await;
            if guard.owner_id == owner_id {
                out.extend(guard.bookings.iter().cloned());
            }
        }
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }
}
