use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::RwLock;
use ulid::Ulid;

use crate::model::*;

use super::SharedItemState;

/// In-memory booking store: one lock-guarded state per item plus a
/// booking id → item id index.
pub struct ItemStore {
    items: DashMap<ItemId, SharedItemState>,
    booking_to_item: DashMap<Ulid, ItemId>,
}

impl Default for ItemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemStore {
    pub fn new() -> Self {
        Self {
            items: DashMap::new(),
            booking_to_item: DashMap::new(),
        }
    }

    // ── Items ────────────────────────────────────────────────

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn contains_item(&self, id: &ItemId) -> bool {
        self.items.contains_key(id)
    }

    pub fn get_item(&self, id: &ItemId) -> Option<SharedItemState> {
        self.items.get(id).map(|e| e.value().clone())
    }

    pub fn insert_item(&self, state: ItemState) {
        self.items.insert(state.id, Arc::new(RwLock::new(state)));
    }

    pub fn items(&self) -> Vec<SharedItemState> {
        self.items.iter().map(|e| e.value().clone()).collect()
    }

    // ── Booking index ────────────────────────────────────────

    pub fn item_for_booking(&self, booking_id: &Ulid) -> Option<ItemId> {
        self.booking_to_item.get(booking_id).map(|e| *e.value())
    }

    // ── Event application ────────────────────────────────────

    /// Apply a booking event to an item. The caller holds the item's write lock.
    /// `ItemRegistered` is handled at the map level by `insert_item`.
    pub fn apply_event(&self, item: &mut ItemState, event: &Event) {
        match event {
            Event::BookingCreated { booking } => {
                self.booking_to_item.insert(booking.id, booking.item_id);
                item.insert_booking(booking.clone());
            }
            Event::BookingCancelled { id, .. } => {
                item.cancel_booking(*id);
            }
            Event::ItemRegistered { .. } => {}
        }
    }
}
