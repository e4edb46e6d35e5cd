use chrono::Utc;
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;
use crate::observability;

use super::conflict::{check_no_conflict, validate_amount, validate_range};
use super::{BookingError, Engine, WalControl};

impl Engine {
    pub async fn register_item(
        &self,
        id: ItemId,
        owner_id: UserId,
        name: Option<String>,
    ) -> Result<ItemInfo, BookingError> {
        if let Some(ref n) = name
            && n.len() > MAX_NAME_LEN
        {
            return Err(BookingError::LimitExceeded("item name too long"));
        }
        let _gate = self.gate.read().await;
        let _registering = self.registration.lock().await;
        if self.store.item_count() >= MAX_ITEMS {
            return Err(BookingError::LimitExceeded("too many items"));
        }
        if self.store.contains_item(&id) {
            return Err(BookingError::ItemAlreadyExists(id));
        }

        let event = Event::ItemRegistered { id, owner_id, name: name.clone() };
        self.wal_append(&event).await?;
        let state = ItemState::new(id, owner_id, name);
        let info = state.info();
        self.store.insert_item(state);
        tracing::info!("registered item {id} for owner {owner_id}");
        Ok(info)
    }

    /// Create a booking if its range is still free.
    ///
    /// Validation runs before any lock is taken. The overlap check, the WAL
    /// append and the apply run under the item's write lock, so concurrent
    /// overlapping requests for one item are linearized and at most one wins.
    pub async fn create_booking(&self, new: NewBooking) -> Result<Booking, BookingError> {
        validate_range(&new.range)?;
        validate_amount(new.total_price, "total_price")?;
        validate_amount(new.security_deposit, "security_deposit")?;

        let _gate = self.gate.read().await;
        let item = self
            .store
            .get_item(&new.item_id)
            .ok_or(BookingError::ItemNotFound(new.item_id))?;
        let mut guard = item.write().await;
        if guard.owner_id == new.renter_id {
            return Err(BookingError::OwnItem(new.item_id));
        }
        if guard.bookings.len() >= MAX_BOOKINGS_PER_ITEM {
            return Err(BookingError::LimitExceeded("too many bookings on item"));
        }

        if let Err(e) = check_no_conflict(&guard, &new.range) {
            metrics::counter!(observability::BOOKING_CONFLICTS_TOTAL).increment(1);
            tracing::info!(
                "booking on item {} for [{}, {}) rejected: {e}",
                new.item_id,
                new.range.start,
                new.range.end
            );
            return Err(e);
        }

        let booking = Booking {
            id: Ulid::new(),
            item_id: new.item_id,
            renter_id: new.renter_id,
            range: new.range,
            total_price: new.total_price,
            security_deposit: new.security_deposit,
            status: BookingStatus::Active,
            created_at: Utc::now(),
        };
        let event = Event::BookingCreated { booking: booking.clone() };
        self.persist_and_apply(&mut guard, &event).await?;

        metrics::counter!(observability::BOOKINGS_CREATED_TOTAL).increment(1);
        tracing::info!(
            "booking {} created on item {} for [{}, {})",
            booking.id,
            booking.item_id,
            booking.range.start,
            booking.range.end
        );
        Ok(booking)
    }

    /// Move an active booking to cancelled. Only the renter or the item's
    /// owner may do so. The record is kept; it just stops counting.
    pub async fn cancel_booking(&self, id: Ulid, actor: UserId) -> Result<Booking, BookingError> {
        let _gate = self.gate.read().await;
        let mut guard = self.resolve_booking_write(&id).await?;
        let owner_id = guard.owner_id;
        let booking = guard
            .get_booking(id)
            .ok_or(BookingError::BookingNotFound(id))?;
        if actor != booking.renter_id && actor != owner_id {
            return Err(BookingError::Forbidden);
        }
        if !booking.is_active() {
            return Err(BookingError::InvalidTransition(id));
        }

        let event = Event::BookingCancelled { id, item_id: guard.id };
        self.persist_and_apply(&mut guard, &event).await?;
        metrics::counter!(observability::BOOKINGS_CANCELLED_TOTAL).increment(1);
        tracing::info!("booking {id} cancelled by user {actor}");

        guard
            .get_booking(id)
            .cloned()
            .ok_or(BookingError::BookingNotFound(id))
    }

    /// Rewrite the WAL with only the events needed to recreate current state.
    /// Cancelled bookings are kept, carrying their final status.
    pub async fn compact_wal(&self) -> Result<(), BookingError> {
        // Exclusive gate: no mutation can append between the snapshot and the swap.
        let _gate = self.gate.write().await;

        let mut items = Vec::new();
        for shared in self.store.items() {
            let guard = shared.read().await;
            items.push((guard.info(), guard.bookings.clone()));
        }
        items.sort_by_key(|(info, _)| info.id);

        let mut events = Vec::new();
        for (info, bookings) in items {
            events.push(Event::ItemRegistered {
                id: info.id,
                owner_id: info.owner_id,
                name: info.name,
            });
            events.extend(bookings.into_iter().map(|booking| Event::BookingCreated { booking }));
        }

        let count = events.len();
        self.wal_control(|response| WalControl::Compact { events, response })
            .await?
            .map_err(|e| BookingError::Storage(e.to_string()))?;
        tracing::info!("WAL compacted to {count} events");
        Ok(())
    }

    pub async fn wal_appends_since_compact(&self) -> u64 {
        self.wal_control(|response| WalControl::AppendsSinceCompact { response })
            .await
            .unwrap_or(0)
    }
}
