mod availability;
mod conflict;
mod error;
mod mutations;
mod queries;
mod store;

pub use availability::{booked_ranges, is_free};
pub use error::BookingError;
pub use store::ItemStore;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, Mutex, OwnedRwLockWriteGuard, RwLock};
use ulid::Ulid;

use crate::model::*;
use crate::wal::Wal;

pub type SharedItemState = Arc<RwLock<ItemState>>;

// ── Group-commit WAL channel ─────────────────────────────

type AppendReply = oneshot::Sender<io::Result<()>>;

pub(super) enum WalControl {
    Compact {
        events: Vec<Event>,
        response: oneshot::Sender<io::Result<()>>,
    },
    AppendsSinceCompact {
        response: oneshot::Sender<u64>,
    },
}

pub(super) enum WalCommand {
    Append { event: Event, response: AppendReply },
    Control(WalControl),
}

/// Background task that owns the WAL and batches appends for group commit.
/// 1. Block until the first Append arrives.
/// 2. Drain every Append already queued behind it.
/// 3. One flush_sync for the whole batch, then answer every sender.
///
/// A control command found while draining closes the batch early; it runs
/// after the batch is flushed so compaction never races buffered bytes.
async fn wal_writer_loop(mut wal: Wal, mut rx: mpsc::Receiver<WalCommand>) {
    while let Some(cmd) = rx.recv().await {
        let (event, response) = match cmd {
            WalCommand::Append { event, response } => (event, response),
            WalCommand::Control(control) => {
                handle_control(&mut wal, control);
                continue;
            }
        };

        let mut batch = vec![(event, response)];
        let mut deferred = None;
        while let Ok(next) = rx.try_recv() {
            match next {
                WalCommand::Append { event, response } => batch.push((event, response)),
                WalCommand::Control(control) => {
                    deferred = Some(control);
                    break;
                }
            }
        }

        metrics::histogram!(crate::observability::WAL_FLUSH_BATCH_SIZE).record(batch.len() as f64);
        let flush_start = std::time::Instant::now();
        let result = flush_batch(&mut wal, &batch);
        metrics::histogram!(crate::observability::WAL_FLUSH_DURATION_SECONDS)
            .record(flush_start.elapsed().as_secs_f64());
        if let Err(e) = &result {
            tracing::error!("WAL flush of {} events failed: {e}", batch.len());
        }
        respond_batch(batch, &result);

        if let Some(control) = deferred {
            handle_control(&mut wal, control);
        }
    }
    tracing::debug!("WAL writer stopped");
}

fn flush_batch(wal: &mut Wal, batch: &[(Event, AppendReply)]) -> io::Result<()> {
    let append_result = batch
        .iter()
        .try_for_each(|(event, _)| wal.append_buffered(event));
    // Flush even after an append error so partially buffered bytes do not
    // leak into the next batch; every sender in this batch sees the failure.
    let flush_result = wal.flush_sync();
    append_result.and(flush_result)
}

fn respond_batch(batch: Vec<(Event, AppendReply)>, result: &io::Result<()>) {
    for (_, tx) in batch {
        let reply = match result {
            Ok(()) => Ok(()),
            Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
        };
        let _ = tx.send(reply);
    }
}

fn handle_control(wal: &mut Wal, control: WalControl) {
    match control {
        WalControl::Compact { events, response } => {
            let result = Wal::write_compact_file(wal.path(), &events)
                .and_then(|()| wal.swap_compact_file());
            let _ = response.send(result);
        }
        WalControl::AppendsSinceCompact { response } => {
            let _ = response.send(wal.appends_since_compact());
        }
    }
}

/// The booking engine: availability checker and booking creator over a
/// WAL-backed in-memory store.
///
/// Writes to one item are serialized by that item's write lock; the overlap
/// check, the WAL append and the in-memory apply all happen under it.
pub struct Engine {
    pub(super) store: ItemStore,
    pub(super) wal_tx: mpsc::Sender<WalCommand>,
    /// Mutations hold it shared; compaction holds it exclusively.
    pub(super) gate: RwLock<()>,
    /// Serializes item registration (exists-check + insert).
    pub(super) registration: Mutex<()>,
}

impl Engine {
    /// Replay the WAL at `wal_path` and start its writer task.
    /// Must be called inside a tokio runtime.
    pub fn new(wal_path: PathBuf) -> io::Result<Self> {
        let events = Wal::replay(&wal_path)?;
        let wal = Wal::open(&wal_path)?;
        let (wal_tx, wal_rx) = mpsc::channel(4096);
        tokio::spawn(wal_writer_loop(wal, wal_rx));

        let engine = Self {
            store: ItemStore::new(),
            wal_tx,
            gate: RwLock::new(()),
            registration: Mutex::new(()),
        };

        // We are the sole owner of every lock here, so try_write never
        // contends. blocking_write would panic inside an async context.
        for event in &events {
            match event {
                Event::ItemRegistered { id, owner_id, name } => {
                    engine
                        .store
                        .insert_item(ItemState::new(*id, *owner_id, name.clone()));
                }
                other => {
                    let Some(item) = engine.store.get_item(&other.item_id()) else {
                        tracing::warn!("replay: event for unknown item {}", other.item_id());
                        continue;
                    };
                    if let Ok(mut guard) = item.try_write() {
                        engine.store.apply_event(&mut guard, other);
                    }
                }
            }
        }
        tracing::info!(
            "replayed {} events into {} items from {}",
            events.len(),
            engine.store.item_count(),
            wal_path.display()
        );

        Ok(engine)
    }

    /// Write event to WAL via the background group-commit writer.
    async fn wal_append(&self, event: &Event) -> Result<(), BookingError> {
        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Append {
                event: event.clone(),
                response: tx,
            })
            .await
            .map_err(|_| BookingError::Storage("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| BookingError::Storage("WAL writer dropped response".into()))?
            .map_err(|e| BookingError::Storage(e.to_string()))
    }

    pub(super) async fn wal_control<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> WalControl,
    ) -> Result<T, BookingError> {
        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Control(make(tx)))
            .await
            .map_err(|_| BookingError::Storage("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| BookingError::Storage("WAL writer dropped response".into()))
    }

    pub fn get_item(&self, id: &ItemId) -> Option<SharedItemState> {
        self.store.get_item(id)
    }

    /// WAL-append then apply. The caller holds the item's write lock.
    pub(super) async fn persist_and_apply(
        &self,
        item: &mut ItemState,
        event: &Event,
    ) -> Result<(), BookingError> {
        self.wal_append(event).await?;
        self.store.apply_event(item, event);
        Ok(())
    }

    /// Lookup booking → item, acquire the item's write lock.
    pub(super) async fn resolve_booking_write(
        &self,
        booking_id: &Ulid,
    ) -> Result<OwnedRwLockWriteGuard<ItemState>, BookingError> {
        let item_id = self
            .store
            .item_for_booking(booking_id)
            .ok_or(BookingError::BookingNotFound(*booking_id))?;
        let item = self
            .store
            .get_item(&item_id)
            .ok_or(BookingError::ItemNotFound(item_id))?;
        Ok(item.write_owned().await)
    }
}
