use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::engine::Engine;

/// Check the WAL once per `period` and compact it when more than `threshold`
/// events were appended since the last compaction.
pub async fn run_compactor(engine: Arc<Engine>, threshold: u64, period: Duration) {
    let mut interval = tokio::time::interval(period);
    loop {
        interval.tick().await;
        if compact_if_needed(&engine, threshold).await {
            info!("WAL compacted after crossing {threshold} appends");
        }
    }
}

/// Returns true when a compaction ran and succeeded.
pub async fn compact_if_needed(engine: &Engine, threshold: u64) -> bool {
    let appends = engine.wal_appends_since_compact().await;
    if appends < threshold {
        return false;
    }
    match engine.compact_wal().await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("WAL compaction failed: {e}");
            false
        }
    }
}
