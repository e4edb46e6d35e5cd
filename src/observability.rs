use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: HTTP requests served. Labels: route, status.
pub const REQUESTS_TOTAL: &str = "rentbook_requests_total";

/// Histogram: HTTP request latency in seconds. Labels: route.
pub const REQUEST_DURATION_SECONDS: &str = "rentbook_request_duration_seconds";

// ── Booking domain ──────────────────────────────────────────────

/// Counter: bookings committed.
pub const BOOKINGS_CREATED_TOTAL: &str = "rentbook_bookings_created_total";

/// Counter: booking attempts rejected because the dates were taken.
pub const BOOKING_CONFLICTS_TOTAL: &str = "rentbook_booking_conflicts_total";

/// Counter: bookings moved to cancelled.
pub const BOOKINGS_CANCELLED_TOTAL: &str = "rentbook_bookings_cancelled_total";

/// Counter: availability checks. Labels: result (available | taken).
pub const AVAILABILITY_CHECKS_TOTAL: &str = "rentbook_availability_checks_total";

/// Counter: requests rejected for a missing or unknown session token.
pub const AUTH_FAILURES_TOTAL: &str = "rentbook_auth_failures_total";

// ── Storage ─────────────────────────────────────────────────────

/// Histogram: WAL group-commit flush duration in seconds.
pub const WAL_FLUSH_DURATION_SECONDS: &str = "rentbook_wal_flush_duration_seconds";

/// Histogram: WAL group-commit batch size (events per flush).
pub const WAL_FLUSH_BATCH_SIZE: &str = "rentbook_wal_flush_batch_size";

/// Install the Prometheus exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), metrics_exporter_prometheus::BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}
