use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: engine operations executed. Labels: op, status.
pub const QUERIES_TOTAL: &str = "hotelbook_queries_total";

/// Histogram: engine operation latency in seconds. Labels: op.
pub const QUERY_DURATION_SECONDS: &str = "hotelbook_query_duration_seconds";

/// Counter: bookings committed to the booking store.
pub const BOOKINGS_CREATED_TOTAL: &str = "hotelbook_bookings_created_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Histogram: WAL group-commit flush duration in seconds.
pub const WAL_FLUSH_DURATION_SECONDS: &str = "hotelbook_wal_flush_duration_seconds";

/// Histogram: WAL group-commit batch size (records per flush).
pub const WAL_FLUSH_BATCH_SIZE: &str = "hotelbook_wal_flush_batch_size";

pub const OP_FIND_AVAILABLE_ROOM: &str = "find_available_room";
pub const OP_FULLY_OCCUPIED_DATES: &str = "fully_occupied_dates";
pub const OP_CREATE_BOOKING: &str = "create_booking";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

/// Record one engine operation: count by status and observe its latency.
pub fn record_op(op: &'static str, ok: bool, started: std::time::Instant) {
    let status = if ok { "ok" } else { "error" };
    metrics::counter!(QUERIES_TOTAL, "op" => op, "status" => status).increment(1);
    metrics::histogram!(QUERY_DURATION_SECONDS, "op" => op).record(started.elapsed().as_secs_f64());
}
