//! Health check endpoint handler.
//!
//! This module provides the `/health` endpoint handler that returns
//! collection cycle statistics as plain text.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use tracing::{debug, instrument};

use crate::state::SharedState;

// Time conversion constants
const SECONDS_PER_HOUR: f64 = 3600.0;
const MINUTES_PER_HOUR: f64 = 60.0;
const HOURS_PER_DAY: f64 = 24.0;

/// A cycle older than this many intervals means the scheduler is stuck.
const STALE_INTERVALS: f64 = 3.0;

/// Handler for the /health endpoint.
#[instrument(skip(state))]
pub async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /health request");

    let interval = state.config.interval_seconds() as f64;
    let stale = state
        .stats
        .seconds_since_last_cycle()
        .is_some_and(|secs| secs > interval * STALE_INTERVALS);

    let (status, message) = if !state.stats.has_run() {
        (StatusCode::SERVICE_UNAVAILABLE, "No collection cycle completed yet")
    } else if stale {
        (StatusCode::SERVICE_UNAVAILABLE, "Collection cycles stalled")
    } else {
        (StatusCode::OK, "OK")
    };

    let uptime_hours = state.stats.get_uptime_seconds() as f64 / SECONDS_PER_HOUR;
    let uptime_str = if uptime_hours < 1.0 {
        format!("{:.1} minutes", uptime_hours * MINUTES_PER_HOUR)
    } else if uptime_hours < HOURS_PER_DAY {
        format!("{:.1} hours", uptime_hours)
    } else {
        format!("{:.1} days", uptime_hours / HOURS_PER_DAY)
    };

    let configured = state.collector.selector().configured();
    let configured_str = if configured.is_empty() {
        "(none)".to_string()
    } else {
        configured.join(", ")
    };

    let table = state.stats.render_table();

    debug!("Health check: {} - {}", status, message);
    (
        status,
        [("Content-Type", "text/plain; charset=utf-8")],
        format!(
            "{message}\n\nUptime: {uptime_str}\nInterval: {interval}s\nConfigured metrics: {configured_str}\n\n{table}"
        ),
    )
}
