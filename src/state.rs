//! Application state management for the sampler.
//!
//! This module defines the shared application state that is passed
//! to HTTP handlers and used by the background collection task.

use prometheus::{Gauge, Registry};
use std::sync::Arc;
use system_metrics::{Collector, CycleStats};

use crate::config::Config;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// Global application state shared across requests and background tasks.
pub struct AppState {
    pub registry: Registry,
    pub collector: Arc<Collector>,
    pub stats: Arc<CycleStats>,
    pub config: Arc<Config>,
    /// Duration of the most recent collection cycle.
    pub cycle_duration: Gauge,
    /// Whether the most recent cycle had no producer or dispatch failure (1) or not (0).
    pub cycle_success: Gauge,
}
