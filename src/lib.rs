//! System Metrics Sampler Library
//!
//! Periodically samples a configured subset of host health metrics and
//! dispatches each value as a named gauge to a metrics sink:
//!
//! - `loadavg-per-cpu`: mid-term load average divided by the CPU count
//! - `memory-usage-percent`: physical memory in use, 0-100
//! - `disk-usage-percent.<label>`: usage of each mounted partition, 0-100
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use system_metrics::{Collector, ConfigBlock, LogSink, MetricRegistry};
//!
//! let collector = Collector::new(MetricRegistry::builtin("/proc"), Arc::new(LogSink));
//!
//! // Configuration callback
//! collector.configure(&ConfigBlock::new().with_node("metric_list", ["memory-usage-percent"]));
//!
//! // Read callback, normally driven by a timer
//! let report = collector.read_cycle();
//! println!("dispatched {} values", report.dispatched);
//! ```

pub mod collector;
pub mod collectors;
pub mod error;
pub mod producers;
pub mod registry;
pub mod selector;
pub mod sink;
pub mod stats;
pub mod system;

// Re-export main types for convenience
pub use collector::{Collector, CycleReport, DEFAULT_INTERVAL_SECS, PLUGIN_NAME};
pub use error::{ConfigWarning, DispatchError, ProducerError};
pub use producers::{MetricProducer, MetricValues};
pub use registry::MetricRegistry;
pub use selector::{ConfigBlock, ConfigNode, ConfigureReport, MetricSelector, METRIC_LIST_KEY};
pub use sink::{DispatchRecord, LogSink, MetricSink, PrometheusSink, ValueKind};
pub use stats::CycleStats;
pub use system::DEFAULT_PROC_ROOT;
