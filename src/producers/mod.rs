//! Metric producers.
//!
//! A producer computes the current value(s) of one metric category. It takes
//! no arguments and returns a fully materialized map of output key to value;
//! one registered metric name may expand to several output keys (one per
//! mounted partition for disk usage, for instance).

pub mod disk;
pub mod loadavg;
pub mod memory;

use std::collections::BTreeMap;

use crate::error::ProducerError;

pub use disk::{disk_key, mount_label, DiskUsagePercent, FsUsage, Statvfs};
pub use loadavg::{per_cpu, CpuCount, LoadavgPerCpu};
pub use memory::MemoryUsagePercent;

/// Output key to numeric value, as returned by a producer.
pub type MetricValues = BTreeMap<String, f64>;

pub const LOADAVG_PER_CPU: &str = "loadavg-per-cpu";
pub const MEMORY_USAGE_PERCENT: &str = "memory-usage-percent";
pub const DISK_USAGE_PERCENT: &str = "disk-usage-percent";

/// Something that can be sampled once per collection cycle.
pub trait MetricProducer: Send + Sync {
    fn produce(&self) -> Result<MetricValues, ProducerError>;
}

impl<F> MetricProducer for F
where
    F: Fn() -> Result<MetricValues, ProducerError> + Send + Sync,
{
    fn produce(&self) -> Result<MetricValues, ProducerError> {
        self()
    }
}

/// Rounds a percentage to one decimal place.
pub(crate) fn round_percent(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
