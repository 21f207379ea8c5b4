//! Physical memory usage percentage.

use std::path::PathBuf;

use super::{round_percent, MetricProducer, MetricValues, MEMORY_USAGE_PERCENT};
use crate::error::ProducerError;
use crate::system::read_memory_info;

/// Produces `memory-usage-percent`.
#[derive(Debug, Clone)]
pub struct MemoryUsagePercent {
    proc_root: PathBuf,
}

impl MemoryUsagePercent {
    pub fn new(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
        }
    }
}

impl MetricProducer for MemoryUsagePercent {
    fn produce(&self) -> Result<MetricValues, ProducerError> {
        let info = read_memory_info(&self.proc_root)?;
        Ok(MetricValues::from([(
            MEMORY_USAGE_PERCENT.to_string(),
            round_percent(info.used_percent()),
        )]))
    }
}
