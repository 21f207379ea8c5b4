//! Load average normalized by the number of logical CPUs.

use std::path::PathBuf;

use tracing::debug;

use super::{MetricProducer, MetricValues, LOADAVG_PER_CPU};
use crate::error::ProducerError;
use crate::system::{online_cpu_count, read_load_average};

/// Where the CPU count comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CpuCount {
    /// Query the number of online CPUs on every sample.
    #[default]
    Online,
    /// A fixed count, for containers with a known CPU quota and for tests.
    Fixed(usize),
}

impl CpuCount {
    fn resolve(self) -> usize {
        match self {
            CpuCount::Online => online_cpu_count(),
            CpuCount::Fixed(n) => n,
        }
    }
}

/// Produces `loadavg-per-cpu`: the mid-term load average divided by the CPU count.
#[derive(Debug, Clone)]
pub struct LoadavgPerCpu {
    proc_root: PathBuf,
    cpus: CpuCount,
}

impl LoadavgPerCpu {
    pub fn new(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
            cpus: CpuCount::Online,
        }
    }

    pub fn with_cpu_count(mut self, cpus: CpuCount) -> Self {
        self.cpus = cpus;
        self
    }
}

/// Divides a load figure by the CPU count, refusing a zero count.
pub fn per_cpu(load: f64, cpus: usize) -> Result<f64, ProducerError> {
    if cpus == 0 {
        return Err(ProducerError::NoCpus);
    }
    Ok(load / cpus as f64)
}

impl MetricProducer for LoadavgPerCpu {
    fn produce(&self) -> Result<MetricValues, ProducerError> {
        let load = read_load_average(&self.proc_root)?;
        let cpus = self.cpus.resolve();
        let value = per_cpu(load.midterm(), cpus)?;
        debug!(
            "Load average {} over {} CPUs = {}",
            load.midterm(),
            cpus,
            value
        );

        Ok(MetricValues::from([(LOADAVG_PER_CPU.to_string(), value)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_per_cpu_divides() {
        assert!((per_cpu(2.0, 4).unwrap() - 0.5).abs() < f64::EPSILON);
        assert!(matches!(per_cpu(1.0, 0), Err(ProducerError::NoCpus)));
    }

    #[test]
    fn test_uses_midterm_sample() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("loadavg"), "9.00 3.00 1.00 1/100 42\n").unwrap();

        let producer = LoadavgPerCpu::new(dir.path()).with_cpu_count(CpuCount::Fixed(2));
        let values = producer.produce().unwrap();

        assert_eq!(values.len(), 1);
        assert!((values[LOADAVG_PER_CPU] - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_zero_cpus_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("loadavg"), "1.00 1.00 1.00 1/100 42\n").unwrap();

        let producer = LoadavgPerCpu::new(dir.path()).with_cpu_count(CpuCount::Fixed(0));
        assert!(matches!(producer.produce(), Err(ProducerError::NoCpus)));
    }
}
