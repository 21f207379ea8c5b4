//! Name to producer registry.
//!
//! The registry is built once at startup and owned by the collector. Adding a
//! new metric means registering another producer here; the collector itself
//! only ever looks names up.

use std::collections::BTreeMap;
use std::path::Path;

use crate::producers::{
    DiskUsagePercent, LoadavgPerCpu, MemoryUsagePercent, MetricProducer, DISK_USAGE_PERCENT,
    LOADAVG_PER_CPU, MEMORY_USAGE_PERCENT,
};

/// Mapping from metric name to the producer that computes it.
#[derive(Default)]
pub struct MetricRegistry {
    producers: BTreeMap<String, Box<dyn MetricProducer>>,
}

impl MetricRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in load, memory and disk producers reading
    /// from the given proc root.
    pub fn builtin(proc_root: impl AsRef<Path>) -> Self {
        let proc_root = proc_root.as_ref();
        let mut registry = Self::new();
        registry.register(LOADAVG_PER_CPU, LoadavgPerCpu::new(proc_root));
        registry.register(MEMORY_USAGE_PERCENT, MemoryUsagePercent::new(proc_root));
        registry.register(DISK_USAGE_PERCENT, DiskUsagePercent::new(proc_root));
        registry
    }

    /// Registers a producer under `name`. Returns true if it replaced an
    /// existing producer.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        producer: impl MetricProducer + 'static,
    ) -> bool {
        self.producers
            .insert(name.into(), Box::new(producer))
            .is_some()
    }

    pub fn get(&self, name: &str) -> Option<&dyn MetricProducer> {
        self.producers.get(name).map(|p| p.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.producers.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.producers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.producers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.producers.is_empty()
    }
}

impl std::fmt::Debug for MetricRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricRegistry")
            .field("names", &self.producers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProducerError;
    use crate::producers::MetricValues;

    #[test]
    fn test_builtin_names() {
        let registry = MetricRegistry::builtin("/proc");
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(
            names,
            vec![DISK_USAGE_PERCENT, LOADAVG_PER_CPU, MEMORY_USAGE_PERCENT]
        );
        assert!(registry.contains(LOADAVG_PER_CPU));
        assert!(!registry.contains("cpu-temperature"));
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = MetricRegistry::new();
        assert!(registry.is_empty());

        let first = || -> Result<MetricValues, ProducerError> {
            Ok(MetricValues::from([("x".to_string(), 1.0)]))
        };
        let second = || -> Result<MetricValues, ProducerError> {
            Ok(MetricValues::from([("x".to_string(), 2.0)]))
        };

        assert!(!registry.register("x", first));
        assert!(registry.register("x", second));
        assert_eq!(registry.len(), 1);

        let values = registry.get("x").unwrap().produce().unwrap();
        assert_eq!(values["x"], 2.0);
    }
}
