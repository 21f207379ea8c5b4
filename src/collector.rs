//! Scheduler-driven collection cycle.
//!
//! The host calls [`Collector::read_cycle`] on a fixed interval. A cycle
//! snapshots the configured metric list, runs every registered producer in
//! that order, merges their maps (later keys overwrite earlier ones) and
//! dispatches each merged pair as a gauge.
//!
//! A failing producer only loses its own keys and a failing dispatch only
//! loses that record; the worst a cycle can do is emit nothing.

use std::sync::{Arc, Mutex, TryLockError};
use std::time::{Duration, Instant};

use tracing::{debug, error, warn};

use crate::error::{DispatchError, ProducerError};
use crate::producers::MetricValues;
use crate::registry::MetricRegistry;
use crate::selector::{ConfigBlock, ConfigureReport, MetricSelector};
use crate::sink::{DispatchRecord, MetricSink};

/// Plugin name attached to every dispatched record.
pub const PLUGIN_NAME: &str = "system-metrics";

/// Default collection interval in seconds.
pub const DEFAULT_INTERVAL_SECS: u64 = 30;

/// A producer that failed during a cycle.
#[derive(Debug)]
pub struct ProducerFailure {
    pub metric: String,
    pub error: ProducerError,
}

/// Merged producer output of one cycle, before dispatch.
#[derive(Debug, Default)]
pub struct Collection {
    pub values: MetricValues,
    pub failures: Vec<ProducerFailure>,
    /// Configured names that had a registered producer.
    pub producers_run: usize,
}

/// A record the sink refused.
#[derive(Debug)]
pub struct DispatchFailure {
    pub type_instance: String,
    pub error: DispatchError,
}

/// Summary of one collection cycle.
#[derive(Debug, Default)]
pub struct CycleReport {
    /// True when the cycle did not run because another one was in progress.
    pub skipped: bool,
    /// Configured names that had a registered producer.
    pub producers_run: usize,
    pub producer_failures: Vec<ProducerFailure>,
    pub dispatched: usize,
    pub dispatch_failures: Vec<DispatchFailure>,
    pub duration: Duration,
}

impl CycleReport {
    /// True if every producer and every dispatch succeeded.
    pub fn is_clean(&self) -> bool {
        !self.skipped && self.producer_failures.is_empty() && self.dispatch_failures.is_empty()
    }
}

/// Owns the registry, the configured selection and the sink.
pub struct Collector {
    plugin_name: String,
    registry: MetricRegistry,
    selector: MetricSelector,
    sink: Arc<dyn MetricSink>,
    cycle_guard: Mutex<()>,
}

impl Collector {
    pub fn new(registry: MetricRegistry, sink: Arc<dyn MetricSink>) -> Self {
        Self {
            plugin_name: PLUGIN_NAME.to_string(),
            registry,
            selector: MetricSelector::new(),
            sink,
            cycle_guard: Mutex::new(()),
        }
    }

    /// Overrides the plugin name attached to dispatched records.
    pub fn with_plugin_name(mut self, plugin_name: impl Into<String>) -> Self {
        self.plugin_name = plugin_name.into();
        self
    }

    pub fn plugin_name(&self) -> &str {
        &self.plugin_name
    }

    pub fn registry(&self) -> &MetricRegistry {
        &self.registry
    }

    pub fn selector(&self) -> &MetricSelector {
        &self.selector
    }

    /// Configuration callback.
    pub fn configure(&self, block: &ConfigBlock) -> ConfigureReport {
        self.selector.configure(block)
    }

    /// Runs the configured producers and merges their output.
    ///
    /// Names without a registered producer are skipped silently.
    pub fn collect(&self) -> Collection {
        let configured = self.selector.configured();
        debug!("Metrics to be exported {}", configured.join(" "));

        let mut merged = MetricValues::new();
        let mut failures = Vec::new();
        let mut producers_run = 0;

        for name in configured.iter() {
            let Some(producer) = self.registry.get(name) else {
                continue;
            };
            producers_run += 1;

            match producer.produce() {
                Ok(values) => merged.extend(values),
                Err(e) => {
                    error!("Producer '{}' failed: {}", name, e);
                    failures.push(ProducerFailure {
                        metric: name.clone(),
                        error: e,
                    });
                }
            }
        }

        Collection {
            values: merged,
            failures,
            producers_run,
        }
    }

    /// Read callback: one full collect-and-dispatch cycle.
    pub fn read_cycle(&self) -> CycleReport {
        let start = Instant::now();

        let _guard = match self.cycle_guard.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => {
                warn!("Previous collection cycle still running, skipping this one");
                return CycleReport {
                    skipped: true,
                    ..CycleReport::default()
                };
            }
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };

        let Collection {
            values: merged,
            failures: producer_failures,
            producers_run,
        } = self.collect();

        let mut dispatched = 0;
        let mut dispatch_failures = Vec::new();
        self.sink.begin_cycle();
        for (key, value) in merged {
            let record = DispatchRecord::gauge(self.plugin_name.as_str(), key, value);
            match self.sink.dispatch(&record) {
                Ok(()) => dispatched += 1,
                Err(e) => {
                    warn!("Failed to dispatch {}: {}", record.type_instance, e);
                    dispatch_failures.push(DispatchFailure {
                        type_instance: record.type_instance,
                        error: e,
                    });
                }
            }
        }
        self.sink.end_cycle();

        let duration = start.elapsed();
        debug!(
            "Collection cycle dispatched {} values in {:.2}ms",
            dispatched,
            duration.as_secs_f64() * 1000.0
        );

        CycleReport {
            skipped: false,
            producers_run,
            producer_failures,
            dispatched,
            dispatch_failures,
            duration,
        }
    }
}

impl std::fmt::Debug for Collector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collector")
            .field("plugin_name", &self.plugin_name)
            .field("registry", &self.registry)
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}
