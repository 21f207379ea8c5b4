//! Dispatch of collected values to a metrics sink.
//!
//! Every merged key/value pair of a cycle becomes one `DispatchRecord`. The
//! sink is the seam to whatever ships values off-box; two implementations
//! live here, one that logs and one that feeds a Prometheus registry.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};

use prometheus::{GaugeVec, Opts, Registry};
use serde::Serialize;
use tracing::info;

use crate::error::DispatchError;

/// Kind of a dispatched value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Point-in-time reading.
    Gauge,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Gauge => "gauge",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value handed to the sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchRecord {
    pub plugin: String,
    #[serde(rename = "type")]
    pub kind: ValueKind,
    pub type_instance: String,
    pub value: f64,
}

impl DispatchRecord {
    pub fn gauge(plugin: impl Into<String>, type_instance: impl Into<String>, value: f64) -> Self {
        Self {
            plugin: plugin.into(),
            kind: ValueKind::Gauge,
            type_instance: type_instance.into(),
            value,
        }
    }
}

/// Receiver of dispatched records.
///
/// A cycle calls `begin_cycle`, then `dispatch` once per value, then
/// `end_cycle`. Sinks that keep state between cycles use the hooks to drop
/// values the latest cycle did not produce.
pub trait MetricSink: Send + Sync {
    fn dispatch(&self, record: &DispatchRecord) -> Result<(), DispatchError>;

    fn begin_cycle(&self) {}

    fn end_cycle(&self) {}
}

impl<S: MetricSink + ?Sized> MetricSink for Arc<S> {
    fn dispatch(&self, record: &DispatchRecord) -> Result<(), DispatchError> {
        (**self).dispatch(record)
    }

    fn begin_cycle(&self) {
        (**self).begin_cycle()
    }

    fn end_cycle(&self) {
        (**self).end_cycle()
    }
}

/// Writes every record to the log at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl MetricSink for LogSink {
    fn dispatch(&self, record: &DispatchRecord) -> Result<(), DispatchError> {
        info!(
            plugin = %record.plugin,
            kind = %record.kind,
            type_instance = %record.type_instance,
            value = record.value,
            "dispatch"
        );
        Ok(())
    }
}

/// Name of the gauge family the Prometheus sink registers.
pub const PROMETHEUS_GAUGE_NAME: &str = "system_metrics_gauge";

type SeriesKey = (String, String);

#[derive(Default)]
struct SeriesSets {
    current: HashSet<SeriesKey>,
    previous: HashSet<SeriesKey>,
}

/// Stores records as `system_metrics_gauge{plugin, type_instance}` gauges.
///
/// A series that was not dispatched in the latest cycle is removed when the
/// cycle ends, so a failed producer or an unmounted partition disappears
/// from the exposition instead of keeping its last value.
#[derive(Clone)]
pub struct PrometheusSink {
    gauges: GaugeVec,
    series: Arc<Mutex<SeriesSets>>,
}

impl PrometheusSink {
    /// Creates the gauge family and registers it.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let gauges = GaugeVec::new(
            Opts::new(
                PROMETHEUS_GAUGE_NAME,
                "System metric sampled by the system-metrics plugin",
            ),
            &["plugin", "type_instance"],
        )?;
        registry.register(Box::new(gauges.clone()))?;
        Ok(Self {
            gauges,
            series: Arc::new(Mutex::new(SeriesSets::default())),
        })
    }

    fn series(&self) -> std::sync::MutexGuard<'_, SeriesSets> {
        self.series.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl MetricSink for PrometheusSink {
    fn dispatch(&self, record: &DispatchRecord) -> Result<(), DispatchError> {
        if !record.value.is_finite() {
            return Err(DispatchError::Rejected {
                type_instance: record.type_instance.clone(),
                reason: format!("non-finite value {}", record.value),
            });
        }

        let gauge = self
            .gauges
            .get_metric_with_label_values(&[record.plugin.as_str(), record.type_instance.as_str()])
            .map_err(|e| DispatchError::Rejected {
                type_instance: record.type_instance.clone(),
                reason: e.to_string(),
            })?;
        gauge.set(record.value);
        self.series()
            .current
            .insert((record.plugin.clone(), record.type_instance.clone()));
        Ok(())
    }

    fn begin_cycle(&self) {
        self.series().current.clear();
    }

    fn end_cycle(&self) {
        let mut series = self.series();
        let SeriesSets { current, previous } = &mut *series;
        for (plugin, type_instance) in previous.difference(current) {
            // Already gone if the series was never created
            let _ = self
                .gauges
                .remove_label_values(&[plugin.as_str(), type_instance.as_str()]);
        }
        *previous = std::mem::take(current);
    }
}
