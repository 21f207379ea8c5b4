//! Configured metric selection.
//!
//! The host hands the plugin a configuration block made of key/values nodes.
//! The only recognized key is `metric_list` (compared case-insensitively),
//! whose values replace the configured metric list wholesale. Any other key
//! is reported as a warning and otherwise ignored; configuration never fails.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ConfigWarning;

/// Configuration key that selects the metrics to export.
pub const METRIC_LIST_KEY: &str = "metric_list";

/// One child of a configuration block: a key and its list of string values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigNode {
    pub key: String,
    #[serde(default)]
    pub values: Vec<String>,
}

/// A configuration block as delivered by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigBlock {
    #[serde(default)]
    pub children: Vec<ConfigNode>,
}

impl ConfigBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node.
    pub fn with_node<I, S>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.children.push(ConfigNode {
            key: key.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }
}

/// Outcome of applying one configuration block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigureReport {
    /// The metric list now in effect, if this block set one.
    pub applied: Option<Arc<[String]>>,
    pub warnings: Vec<ConfigWarning>,
}

/// Holds the ordered list of configured metric names.
///
/// Readers get an `Arc` snapshot, so a re-configuration never disturbs a
/// collection cycle that is already iterating the previous list.
#[derive(Debug)]
pub struct MetricSelector {
    configured: RwLock<Arc<[String]>>,
}

impl Default for MetricSelector {
    fn default() -> Self {
        Self {
            configured: RwLock::new(Arc::from(Vec::new())),
        }
    }
}

impl MetricSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a configuration block.
    pub fn configure(&self, block: &ConfigBlock) -> ConfigureReport {
        let mut report = ConfigureReport::default();

        for node in &block.children {
            if node.key.eq_ignore_ascii_case(METRIC_LIST_KEY) {
                let list: Arc<[String]> = Arc::from(node.values.clone());
                debug!("Exporting the following metrics {}", list.join(" "));
                self.replace(list.clone());
                report.applied = Some(list);
            } else {
                warn!("Metric list not set (unrecognized key '{}')", node.key);
                report
                    .warnings
                    .push(ConfigWarning::UnknownKey(node.key.clone()));
            }
        }

        report
    }

    /// Replaces the configured list directly.
    pub fn set_metrics<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list: Vec<String> = names.into_iter().map(Into::into).collect();
        self.replace(Arc::from(list));
    }

    /// Snapshot of the configured list.
    pub fn configured(&self) -> Arc<[String]> {
        match self.configured.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn replace(&self, list: Arc<[String]>) {
        match self.configured.write() {
            Ok(mut guard) => *guard = list,
            Err(poisoned) => *poisoned.into_inner() = list,
        }
    }
}
