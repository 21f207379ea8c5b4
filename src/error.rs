//! Error types shared by producers, sinks and configuration handling.

use thiserror::Error;

/// Failure of a single metric producer.
///
/// A producer failure only removes that producer's keys from the current
/// cycle; the collector keeps going with the remaining producers.
#[derive(Debug, Error)]
pub enum ProducerError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid {path} format: {reason}")]
    Parse { path: String, reason: String },

    #[error("CPU count resolved to zero, cannot normalize load average")]
    NoCpus,

    #[error("statvfs failed for {mount_point}: {source}")]
    Statvfs {
        mount_point: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failure to hand a record over to the metrics sink.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Sink rejected '{type_instance}': {reason}")]
    Rejected {
        type_instance: String,
        reason: String,
    },
}

/// Non-fatal problem found while applying a configuration block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigWarning {
    #[error("Metric list not set (unrecognized key '{0}')")]
    UnknownKey(String),
}
