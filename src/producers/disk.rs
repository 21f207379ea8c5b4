//! Per-partition disk usage percentage.

use std::path::PathBuf;

use tracing::warn;

use super::{round_percent, MetricProducer, MetricValues, DISK_USAGE_PERCENT};
use crate::collectors::filesystem::{read_mounts, statvfs_usage_percent};
use crate::error::ProducerError;

/// Source of per-mountpoint usage figures.
pub trait FsUsage: Send + Sync {
    fn usage_percent(&self, mount_point: &str) -> Result<f64, ProducerError>;
}

/// Usage from the statvfs syscall.
#[derive(Debug, Clone, Copy, Default)]
pub struct Statvfs;

impl FsUsage for Statvfs {
    fn usage_percent(&self, mount_point: &str) -> Result<f64, ProducerError> {
        statvfs_usage_percent(mount_point)
    }
}

/// Label for a mountpoint: `df-root` for `/`, otherwise `df` followed by the
/// path with every `/` turned into `-` (`/var/log` becomes `df-var-log`).
pub fn mount_label(mount_point: &str) -> String {
    if mount_point == "/" {
        "df-root".to_string()
    } else {
        format!("df{}", mount_point.replace('/', "-"))
    }
}

/// Output key for a mountpoint, e.g. `disk-usage-percent.df-root`.
pub fn disk_key(mount_point: &str) -> String {
    format!("{}.{}", DISK_USAGE_PERCENT, mount_label(mount_point))
}

/// Produces one `disk-usage-percent.<label>` key per mounted partition.
#[derive(Debug, Clone)]
pub struct DiskUsagePercent<U = Statvfs> {
    proc_root: PathBuf,
    usage: U,
}

impl DiskUsagePercent<Statvfs> {
    pub fn new(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
            usage: Statvfs,
        }
    }
}

impl<U: FsUsage> DiskUsagePercent<U> {
    /// Uses a custom usage source instead of statvfs.
    pub fn with_usage<V: FsUsage>(self, usage: V) -> DiskUsagePercent<V> {
        DiskUsagePercent {
            proc_root: self.proc_root,
            usage,
        }
    }
}

impl<U: FsUsage> MetricProducer for DiskUsagePercent<U> {
    fn produce(&self) -> Result<MetricValues, ProducerError> {
        let mounts = read_mounts(&self.proc_root)?;
        let mut values = MetricValues::new();

        for mount in mounts {
            match self.usage.usage_percent(&mount.mount_point) {
                Ok(percent) => {
                    values.insert(disk_key(&mount.mount_point), round_percent(percent));
                }
                Err(e) => {
                    // Unmounted between the mount table read and statvfs, or not permitted
                    warn!("Skipping partition {}: {}", mount.mount_point, e);
                }
            }
        }

        Ok(values)
    }
}
