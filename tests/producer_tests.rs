//! Integration tests for the built-in producers.
//!
//! These tests point the producers at a fake proc tree so the expected
//! values are known exactly.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use system_metrics::producers::{
    mount_label, CpuCount, DiskUsagePercent, FsUsage, LoadavgPerCpu, MemoryUsagePercent,
    LOADAVG_PER_CPU, MEMORY_USAGE_PERCENT,
};
use system_metrics::{MetricProducer, ProducerError};

/// Usage source returning fixed percentages and failing for unknown mounts.
struct FakeUsage(HashMap<&'static str, f64>);

impl FsUsage for FakeUsage {
    fn usage_percent(&self, mount_point: &str) -> Result<f64, ProducerError> {
        self.0
            .get(mount_point)
            .copied()
            .ok_or_else(|| ProducerError::Statvfs {
                mount_point: mount_point.to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
    }
}

fn write_proc_file(root: &Path, name: &str, content: &str) {
    fs::write(root.join(name), content).unwrap();
}

#[test]
fn test_loadavg_per_cpu_is_midterm_over_cpus() {
    let dir = tempfile::tempdir().unwrap();

    for (loadavg, cpus, expected) in [
        ("0.10 1.20 3.00 1/100 1", 4, 0.3),
        ("5.00 7.50 2.00 2/200 2", 3, 2.5),
        ("0.00 0.00 0.00 1/1 1", 8, 0.0),
    ] {
        write_proc_file(dir.path(), "loadavg", loadavg);
        let producer = LoadavgPerCpu::new(dir.path()).with_cpu_count(CpuCount::Fixed(cpus));

        let values = producer.produce().unwrap();
        assert_eq!(values.len(), 1);
        assert!(
            (values[LOADAVG_PER_CPU] - expected).abs() < 1e-9,
            "{} over {} CPUs gave {}",
            loadavg,
            cpus,
            values[LOADAVG_PER_CPU]
        );
    }
}

#[test]
fn test_loadavg_zero_cpus_is_hard_error() {
    let dir = tempfile::tempdir().unwrap();
    write_proc_file(dir.path(), "loadavg", "1.00 1.00 1.00 1/1 1");

    let producer = LoadavgPerCpu::new(dir.path()).with_cpu_count(CpuCount::Fixed(0));
    assert!(matches!(producer.produce(), Err(ProducerError::NoCpus)));
}

#[test]
fn test_loadavg_on_live_system() {
    let values = LoadavgPerCpu::new("/proc").produce().unwrap();
    let value = values[LOADAVG_PER_CPU];
    assert!(value.is_finite() && value >= 0.0);
}

#[test]
fn test_memory_usage_percent_range() {
    let values = MemoryUsagePercent::new("/proc").produce().unwrap();
    let percent = values[MEMORY_USAGE_PERCENT];
    assert!((0.0..=100.0).contains(&percent), "got {}", percent);
}

#[test]
fn test_disk_keys_for_root_and_data() {
    let dir = tempfile::tempdir().unwrap();
    write_proc_file(
        dir.path(),
        "mounts",
        "/dev/sda1 / ext4 rw 0 0\n/dev/sdb1 /data xfs rw 0 0\nproc /proc proc rw 0 0\n",
    );

    let producer = DiskUsagePercent::new(dir.path())
        .with_usage(FakeUsage(HashMap::from([("/", 42.04), ("/data", 87.5)])));
    let values = producer.produce().unwrap();

    let keys: Vec<&str> = values.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec!["disk-usage-percent.df-data", "disk-usage-percent.df-root"]
    );
    assert_eq!(values["disk-usage-percent.df-root"], 42.0);
    assert_eq!(values["disk-usage-percent.df-data"], 87.5);
}

#[test]
fn test_disk_skips_unreadable_partition() {
    let dir = tempfile::tempdir().unwrap();
    write_proc_file(
        dir.path(),
        "mounts",
        "/dev/sda1 / ext4 rw 0 0\n/dev/sdc1 /mnt/gone ext4 rw 0 0\n/dev/sda2 /var/log ext4 rw 0 0\n",
    );

    let producer = DiskUsagePercent::new(dir.path())
        .with_usage(FakeUsage(HashMap::from([("/", 10.0), ("/var/log", 20.0)])));
    let values = producer.produce().unwrap();

    assert_eq!(values.len(), 2);
    assert!(values.contains_key("disk-usage-percent.df-var-log"));
    assert!(!values.contains_key("disk-usage-percent.df-mnt-gone"));
}

#[test]
fn test_disk_missing_mount_table_fails() {
    let dir = tempfile::tempdir().unwrap();
    let producer = DiskUsagePercent::new(dir.path());
    assert!(matches!(producer.produce(), Err(ProducerError::Read { .. })));
}

#[test]
fn test_disk_on_live_system_values_in_range() {
    let values = DiskUsagePercent::new("/proc").produce().unwrap();
    for (key, value) in &values {
        assert!(key.starts_with("disk-usage-percent.df"));
        assert!((0.0..=100.0).contains(value), "{} = {}", key, value);
    }
}

#[test]
fn test_mount_label_examples() {
    assert_eq!(mount_label("/"), "df-root");
    assert_eq!(mount_label("/data"), "df-data");
    assert_eq!(mount_label("/var/log"), "df-var-log");
}
