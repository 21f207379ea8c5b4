//! System-wide readings from the /proc filesystem.
//!
//! This module reads the load average and virtual-memory accounting used by
//! the load and memory producers. Every reader takes the proc root as a
//! parameter so it can be pointed at a fake tree in tests.

use std::fs;
use std::path::Path;

use crate::error::ProducerError;

/// Default location of the proc filesystem.
pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// System load averages for 1, 5, and 15 minute intervals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadAverage {
    pub one_min: f64,
    pub five_min: f64,
    pub fifteen_min: f64,
}

impl LoadAverage {
    /// The mid-term sample (second of the three standard figures).
    pub fn midterm(&self) -> f64 {
        self.five_min
    }
}

/// Physical memory totals as reported by /proc/meminfo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryInfo {
    pub total_bytes: u64,
    pub available_bytes: u64,
}

impl MemoryInfo {
    /// Percentage of physical memory in use, 0-100.
    pub fn used_percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        let used = self.total_bytes.saturating_sub(self.available_bytes);
        used as f64 / self.total_bytes as f64 * 100.0
    }
}

fn read_proc_file(proc_root: &Path, name: &str) -> Result<(String, String), ProducerError> {
    let path = proc_root.join(name);
    let display = path.display().to_string();
    let content = fs::read_to_string(&path).map_err(|source| ProducerError::Read {
        path: display.clone(),
        source,
    })?;
    Ok((display, content))
}

/// Reads load average from `<proc_root>/loadavg`.
///
/// Format: "0.00 0.01 0.05 1/234 5678"
pub fn read_load_average(proc_root: &Path) -> Result<LoadAverage, ProducerError> {
    let (path, content) = read_proc_file(proc_root, "loadavg")?;
    parse_load_average(&content).map_err(|reason| ProducerError::Parse { path, reason })
}

/// Parses the first three fields of a loadavg line.
pub fn parse_load_average(content: &str) -> Result<LoadAverage, String> {
    let parts: Vec<&str> = content.split_whitespace().collect();
    if parts.len() < 3 {
        return Err(format!(
            "expected at least 3 fields, got {}",
            parts.len()
        ));
    }

    let one_min = parts[0]
        .parse::<f64>()
        .map_err(|e| format!("Failed to parse 1min load average: {}", e))?;
    let five_min = parts[1]
        .parse::<f64>()
        .map_err(|e| format!("Failed to parse 5min load average: {}", e))?;
    let fifteen_min = parts[2]
        .parse::<f64>()
        .map_err(|e| format!("Failed to parse 15min load average: {}", e))?;

    Ok(LoadAverage {
        one_min,
        five_min,
        fifteen_min,
    })
}

/// Reads `<proc_root>/meminfo`.
pub fn read_memory_info(proc_root: &Path) -> Result<MemoryInfo, ProducerError> {
    let (path, content) = read_proc_file(proc_root, "meminfo")?;
    parse_memory_info(&content).map_err(|reason| ProducerError::Parse { path, reason })
}

/// Parses meminfo content into total and available bytes.
///
/// Kernels older than 3.14 do not report `MemAvailable`; for those the
/// available figure is approximated as `MemFree + Buffers + Cached`.
pub fn parse_memory_info(content: &str) -> Result<MemoryInfo, String> {
    let mut total_kb: Option<u64> = None;
    let mut available_kb: Option<u64> = None;
    let mut free_kb: Option<u64> = None;
    let mut buffers_kb: Option<u64> = None;
    let mut cached_kb: Option<u64> = None;

    for line in content.lines() {
        let mut parts = line.split_whitespace();
        let (Some(field), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };
        let Ok(kb) = value.parse::<u64>() else {
            continue;
        };

        match field {
            "MemTotal:" => total_kb = Some(kb),
            "MemAvailable:" => available_kb = Some(kb),
            "MemFree:" => free_kb = Some(kb),
            "Buffers:" => buffers_kb = Some(kb),
            "Cached:" => cached_kb = Some(kb),
            _ => {}
        }
    }

    let total_kb = match total_kb {
        Some(0) => return Err("MemTotal is zero".to_string()),
        Some(kb) => kb,
        None => return Err("MemTotal not found".to_string()),
    };

    let available_kb = match (available_kb, free_kb) {
        (Some(available), _) => available,
        (None, Some(free)) => free + buffers_kb.unwrap_or(0) + cached_kb.unwrap_or(0),
        (None, None) => return Err("neither MemAvailable nor MemFree found".to_string()),
    };

    Ok(MemoryInfo {
        total_bytes: total_kb * 1024,
        available_bytes: available_kb.min(total_kb) * 1024,
    })
}

/// Number of logical CPUs currently online.
///
/// Returns 0 when neither sysconf nor the std fallback can determine it.
pub fn online_cpu_count() -> usize {
    // SAFETY: sysconf only reads a kernel-provided value and has no
    // preconditions on its argument.
    let online = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
    if online > 0 {
        return online as usize;
    }

    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(0)
}
