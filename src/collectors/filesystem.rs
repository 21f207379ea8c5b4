//! Mounted filesystem enumeration and usage.
//!
//! This module reads the mount table from `<proc_root>/mounts` and uses libc
//! statvfs to compute how full each filesystem is.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::ProducerError;

/// A mounted partition as listed in the mount table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    pub device: String,
    pub mount_point: String,
    pub fstype: String,
}

/// Reads mounted partitions from `<proc_root>/mounts`.
///
/// Pseudo filesystems and repeated mountpoints are left out.
pub fn read_mounts(proc_root: &Path) -> Result<Vec<Mount>, ProducerError> {
    let path = proc_root.join("mounts");
    let content = fs::read_to_string(&path).map_err(|source| ProducerError::Read {
        path: path.display().to_string(),
        source,
    })?;

    Ok(parse_mounts(&content))
}

/// Parses mount table content.
pub fn parse_mounts(content: &str) -> Vec<Mount> {
    let mut seen = HashSet::new();
    let mut mounts = Vec::new();

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 3 {
            continue;
        }

        let mount_point = unescape_mount_field(parts[1]);
        let fstype = parts[2];

        if should_skip_filesystem(fstype, &mount_point) {
            continue;
        }

        // Bind mounts and stacked mounts list the same mountpoint twice
        if !seen.insert(mount_point.clone()) {
            continue;
        }

        mounts.push(Mount {
            device: unescape_mount_field(parts[0]),
            mount_point,
            fstype: fstype.to_string(),
        });
    }

    mounts
}

/// Checks if a filesystem should be skipped based on type and mount point.
fn should_skip_filesystem(fstype: &str, mount_point: &str) -> bool {
    let skip_types = [
        "proc",
        "sysfs",
        "devpts",
        "devtmpfs",
        "tmpfs",
        "cgroup",
        "cgroup2",
        "pstore",
        "bpf",
        "debugfs",
        "tracefs",
        "fusectl",
        "configfs",
        "securityfs",
        "hugetlbfs",
        "mqueue",
        "autofs",
        "binfmt_misc",
        "rpc_pipefs",
        "nsfs",
        "overlay",
        "squashfs",
    ];

    if skip_types.contains(&fstype) {
        return true;
    }

    ["/proc", "/sys", "/dev"]
        .iter()
        .any(|dir| is_within(mount_point, dir))
}

/// Whether `path` is `dir` itself or lies below it, compared by whole path
/// components so `/sysroot` is not inside `/sys`.
fn is_within(path: &str, dir: &str) -> bool {
    match path.strip_prefix(dir) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Decodes the octal escapes (`\040` for space etc.) the kernel uses in the
/// mount table.
fn unescape_mount_field(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_string();
    }

    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() {
            let digits = std::str::from_utf8(&bytes[i + 1..i + 4]).unwrap_or("");
            if let Ok(value) = u8::from_str_radix(digits, 8) {
                out.push(value);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

/// Percentage of a filesystem's user-visible space that is in use, 0-100.
///
/// Reserved root blocks are excluded from the denominator, so the figure
/// matches what `df` prints.
pub fn statvfs_usage_percent(mount_point: &str) -> Result<f64, ProducerError> {
    use std::ffi::CString;
    use std::mem;

    let c_path = CString::new(mount_point).map_err(|e| ProducerError::Statvfs {
        mount_point: mount_point.to_string(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, e),
    })?;

    // SAFETY: statvfs is a plain C struct for which all-zero is valid, and
    // c_path is a NUL-terminated string that outlives the call.
    let stat = unsafe {
        let mut stat: libc::statvfs = mem::zeroed();
        if libc::statvfs(c_path.as_ptr(), &mut stat) != 0 {
            return Err(ProducerError::Statvfs {
                mount_point: mount_point.to_string(),
                source: std::io::Error::last_os_error(),
            });
        }
        stat
    };

    let block_size = stat.f_frsize as u64;
    let total = block_size * stat.f_blocks as u64;
    let free = block_size * stat.f_bfree as u64;
    let available = block_size * stat.f_bavail as u64;

    Ok(usage_percent(total.saturating_sub(free), available))
}

/// `used / (used + available) * 100`, or 0 for an empty filesystem.
pub fn usage_percent(used_bytes: u64, available_bytes: u64) -> f64 {
    let denominator = used_bytes + available_bytes;
    if denominator == 0 {
        return 0.0;
    }
    used_bytes as f64 / denominator as f64 * 100.0
}
