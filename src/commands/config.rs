//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let output = match output {
        Some(path) => path,
        None => PathBuf::from("system-metrics.yaml"),
    };

    let mut content = render_config(&config, &format)?;
    if commented && matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# System Metrics Sampler Configuration
# ====================================
#
# Server Configuration
# --------------------
# bind: "0.0.0.0"              # Bind IP (0.0.0.0 = all interfaces)
# port: 9217                   # HTTP port for /metrics and /health
#
# Collection
# ----------
# interval_seconds: 30         # Seconds between collection cycles
# plugin_name: system-metrics  # Plugin name attached to every value
# proc_root: /proc             # Where to read loadavg, meminfo and mounts
# sink: prometheus             # prometheus (serve on /metrics) or log
#
# Logging
# -------
# log_level: "info"            # off, error, warn, info, debug, trace
#
# Module
# ------
# Every key is passed to the plugin as a configuration node. Only
# metric_list is recognized; other keys are logged as warnings.
#
# module:
#   metric_list:
#     - loadavg-per-cpu        # mid-term load average / CPU count
#     - memory-usage-percent   # physical memory in use, 0-100
#     - disk-usage-percent     # one value per mounted partition, 0-100
"#;

    format!("{comments}\n{yaml}")
}
