//! Configuration management for system-metrics.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.
//!
//! The `module` section is the plugin's configuration block: every entry is a
//! key with a list of string values and is handed to the metric selector
//! as-is, so unknown keys are warned about rather than rejected.

use clap::ValueEnum;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use system_metrics::producers::{DISK_USAGE_PERCENT, LOADAVG_PER_CPU, MEMORY_USAGE_PERCENT};
use system_metrics::{
    ConfigBlock, ConfigNode, DEFAULT_INTERVAL_SECS, DEFAULT_PROC_ROOT, METRIC_LIST_KEY,
    PLUGIN_NAME,
};
use tracing::info;

use crate::cli::{Args, ConfigFormat, LogLevel};

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9217;

/// Destination of dispatched values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Log every value at info level
    Log,
    /// Keep values as gauges served on /metrics
    Prometheus,
}

/// The `module` section, kept in the order the file lists its keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleSection(pub Vec<ConfigNode>);

impl ModuleSection {
    /// Values of the last `metric_list` entry, compared case-insensitively.
    pub fn metric_list(&self) -> Option<&[String]> {
        self.0
            .iter()
            .rev()
            .find(|node| node.key.eq_ignore_ascii_case(METRIC_LIST_KEY))
            .map(|node| node.values.as_slice())
    }

    /// Replaces every `metric_list` entry with one holding `values`.
    pub fn set_metric_list(&mut self, values: Vec<String>) {
        self.0
            .retain(|node| !node.key.eq_ignore_ascii_case(METRIC_LIST_KEY));
        self.0.push(ConfigNode {
            key: METRIC_LIST_KEY.to_string(),
            values,
        });
    }
}

impl Serialize for ModuleSection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for node in &self.0 {
            map.serialize_entry(&node.key, &node.values)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ModuleSection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ModuleVisitor;

        impl<'de> Visitor<'de> for ModuleVisitor {
            type Value = ModuleSection;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of keys to lists of strings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut nodes = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, values)) = access.next_entry::<String, Vec<String>>()? {
                    nodes.push(ConfigNode { key, values });
                }
                Ok(ModuleSection(nodes))
            }
        }

        deserializer.deserialize_map(ModuleVisitor)
    }
}

/// Top-level configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub port: Option<u16>,
    pub bind: Option<String>,

    // Collection
    #[serde(alias = "interval")]
    pub interval_seconds: Option<u64>,
    #[serde(alias = "plugin-name")]
    pub plugin_name: Option<String>,
    #[serde(alias = "proc-root")]
    pub proc_root: Option<PathBuf>,
    pub sink: Option<SinkKind>,

    // Logging
    pub log_level: Option<LogLevel>,

    /// Plugin configuration block, e.g. `metric_list: [...]`
    #[serde(default)]
    pub module: ModuleSection,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: Some(DEFAULT_PORT),
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            interval_seconds: Some(DEFAULT_INTERVAL_SECS),
            plugin_name: Some(PLUGIN_NAME.to_string()),
            proc_root: Some(PathBuf::from(DEFAULT_PROC_ROOT)),
            sink: Some(SinkKind::Prometheus),
            log_level: Some(LogLevel::Info),
            module: ModuleSection(vec![ConfigNode {
                key: METRIC_LIST_KEY.to_string(),
                values: vec![
                    LOADAVG_PER_CPU.to_string(),
                    MEMORY_USAGE_PERCENT.to_string(),
                    DISK_USAGE_PERCENT.to_string(),
                ],
            }]),
        }
    }
}

impl Config {
    pub fn interval_seconds(&self) -> u64 {
        self.interval_seconds.unwrap_or(DEFAULT_INTERVAL_SECS)
    }

    pub fn plugin_name(&self) -> &str {
        self.plugin_name.as_deref().unwrap_or(PLUGIN_NAME)
    }

    pub fn proc_root(&self) -> &Path {
        self.proc_root
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_PROC_ROOT))
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level.unwrap_or(LogLevel::Info)
    }

    pub fn sink(&self) -> SinkKind {
        self.sink.unwrap_or(SinkKind::Prometheus)
    }

    /// The `module` section as the configuration block the selector consumes.
    pub fn config_block(&self) -> ConfigBlock {
        ConfigBlock {
            children: self.module.0.clone(),
        }
    }

    /// The metric list the selector ends up with, if the module section has one.
    pub fn metric_list(&self) -> Option<&[String]> {
        self.module.metric_list()
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if cfg.interval_seconds() == 0 {
        return Err("interval_seconds must be greater than 0".into());
    }

    if cfg.plugin_name().trim().is_empty() {
        return Err("plugin_name must not be empty".into());
    }

    let proc_root = cfg.proc_root();
    if !proc_root.is_dir() {
        return Err(format!("proc_root {} is not a directory", proc_root.display()).into());
    }

    if let Some(bind) = cfg.bind.as_deref() {
        if bind.parse::<std::net::IpAddr>().is_err() {
            return Err(format!("Invalid bind address '{}'", bind).into());
        }
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }

    // Only override port if the user supplied it on the CLI.
    if let Some(cli_port) = args.port {
        config.port = Some(cli_port);
    }

    if let Some(interval) = args.interval {
        config.interval_seconds = Some(interval);
    }

    if let Some(proc_root) = &args.proc_root {
        config.proc_root = Some(proc_root.clone());
    }

    if let Some(level) = args.log_level {
        config.log_level = Some(level);
    }

    if let Some(sink) = args.sink {
        config.sink = Some(sink);
    }

    // Parse comma-separated metric names
    if let Some(metrics_str) = &args.metrics {
        config.module.set_metric_list(
            metrics_str
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        );
    }

    Ok(config)
}

/// Loads configuration from `path`, or from the first default location that
/// exists. Falls back to defaults when no file is found.
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = if let Some(p) = path {
        PathBuf::from(p)
    } else {
        let defaults = [
            "/etc/system-metrics/system-metrics.yaml",
            "/etc/system-metrics/system-metrics.yml",
            "/etc/system-metrics/system-metrics.json",
            "./system-metrics.yaml",
            "./system-metrics.yml",
            "./system-metrics.json",
        ];

        match defaults.iter().find(|p| Path::new(p).exists()) {
            Some(found) => PathBuf::from(found),
            None => return Ok(Config::default()),
        }
    };

    if !path.exists() {
        return Err(format!("Config file not found: {}", path.display()).into());
    }

    let content = fs::read_to_string(&path)?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let config: Config = serde_json::from_str(&content)?;
            info!("Loaded JSON configuration from: {}", path.display());
            Ok(config)
        }
        Some("toml") => {
            let config: Config = toml::from_str(&content)?;
            info!("Loaded TOML configuration from: {}", path.display());
            Ok(config)
        }
        _ => {
            // Default to YAML
            let config: Config = serde_yaml::from_str(&content)?;
            info!("Loaded YAML configuration from: {}", path.display());
            Ok(config)
        }
    }
}

/// Serializes configuration in the requested format.
pub fn render_config(
    config: &Config,
    format: &ConfigFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render_config(config, &format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["system-metrics", "--no-config"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(validate_effective_config(&config).is_ok());
        assert_eq!(config.interval_seconds(), 30);
        assert_eq!(config.metric_list().map(|l| l.len()), Some(3));
    }

    #[test]
    fn test_cli_overrides() {
        let config = resolve_config(&args(&[
            "--interval",
            "10",
            "--metrics",
            "memory-usage-percent, loadavg-per-cpu",
            "--sink",
            "log",
        ]))
        .unwrap();

        assert_eq!(config.interval_seconds(), 10);
        assert_eq!(config.sink(), SinkKind::Log);
        assert_eq!(
            config.metric_list().unwrap(),
            &["memory-usage-percent".to_string(), "loadavg-per-cpu".to_string()]
        );
    }

    #[test]
    fn test_zero_interval_is_invalid() {
        let config = resolve_config(&args(&["--interval", "0"])).unwrap();
        assert!(validate_effective_config(&config).is_err());
    }

    #[test]
    fn test_load_yaml_module_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("system-metrics.yaml");
        fs::write(
            &path,
            "interval_seconds: 15\nmodule:\n  METRIC_LIST: [\"disk-usage-percent\"]\n  verbose: [\"true\"]\n",
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.interval_seconds(), 15);
        assert_eq!(config.metric_list().unwrap(), &["disk-usage-percent".to_string()]);

        let block = config.config_block();
        assert_eq!(block.children.len(), 2);
    }

    #[test]
    fn test_module_section_keeps_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("system-metrics.yaml");
        fs::write(
            &path,
            "module:\n  metric_list: [\"loadavg-per-cpu\"]\n  Metric_List: [\"memory-usage-percent\"]\n",
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        let block = config.config_block();
        let keys: Vec<&str> = block
            .children
            .iter()
            .map(|node| node.key.as_str())
            .collect();
        assert_eq!(keys, vec!["metric_list", "Metric_List"]);
        assert_eq!(
            config.metric_list().unwrap(),
            &["memory-usage-percent".to_string()]
        );

        let selector = system_metrics::MetricSelector::new();
        selector.configure(&config.config_block());
        assert_eq!(&*selector.configured(), &["memory-usage-percent".to_string()]);
    }

    #[test]
    fn test_load_toml_module_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("system-metrics.toml");
        fs::write(
            &path,
            "interval_seconds = 5\n\n[module]\nmetric_list = [\"disk-usage-percent\"]\n",
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.interval_seconds(), 5);
        assert_eq!(config.metric_list().unwrap(), &["disk-usage-percent".to_string()]);
    }

    #[test]
    fn test_log_level_from_file_and_cli() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("system-metrics.yaml");
        fs::write(&path, "log_level: debug\n").unwrap();
        let path_str = path.to_str().unwrap();

        let from_file = resolve_config(&Args::parse_from(["system-metrics", "-c", path_str])).unwrap();
        assert_eq!(from_file.log_level(), LogLevel::Debug);

        let from_cli = resolve_config(&Args::parse_from([
            "system-metrics",
            "-c",
            path_str,
            "--log-level",
            "warn",
        ]))
        .unwrap();
        assert_eq!(from_cli.log_level(), LogLevel::Warn);

        assert_eq!(resolve_config(&args(&[])).unwrap().log_level(), LogLevel::Info);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("nope.yaml"))).is_err());
    }

    #[test]
    fn test_render_all_formats() {
        let config = Config::default();
        for format in [ConfigFormat::Yaml, ConfigFormat::Json, ConfigFormat::Toml] {
            let text = render_config(&config, &format).unwrap();
            assert!(text.contains("metric_list"));
        }
    }
}
