//! List command implementation.

use system_metrics::MetricRegistry;

use crate::config::Config;

/// Prints every registered metric name and whether it is configured.
pub fn command_list(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let registry = MetricRegistry::builtin(config.proc_root());
    let configured = config.metric_list().unwrap_or_default();

    println!("📊 Available metrics ({}):", registry.len());
    for name in registry.names() {
        let marker = if configured.iter().any(|c| c == name) {
            "✅"
        } else {
            "  "
        };
        println!("   {} {}", marker, name);
    }

    let unknown: Vec<&String> = configured
        .iter()
        .filter(|name| !registry.contains(name))
        .collect();
    if !unknown.is_empty() {
        println!("\n⚠️  Configured but not registered (ignored):");
        for name in unknown {
            println!("   - {}", name);
        }
    }

    Ok(())
}
