//! Integration tests for configuration handling.
//!
//! These tests verify how configuration blocks populate the configured
//! metric list through the collector's configuration callback.

use std::sync::Arc;
use system_metrics::{
    Collector, ConfigBlock, ConfigWarning, LogSink, MetricRegistry, MetricSelector,
};

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_metric_list_sets_exact_order() {
    let selector = MetricSelector::new();
    let report = selector.configure(&ConfigBlock::new().with_node(
        "metric_list",
        ["memory-usage-percent", "loadavg-per-cpu", "disk-usage-percent"],
    ));

    assert!(report.warnings.is_empty());
    assert_eq!(
        selector.configured().to_vec(),
        names(&["memory-usage-percent", "loadavg-per-cpu", "disk-usage-percent"])
    );
    assert_eq!(report.applied.unwrap().len(), 3);
}

#[test]
fn test_reconfiguration_replaces_instead_of_merging() {
    let selector = MetricSelector::new();
    selector.configure(&ConfigBlock::new().with_node("metric_list", ["a", "b"]));
    selector.configure(&ConfigBlock::new().with_node("metric_list", ["c"]));

    assert_eq!(selector.configured().to_vec(), names(&["c"]));
}

#[test]
fn test_last_metric_list_in_block_wins() {
    let selector = MetricSelector::new();
    selector.configure(
        &ConfigBlock::new()
            .with_node("metric_list", ["a"])
            .with_node("METRIC_LIST", ["b", "c"]),
    );

    assert_eq!(selector.configured().to_vec(), names(&["b", "c"]));
}

#[test]
fn test_empty_metric_list_clears() {
    let selector = MetricSelector::new();
    selector.set_metrics(["a"]);
    selector.configure(&ConfigBlock::new().with_node("metric_list", Vec::<String>::new()));

    assert!(selector.configured().is_empty());
}

#[test]
fn test_unknown_key_warns_and_leaves_state() {
    let selector = MetricSelector::new();
    let report = selector.configure(&ConfigBlock::new().with_node("interval", ["10"]));

    assert!(report.applied.is_none());
    assert_eq!(
        report.warnings,
        vec![ConfigWarning::UnknownKey("interval".to_string())]
    );
    assert!(selector.configured().is_empty());

    // A previously configured list survives a block without metric_list
    selector.set_metrics(["memory-usage-percent"]);
    let report = selector.configure(&ConfigBlock::new().with_node("verbose", ["true"]));
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(selector.configured().to_vec(), names(&["memory-usage-percent"]));
}

#[test]
fn test_empty_block_is_noop() {
    let selector = MetricSelector::new();
    let report = selector.configure(&ConfigBlock::new());

    assert!(report.applied.is_none());
    assert!(report.warnings.is_empty());
    assert!(selector.configured().is_empty());
}

#[test]
fn test_collector_configuration_callback() {
    let collector = Collector::new(MetricRegistry::builtin("/proc"), Arc::new(LogSink));
    collector.configure(
        &ConfigBlock::new()
            .with_node("Metric_List", ["memory-usage-percent"])
            .with_node("unknown", ["x"]),
    );

    assert_eq!(
        collector.selector().configured().to_vec(),
        names(&["memory-usage-percent"])
    );
}
