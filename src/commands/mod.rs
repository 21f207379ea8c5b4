//! CLI command implementations for system-metrics.
//!
//! This module provides implementations for all CLI subcommands:
//! - `list`: Registered metric names
//! - `test`: One-shot collection cycles
//! - `config`: Configuration file generation

pub mod config;
pub mod list;

// Re-export command functions
pub use config::command_config;
pub use list::command_list;
pub use test::command_test;
