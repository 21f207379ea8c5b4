//! Low-level readers for system state that is not a single /proc file.
//!
//! Currently this is the mount table and per-mountpoint filesystem usage.

pub mod filesystem;
