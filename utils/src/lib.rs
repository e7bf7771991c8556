//! Shared infrastructure utilities for luau-watch.
//!
//! - **`atomic_write`**: Crash-safe file persistence (temp + rename) used for
//!   the configuration file and the workspace-state file.

pub mod atomic_write;

pub use atomic_write::{SyncPolicy, atomic_write, atomic_write_with_policy, recover_bak_file};
