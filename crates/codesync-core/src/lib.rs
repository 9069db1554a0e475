//! Core orchestration layer for codesync
//!
//! This crate ties the Layer 0 crates together:
//!
//! - **Configuration**: the YAML project file and its tracked items
//! - **State store**: one JSON record per item with what the last run knew
//! - **SyncEngine**: drift detection, apply, conflict flagging and manual
//!   resolution
//!
//! # Architecture
//!
//! ```text
//!                       codesync-cli
//!                            |
//!                      codesync-core
//!                            |
//!        +-------------------+-------------------+
//!        |                   |                   |
//!   codesync-fs      codesync-content      codesync-git
//! ```

pub mod config;
pub mod error;
pub mod state;
pub mod sync;

pub use config::{CONFIG_FILE, Config, SourceSpec, TargetKind, TargetSpec, TrackedItem};
pub use error::{Error, ErrorKind, Result};
pub use state::{SyncState, SyncStateStore};
pub use sync::{Drift, ItemFailure, Resolution, SyncEngine, SyncOptions, SyncReport, SyncStatus};
