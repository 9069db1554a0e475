//! SyncEngine for keeping tracked items in step with their upstream sources
//!
//! This module provides:
//! - **drift**: tri-state local and remote change detection
//! - **engine**: the per-item state machine, batch runs, manual resolution
//! - **report**: per-item outcomes handed to the CLI

mod drift;
mod engine;
mod report;

pub use drift::Drift;
pub use engine::{Resolution, SyncEngine, SyncOptions};
pub use report::{ItemFailure, SyncReport, SyncStatus};
