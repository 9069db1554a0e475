//! Shared test utilities for the codesync workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`git`]: real git repositories with scripted history, laid out as
//!   upstream mirrors
//! - [`memory`]: [`MemoryRepositoryClient`], an in-memory upstream

pub mod git;
pub mod memory;

pub use git::{GitFixture, MirrorRoot};
pub use memory::MemoryRepositoryClient;
