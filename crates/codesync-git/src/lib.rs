//! Upstream repository access for codesync
//!
//! The sync engine talks to upstream repositories only through the
//! [`RepositoryClient`] capability. [`GitMirrorClient`] serves it from local
//! git clones with `git2`.

pub mod commits;
pub mod error;
pub mod mirror;
pub mod provider;

pub use error::{Error, Result};
pub use mirror::GitMirrorClient;
pub use provider::{
    CommitInfo, RefDiff, RemoteDirectory, RemoteFile, RepoRef, RepositoryClient, short_id,
};
