//! Per-item run reports

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use codesync_content::DiffResult;
use codesync_git::CommitInfo;

use crate::Error;
use crate::config::TrackedItem;
use crate::state::SyncState;

/// Outcome of one item's run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum SyncStatus {
    /// Neither side changed
    #[default]
    Clean,
    /// Only the local copy changed
    LocalDirty,
    /// Upstream changed but nothing was applied
    RemoteDirty,
    /// Both sides changed
    Conflict,
    /// Upstream changes were written to the target
    Applied,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Clean => "clean",
            Self::LocalDirty => "local changes",
            Self::RemoteDirty => "remote changes",
            Self::Conflict => "conflict",
            Self::Applied => "updated",
        };
        f.write_str(label)
    }
}

/// Everything a run learned and did for one item
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub item: TrackedItem,
    /// State as it stood at the end of the run
    pub state: SyncState,
    pub status: SyncStatus,
    /// Local paths written during the run
    pub updated_files: Vec<String>,
    /// Local-versus-remote diffs, keyed by local path
    pub diffs: BTreeMap<String, DiffResult>,
    pub errors: Vec<String>,
    /// Non-fatal remarks such as unsupported operations
    pub notices: Vec<String>,
    /// Upstream commits found since the last sync, newest first
    pub commits: Vec<CommitInfo>,
    /// Upstream patch between the last seen and the newest commit
    pub upstream_patch: Option<String>,
}

impl SyncReport {
    pub fn new(item: TrackedItem) -> Self {
        Self {
            item,
            state: SyncState::default(),
            status: SyncStatus::Clean,
            updated_files: Vec::new(),
            diffs: BTreeMap::new(),
            errors: Vec::new(),
            notices: Vec::new(),
            commits: Vec::new(),
            upstream_patch: None,
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub(crate) fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(item = %self.item.name, %message, "Recorded error");
        self.errors.push(message);
    }

    pub(crate) fn notice(&mut self, message: impl Into<String>) {
        self.notices.push(message.into());
    }
}

/// A run that ended in an error
///
/// The report holds everything gathered up to the failure, with the error
/// message already appended to its `errors`.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct ItemFailure {
    pub error: Error,
    pub report: SyncReport,
}

impl ItemFailure {
    pub fn into_report(self) -> SyncReport {
        self.report
    }
}
