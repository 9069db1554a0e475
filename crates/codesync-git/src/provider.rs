//! Repository client capability used by the sync engine

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;

/// An upstream repository, `owner/repo`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// A file's content at a resolved commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub path: String,
    pub content: String,
    /// Full id of the commit the reference resolved to
    pub commit_id: String,
}

/// Every file below a directory at a resolved commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteDirectory {
    /// Paths relative to the requested directory, `/`-separated
    pub files: BTreeMap<String, String>,
    pub commit_id: String,
}

/// Information about a single upstream commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    /// Full commit id
    pub id: String,

    /// First line of the commit message
    pub message: String,

    /// Commit author name
    pub author: String,

    /// Commit timestamp
    pub timestamp: DateTime<Utc>,
}

/// Abbreviate a commit id for display. Shorter ids are returned as is.
pub fn short_id(id: &str) -> &str {
    id.get(..7).unwrap_or(id)
}

impl CommitInfo {
    /// Abbreviated id for display (7 characters).
    pub fn short_id(&self) -> &str {
        short_id(&self.id)
    }

    /// True when `id` names this commit, fully or as a prefix of at least
    /// 7 characters.
    pub fn matches(&self, id: &str) -> bool {
        self.id == id || (id.len() >= 7 && self.id.starts_with(id))
    }
}

/// Upstream change of a path between two references
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefDiff {
    /// Unified patch text
    Patch(String),
    /// The path changed but no text diff is available (binary or mode change)
    ChangedWithoutText,
    Unchanged,
}

impl RefDiff {
    pub fn patch(&self) -> Option<&str> {
        match self {
            Self::Patch(text) => Some(text),
            _ => None,
        }
    }
}

/// Read-only access to upstream repositories.
///
/// Calls are idempotent; the engine holds one client for the whole run and
/// shares it across items.
pub trait RepositoryClient: Send + Sync {
    /// Content of `path` at `reference` (branch, tag or commit id).
    fn fetch_file(&self, repo: &RepoRef, path: &str, reference: &str) -> Result<RemoteFile>;

    /// All text files below `path` at `reference`.
    fn fetch_directory(&self, repo: &RepoRef, path: &str, reference: &str)
    -> Result<RemoteDirectory>;

    /// Commits on `branch` that touched `path`, newest first.
    ///
    /// The walk stops before `since_commit` when it is given, and skips
    /// commits older than `since` when that is given.
    fn commits_since(
        &self,
        repo: &RepoRef,
        branch: &str,
        path: &str,
        since: Option<DateTime<Utc>>,
        since_commit: Option<&str>,
    ) -> Result<Vec<CommitInfo>>;

    /// Change to `path` between the `base` and `head` references.
    fn diff_between_refs(&self, repo: &RepoRef, path: &str, base: &str, head: &str)
    -> Result<RefDiff>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn commit(id: &str) -> CommitInfo {
        CommitInfo {
            id: id.to_string(),
            message: "msg".to_string(),
            author: "a".to_string(),
            timestamp: Utc.timestamp_opt(0, 0).unwrap(),
        }
    }

    #[test]
    fn short_prefix_does_not_match() {
        let c = commit("0123456789abcdef");
        assert!(c.matches("0123456789abcdef"));
        assert!(c.matches("0123456"));
        assert!(!c.matches("0123"));
        assert_eq!(c.short_id(), "0123456");
    }

    #[test]
    fn short_id_keeps_short_ids_whole() {
        assert_eq!(short_id("abc"), "abc");
        assert_eq!(short_id(""), "");
    }

    #[test]
    fn repo_ref_display() {
        assert_eq!(RepoRef::new("octo", "tools").to_string(), "octo/tools");
    }
}
