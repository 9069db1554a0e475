//! Local and remote drift detection
//!
//! Each side yields a tri-state signal. A failure on one side is recorded
//! in the report and turns that signal into [`Drift::Unknown`]; it never
//! stops the other side from being checked.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use codesync_content::extract_function;
use codesync_fs::{Fingerprint, NormalizedPath, fingerprint, fingerprint_tree};
use codesync_git::{CommitInfo, RefDiff, RepositoryClient};

use super::report::SyncReport;
use crate::Result;
use crate::config::{TargetKind, TrackedItem};
use crate::state::SyncState;

/// Whether one side changed since the last sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Drift {
    Clean,
    Dirty,
    /// The side could not be inspected
    Unknown,
}

impl Drift {
    pub fn is_dirty(&self) -> bool {
        matches!(self, Self::Dirty)
    }
}

/// Content of a target or of its upstream source
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Content {
    Text(String),
    Tree(BTreeMap<String, String>),
}

impl Content {
    pub(crate) fn fingerprint(&self) -> Fingerprint {
        match self {
            Self::Text(text) => fingerprint(text),
            Self::Tree(files) => fingerprint_tree(files),
        }
    }
}

/// Local side of a run
pub(crate) struct LocalSnapshot {
    pub drift: Drift,
    /// Current target content; `None` when missing or unreadable
    pub content: Option<Content>,
    pub fingerprint: Option<Fingerprint>,
}

impl LocalSnapshot {
    fn unknown(content: Option<Content>) -> Self {
        Self {
            drift: Drift::Unknown,
            content,
            fingerprint: None,
        }
    }
}

/// Remote side of a run
#[derive(Default)]
pub(crate) struct RemoteSnapshot {
    pub drift: Option<Drift>,
    /// Commit the fetched content belongs to
    pub commit_id: Option<String>,
    pub content: Option<Content>,
    pub fingerprint: Option<Fingerprint>,
    pub commits: Vec<CommitInfo>,
    pub upstream_patch: Option<String>,
}

impl RemoteSnapshot {
    pub(crate) fn drift(&self) -> Drift {
        self.drift.unwrap_or(Drift::Unknown)
    }

    fn with_drift(drift: Drift) -> Self {
        Self {
            drift: Some(drift),
            ..Default::default()
        }
    }
}

/// Whether two commit ids name the same commit, allowing abbreviations.
pub(crate) fn same_commit(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    short == long || (short.len() >= 7 && long.starts_with(short))
}

/// Read the target. `Ok(None)` when it does not exist.
pub(crate) fn read_local(item: &TrackedItem, target: &NormalizedPath) -> Result<Option<Content>> {
    match item.kind() {
        TargetKind::Directory => {
            if !target.exists() {
                return Ok(None);
            }
            Ok(Some(Content::Tree(codesync_fs::io::read_tree(target)?)))
        }
        TargetKind::File | TargetKind::Function => match codesync_fs::io::read_text(target) {
            Ok(text) => Ok(Some(Content::Text(text))),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        },
    }
}

/// Fingerprint of the part of `content` the item tracks: the whole file or
/// tree, or only the function for function targets.
pub(crate) fn tracked_fingerprint(item: &TrackedItem, content: &Content) -> Result<Fingerprint> {
    match (item.kind(), content) {
        (TargetKind::Function, Content::Text(text)) => {
            let (language, name) = item.function()?;
            Ok(fingerprint(&extract_function(language, text, name)?))
        }
        _ => Ok(content.fingerprint()),
    }
}

pub(crate) fn detect_local(
    item: &TrackedItem,
    target: &NormalizedPath,
    state: &SyncState,
    report: &mut SyncReport,
) -> LocalSnapshot {
    let stored = state.current_local_hash.as_str();

    let content = match read_local(item, target) {
        Ok(Some(content)) => content,
        Ok(None) if stored.is_empty() => {
            debug!(target = %target, "Target missing before first sync");
            return LocalSnapshot {
                drift: Drift::Clean,
                content: None,
                fingerprint: None,
            };
        }
        Ok(None) => {
            report.error(format!("Error checking local changes: {target} is missing"));
            return LocalSnapshot::unknown(None);
        }
        Err(e) => {
            report.error(format!("Error checking local changes: {e}"));
            return LocalSnapshot::unknown(None);
        }
    };

    match tracked_fingerprint(item, &content) {
        Ok(current) => {
            // Without a baseline an existing target counts as changed until
            // it is compared with upstream
            let drift = if current.matches(stored) {
                Drift::Clean
            } else {
                Drift::Dirty
            };
            debug!(?drift, fingerprint = %current, "Checked local content");
            LocalSnapshot {
                drift,
                content: Some(content),
                fingerprint: Some(current),
            }
        }
        Err(e) => {
            report.error(format!("Error checking local changes: {e}"));
            LocalSnapshot::unknown(Some(content))
        }
    }
}

/// Settle the drift of a target that existed before any baseline was
/// recorded: it is clean only when it already matches the upstream content.
pub(crate) fn settle_unbaselined(
    item: &TrackedItem,
    state: &SyncState,
    local: &mut LocalSnapshot,
    remote: &RemoteSnapshot,
) {
    if !state.current_local_hash.is_empty() || local.drift != Drift::Dirty {
        return;
    }
    let (Some(current), Some(upstream)) = (&local.fingerprint, &remote.content) else {
        return;
    };
    match tracked_fingerprint(item, upstream) {
        Ok(expected) if current.matches(expected.as_str()) => {
            debug!("Existing target already matches upstream");
            local.drift = Drift::Clean;
        }
        Ok(_) => debug!("Existing target differs from upstream"),
        Err(e) => debug!(error = %e, "Existing target not compared with upstream"),
    }
}

/// Fetch the upstream content of `item` at `reference`.
pub(crate) fn fetch_content(
    client: &dyn RepositoryClient,
    item: &TrackedItem,
    reference: &str,
) -> codesync_git::Result<(String, Content)> {
    let repo = item.source.repo_ref();
    match item.kind() {
        TargetKind::Directory => {
            let dir = client.fetch_directory(&repo, &item.source.path, reference)?;
            Ok((dir.commit_id, Content::Tree(dir.files)))
        }
        TargetKind::File | TargetKind::Function => {
            let file = client.fetch_file(&repo, &item.source.path, reference)?;
            Ok((file.commit_id, Content::Text(file.content)))
        }
    }
}

pub(crate) fn detect_remote(
    client: &dyn RepositoryClient,
    item: &TrackedItem,
    state: &SyncState,
    report: &mut SyncReport,
) -> RemoteSnapshot {
    let last_seen = state.last_commit_id.as_str();

    if let Some(pin) = item.source.pinned_revision() {
        return detect_pinned(client, item, pin, last_seen, report);
    }

    let repo = item.source.repo_ref();
    let since = (!last_seen.is_empty()).then_some(last_seen);
    let commits = match client.commits_since(
        &repo,
        &item.source.branch,
        &item.source.path,
        None,
        since,
    ) {
        Ok(commits) => commits,
        Err(e) => {
            report.error(format!("Error checking remote changes: {e}"));
            return RemoteSnapshot::with_drift(Drift::Unknown);
        }
    };

    let Some(newest) = commits.first() else {
        debug!(branch = %item.source.branch, "No upstream commits since last sync");
        return RemoteSnapshot::with_drift(Drift::Clean);
    };
    if same_commit(&newest.id, last_seen) {
        return RemoteSnapshot {
            commits,
            ..RemoteSnapshot::with_drift(Drift::Clean)
        };
    }

    let newest_id = newest.id.clone();
    let (commit_id, content) = match fetch_content(client, item, &newest_id) {
        Ok(fetched) => fetched,
        Err(e) => {
            report.error(format!("Error checking remote changes: {e}"));
            return RemoteSnapshot {
                commits,
                ..RemoteSnapshot::with_drift(Drift::Unknown)
            };
        }
    };

    let upstream_patch = if last_seen.is_empty() {
        None
    } else {
        match client.diff_between_refs(&repo, &item.source.path, last_seen, &newest_id) {
            Ok(RefDiff::Patch(patch)) => Some(patch),
            Ok(RefDiff::ChangedWithoutText) => {
                report.notice("Upstream changed without a text diff");
                None
            }
            Ok(RefDiff::Unchanged) => None,
            Err(e) => {
                report.notice(format!("Upstream patch unavailable: {e}"));
                None
            }
        }
    };

    debug!(commits = commits.len(), newest = %newest_id, "Upstream moved");
    let remote_fingerprint = content.fingerprint();
    RemoteSnapshot {
        drift: Some(Drift::Dirty),
        commit_id: Some(commit_id),
        content: Some(content),
        fingerprint: Some(remote_fingerprint),
        commits,
        upstream_patch,
    }
}

/// A pinned revision replaces branch tracking: drift means the pin moved
/// away from the last reconciled commit.
fn detect_pinned(
    client: &dyn RepositoryClient,
    item: &TrackedItem,
    pin: &str,
    last_seen: &str,
    report: &mut SyncReport,
) -> RemoteSnapshot {
    let (commit_id, content) = match fetch_content(client, item, pin) {
        Ok(fetched) => fetched,
        Err(e) => {
            report.error(format!("Error checking remote changes: {e}"));
            return RemoteSnapshot::with_drift(Drift::Unknown);
        }
    };
    let remote_fingerprint = content.fingerprint();

    let drift = if same_commit(&commit_id, last_seen) {
        Drift::Clean
    } else if remote_fingerprint.matches(pin) {
        warn!(
            pin,
            "Pinned revision equals the content fingerprint; treating upstream as unchanged"
        );
        Drift::Clean
    } else {
        Drift::Dirty
    };

    RemoteSnapshot {
        drift: Some(drift),
        commit_id: Some(commit_id),
        content: Some(content),
        fingerprint: Some(remote_fingerprint),
        commits: Vec::new(),
        upstream_patch: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abbreviated_ids_match() {
        assert!(same_commit("0123456789abcdef", "0123456"));
        assert!(same_commit("0123456", "0123456789abcdef"));
        assert!(!same_commit("0123456789abcdef", "0123"));
        assert!(!same_commit("abc", ""));
    }
}
