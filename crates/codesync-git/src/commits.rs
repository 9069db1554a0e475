//! Commit history walks over a git repository.

use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use git2::{Commit, Oid, Repository};

use crate::Result;
use crate::provider::CommitInfo;

/// Convert a git2 commit into a [`CommitInfo`].
pub fn commit_info(commit: &Commit<'_>) -> CommitInfo {
    let timestamp: DateTime<Utc> = Utc
        .timestamp_opt(commit.time().seconds(), 0)
        .single()
        .unwrap_or_default();

    let message = commit
        .message()
        .unwrap_or("")
        .lines()
        .next()
        .unwrap_or("")
        .to_string();

    let author = commit.author();
    let author_name = author.name().unwrap_or("Unknown").to_string();

    CommitInfo {
        id: commit.id().to_string(),
        message,
        author: author_name,
        timestamp,
    }
}

/// Id of the tree entry at `path` in `commit`, if any. An empty path or
/// `.` names the root tree.
pub fn entry_id(commit: &Commit<'_>, path: &str) -> Result<Option<Oid>> {
    let tree = commit.tree()?;
    let path = path.trim_matches('/');
    if path.is_empty() || path == "." {
        return Ok(Some(tree.id()));
    }
    match tree.get_path(Path::new(path)) {
        Ok(entry) => Ok(Some(entry.id())),
        Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Whether `commit` changed `path` relative to its first parent.
pub fn touches_path(commit: &Commit<'_>, path: &str) -> Result<bool> {
    let current = entry_id(commit, path)?;
    let previous = match commit.parent(0) {
        Ok(parent) => entry_id(&parent, path)?,
        Err(_) => None,
    };
    Ok(current != previous)
}

/// Walk history from `tip`, newest first, keeping commits that touched
/// `path`.
///
/// Stops before the commit matching `since_commit` and at the first commit
/// older than `since`.
pub fn commits_touching(
    repo: &Repository,
    tip: Oid,
    path: &str,
    since: Option<DateTime<Utc>>,
    since_commit: Option<&str>,
) -> Result<Vec<CommitInfo>> {
    let mut revwalk = repo.revwalk()?;
    revwalk.push(tip)?;
    revwalk.set_sorting(git2::Sort::TIME)?;

    let mut commits = Vec::new();

    for oid_result in revwalk {
        let oid = oid_result?;
        let commit = repo.find_commit(oid)?;
        let info = commit_info(&commit);

        if since_commit.is_some_and(|id| info.matches(id)) {
            break;
        }
        if since.is_some_and(|t| info.timestamp < t) {
            break;
        }
        if touches_path(&commit, path)? {
            commits.push(info);
        }
    }

    tracing::debug!(path, count = commits.len(), "Walked commit history");
    Ok(commits)
}
