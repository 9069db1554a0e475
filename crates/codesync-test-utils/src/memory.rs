//! In-memory [`RepositoryClient`] with scripted history.
//!
//! Each repository is a single linear history; every commit stores a full
//! snapshot of its files. Any reference that is not a known commit id
//! resolves to the newest commit, so branch names are accepted but not
//! distinguished.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, TimeZone, Utc};

use codesync_git::{
    CommitInfo, Error, RefDiff, RemoteDirectory, RemoteFile, RepoRef, RepositoryClient, Result,
};

struct MemoryCommit {
    info: CommitInfo,
    files: BTreeMap<String, String>,
}

#[derive(Default)]
struct State {
    repos: HashMap<RepoRef, Vec<MemoryCommit>>,
    next_id: u64,
    failure: Option<String>,
    calls: usize,
}

/// Scripted upstream for engine tests.
#[derive(Default)]
pub struct MemoryRepositoryClient {
    state: Mutex<State>,
}

impl MemoryRepositoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Commit `files` on top of the latest snapshot of `repo`. Returns the
    /// new commit id.
    pub fn commit(&self, repo: &RepoRef, message: &str, files: &[(&str, &str)]) -> String {
        let mut state = self.state();
        state.next_id += 1;
        let id = format!("{:040x}", state.next_id);
        let timestamp = Utc.timestamp_opt(1_700_000_000, 0).unwrap()
            + Duration::minutes(state.next_id as i64);

        let history = state.repos.entry(repo.clone()).or_default();
        let mut snapshot = history.last().map(|c| c.files.clone()).unwrap_or_default();
        for (path, content) in files {
            snapshot.insert(path.to_string(), content.to_string());
        }
        history.push(MemoryCommit {
            info: CommitInfo {
                id: id.clone(),
                message: message.to_string(),
                author: "Test User".to_string(),
                timestamp,
            },
            files: snapshot,
        });
        id
    }

    /// Make every following call fail with [`Error::Unavailable`].
    pub fn fail_with(&self, message: &str) {
        self.state().failure = Some(message.to_string());
    }

    pub fn recover(&self) {
        self.state().failure = None;
    }

    /// Number of client calls made so far.
    pub fn calls(&self) -> usize {
        self.state().calls
    }

    /// Run `f` on the history of `repo` after the failure check.
    fn with_history<T>(
        &self,
        repo: &RepoRef,
        f: impl FnOnce(&[MemoryCommit]) -> Result<T>,
    ) -> Result<T> {
        let mut state = self.state();
        state.calls += 1;
        if let Some(message) = &state.failure {
            return Err(Error::Unavailable {
                message: message.clone(),
            });
        }
        match state.repos.get(repo) {
            Some(history) if !history.is_empty() => f(history),
            _ => Err(Error::Unavailable {
                message: format!("unknown repository {repo}"),
            }),
        }
    }
}

fn resolve<'h>(history: &'h [MemoryCommit], reference: &str) -> &'h MemoryCommit {
    history
        .iter()
        .find(|c| c.info.matches(reference))
        .unwrap_or_else(|| &history[history.len() - 1])
}

fn in_dir<'a>(path: &'a str, dir: &str) -> Option<&'a str> {
    let dir = dir.trim_matches('/');
    if dir.is_empty() || dir == "." {
        return Some(path);
    }
    path.strip_prefix(dir)?.strip_prefix('/')
}

/// Files at or below `path` in a snapshot.
fn select<'a>(files: &'a BTreeMap<String, String>, path: &str) -> BTreeMap<&'a str, &'a str> {
    files
        .iter()
        .filter(|(p, _)| p.as_str() == path || in_dir(p, path).is_some())
        .map(|(p, c)| (p.as_str(), c.as_str()))
        .collect()
}

impl RepositoryClient for MemoryRepositoryClient {
    fn fetch_file(&self, repo: &RepoRef, path: &str, reference: &str) -> Result<RemoteFile> {
        self.with_history(repo, |history| {
            let commit = resolve(history, reference);
            let content = commit.files.get(path).ok_or_else(|| Error::PathNotFound {
                repo: repo.to_string(),
                reference: reference.to_string(),
                path: path.to_string(),
            })?;
            Ok(RemoteFile {
                path: path.to_string(),
                content: content.clone(),
                commit_id: commit.info.id.clone(),
            })
        })
    }

    fn fetch_directory(
        &self,
        repo: &RepoRef,
        path: &str,
        reference: &str,
    ) -> Result<RemoteDirectory> {
        self.with_history(repo, |history| {
            let commit = resolve(history, reference);
            let files: BTreeMap<String, String> = commit
                .files
                .iter()
                .filter_map(|(p, c)| in_dir(p, path).map(|rel| (rel.to_string(), c.clone())))
                .collect();
            if files.is_empty() {
                return Err(Error::PathNotFound {
                    repo: repo.to_string(),
                    reference: reference.to_string(),
                    path: path.to_string(),
                });
            }
            Ok(RemoteDirectory {
                files,
                commit_id: commit.info.id.clone(),
            })
        })
    }

    fn commits_since(
        &self,
        repo: &RepoRef,
        _branch: &str,
        path: &str,
        since: Option<DateTime<Utc>>,
        since_commit: Option<&str>,
    ) -> Result<Vec<CommitInfo>> {
        self.with_history(repo, |history| {
            let mut commits = Vec::new();
            for (idx, commit) in history.iter().enumerate().rev() {
                if since_commit.is_some_and(|id| commit.info.matches(id)) {
                    break;
                }
                if since.is_some_and(|t| commit.info.timestamp < t) {
                    break;
                }
                let before = match idx {
                    0 => BTreeMap::new(),
                    _ => select(&history[idx - 1].files, path),
                };
                if select(&commit.files, path) != before {
                    commits.push(commit.info.clone());
                }
            }
            Ok(commits)
        })
    }

    fn diff_between_refs(
        &self,
        repo: &RepoRef,
        path: &str,
        base: &str,
        head: &str,
    ) -> Result<RefDiff> {
        self.with_history(repo, |history| {
            let old = select(&resolve(history, base).files, path);
            let new = select(&resolve(history, head).files, path);
            if old == new {
                return Ok(RefDiff::Unchanged);
            }

            let mut patch = String::new();
            let paths: std::collections::BTreeSet<&str> =
                old.keys().chain(new.keys()).copied().collect();
            for file in paths {
                let a = old.get(file).copied().unwrap_or("");
                let b = new.get(file).copied().unwrap_or("");
                patch.push_str(&codesync_content::unified_patch(
                    a,
                    b,
                    &format!("a/{file}"),
                    &format!("b/{file}"),
                ));
            }
            Ok(RefDiff::Patch(patch))
        })
    }
}
