//! [`RepositoryClient`] backed by local git mirrors
//!
//! Mirrors live at `<root>/<owner>/<repo>` and are ordinary (or bare)
//! clones kept up to date by whatever fetches them. This client only reads.

use std::path::Path;

use chrono::{DateTime, Utc};
use git2::{Commit, DiffFormat, DiffOptions, ObjectType, Repository, TreeWalkMode, TreeWalkResult};
use tracing::debug;

use codesync_fs::NormalizedPath;

use crate::commits::{commits_touching, entry_id};
use crate::provider::{CommitInfo, RefDiff, RemoteDirectory, RemoteFile, RepoRef, RepositoryClient};
use crate::{Error, Result};

/// Serves repository reads from local clones.
#[derive(Debug, Clone)]
pub struct GitMirrorClient {
    root: NormalizedPath,
}

impl GitMirrorClient {
    pub fn new(root: impl Into<NormalizedPath>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    /// Location of the mirror for `repo`.
    pub fn repository_path(&self, repo: &RepoRef) -> NormalizedPath {
        self.root.join(&repo.owner).join(&repo.repo)
    }

    fn open(&self, repo: &RepoRef) -> Result<Repository> {
        let path = self.repository_path(repo);
        Repository::open(path.to_native()).map_err(|e| {
            if e.code() == git2::ErrorCode::NotFound {
                Error::RepositoryNotFound {
                    path: path.to_native(),
                }
            } else {
                Error::Git(e)
            }
        })
    }
}

/// Resolve `reference` as given, then as a local branch, then as a branch
/// of `origin`.
fn resolve_commit<'r>(git: &'r Repository, repo: &RepoRef, reference: &str) -> Result<Commit<'r>> {
    if let Ok(object) = git.revparse_single(reference)
        && let Ok(commit) = object.peel_to_commit()
    {
        return Ok(commit);
    }

    for candidate in [
        format!("refs/heads/{reference}"),
        format!("refs/remotes/origin/{reference}"),
    ] {
        if let Ok(found) = git.find_reference(&candidate) {
            return Ok(found.peel_to_commit()?);
        }
    }

    Err(Error::ReferenceNotFound {
        repo: repo.to_string(),
        reference: reference.to_string(),
    })
}

fn blob_text(git: &Repository, repo: &RepoRef, path: &str, oid: git2::Oid) -> Result<String> {
    let blob = git.find_blob(oid)?;
    String::from_utf8(blob.content().to_vec()).map_err(|_| Error::NotText {
        repo: repo.to_string(),
        path: path.to_string(),
    })
}

fn clean_path(path: &str) -> &str {
    let trimmed = path.trim_matches('/');
    if trimmed == "." { "" } else { trimmed }
}

impl RepositoryClient for GitMirrorClient {
    fn fetch_file(&self, repo: &RepoRef, path: &str, reference: &str) -> Result<RemoteFile> {
        let git = self.open(repo)?;
        let commit = resolve_commit(&git, repo, reference)?;
        let path = clean_path(path);

        let tree = commit.tree()?;
        let entry = tree.get_path(Path::new(path)).map_err(|_| Error::PathNotFound {
            repo: repo.to_string(),
            reference: reference.to_string(),
            path: path.to_string(),
        })?;
        if entry.kind() != Some(ObjectType::Blob) {
            return Err(Error::WrongEntryKind {
                repo: repo.to_string(),
                path: path.to_string(),
                expected: "file",
            });
        }

        let content = blob_text(&git, repo, path, entry.id())?;
        debug!(repo = %repo, path, commit = %commit.id(), "Fetched file from mirror");
        Ok(RemoteFile {
            path: path.to_string(),
            content,
            commit_id: commit.id().to_string(),
        })
    }

    fn fetch_directory(
        &self,
        repo: &RepoRef,
        path: &str,
        reference: &str,
    ) -> Result<RemoteDirectory> {
        let git = self.open(repo)?;
        let commit = resolve_commit(&git, repo, reference)?;
        let path = clean_path(path);

        let root_tree = commit.tree()?;
        let tree = if path.is_empty() {
            root_tree
        } else {
            let entry = root_tree
                .get_path(Path::new(path))
                .map_err(|_| Error::PathNotFound {
                    repo: repo.to_string(),
                    reference: reference.to_string(),
                    path: path.to_string(),
                })?;
            if entry.kind() != Some(ObjectType::Tree) {
                return Err(Error::WrongEntryKind {
                    repo: repo.to_string(),
                    path: path.to_string(),
                    expected: "directory",
                });
            }
            git.find_tree(entry.id())?
        };

        // Collect blob ids first; the walk callback cannot propagate errors
        let mut blobs = Vec::new();
        tree.walk(TreeWalkMode::PreOrder, |parent, entry| {
            let name = entry.name().unwrap_or("");
            if name.starts_with('.') {
                return TreeWalkResult::Skip;
            }
            if entry.kind() == Some(ObjectType::Blob) {
                blobs.push((format!("{parent}{name}"), entry.id()));
            }
            TreeWalkResult::Ok
        })?;

        let mut files = std::collections::BTreeMap::new();
        for (relative, oid) in blobs {
            let content = blob_text(&git, repo, &relative, oid)?;
            files.insert(relative, content);
        }

        debug!(repo = %repo, path, files = files.len(), "Fetched directory from mirror");
        Ok(RemoteDirectory {
            files,
            commit_id: commit.id().to_string(),
        })
    }

    fn commits_since(
        &self,
        repo: &RepoRef,
        branch: &str,
        path: &str,
        since: Option<DateTime<Utc>>,
        since_commit: Option<&str>,
    ) -> Result<Vec<CommitInfo>> {
        let git = self.open(repo)?;
        let tip = resolve_commit(&git, repo, branch)?;
        commits_touching(&git, tip.id(), clean_path(path), since, since_commit)
    }

    fn diff_between_refs(
        &self,
        repo: &RepoRef,
        path: &str,
        base: &str,
        head: &str,
    ) -> Result<RefDiff> {
        let git = self.open(repo)?;
        let base_commit = resolve_commit(&git, repo, base)?;
        let head_commit = resolve_commit(&git, repo, head)?;
        let path = clean_path(path);

        if entry_id(&base_commit, path)? == entry_id(&head_commit, path)? {
            return Ok(RefDiff::Unchanged);
        }

        let mut opts = DiffOptions::new();
        if !path.is_empty() {
            opts.pathspec(path);
        }
        let diff = git.diff_tree_to_tree(
            Some(&base_commit.tree()?),
            Some(&head_commit.tree()?),
            Some(&mut opts),
        )?;

        let mut text = String::new();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            if matches!(line.origin(), '+' | '-' | ' ') {
                text.push(line.origin());
            }
            text.push_str(&String::from_utf8_lossy(line.content()));
            true
        })?;

        if text.contains("\n@@ ") || text.starts_with("@@ ") {
            Ok(RefDiff::Patch(text))
        } else {
            Ok(RefDiff::ChangedWithoutText)
        }
    }
}
