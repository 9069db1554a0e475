//! Git repositories with scripted history.
//!
//! Commits get strictly increasing timestamps so time-sorted revwalks are
//! deterministic.

use std::fs;
use std::path::{Path, PathBuf};

use git2::{Repository, RepositoryInitOptions, Signature, Time};
use tempfile::TempDir;

const EPOCH: i64 = 1_700_000_000;

/// A temporary directory holding mirrors at `<root>/<owner>/<repo>`.
pub struct MirrorRoot {
    temp_dir: TempDir,
}

impl Default for MirrorRoot {
    fn default() -> Self {
        Self::new()
    }
}

impl MirrorRoot {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Initialise an empty repository for `owner/repo` on branch `main`.
    pub fn repo(&self, owner: &str, repo: &str) -> GitFixture {
        GitFixture::init(&self.path().join(owner).join(repo))
    }
}

/// A real repository with a working tree, committed to through `git2`.
pub struct GitFixture {
    pub repo: Repository,
    workdir: PathBuf,
    clock: i64,
}

impl GitFixture {
    /// Initialise a repository at `path` whose first branch is `main`.
    ///
    /// # Panics
    /// Panics if `git2::Repository::init_opts` fails.
    pub fn init(path: &Path) -> Self {
        fs::create_dir_all(path)
            .unwrap_or_else(|e| panic!("GitFixture::init: failed to create {}: {e}", path.display()));
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Repository::init_opts(path, &opts).unwrap_or_else(|e| {
            panic!(
                "GitFixture::init: failed to init repository at {}: {e}",
                path.display()
            )
        });
        Self {
            repo,
            workdir: path.to_path_buf(),
            clock: EPOCH,
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Write `content` to `path` and commit it. Returns the commit id.
    pub fn commit_file(&mut self, path: &str, content: &str, message: &str) -> String {
        self.commit_files(&[(path, content)], message)
    }

    /// Write several files and commit them together. Returns the commit id.
    pub fn commit_files(&mut self, files: &[(&str, &str)], message: &str) -> String {
        let mut index = self.repo.index().unwrap();
        for (path, content) in files {
            let full = self.workdir.join(path);
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&full, content).unwrap();
            index.add_path(Path::new(path)).unwrap();
        }
        index.write().unwrap();
        self.commit_index(&mut index, message)
    }

    /// Delete `path` and commit the removal. Returns the commit id.
    pub fn remove_file(&mut self, path: &str, message: &str) -> String {
        let mut index = self.repo.index().unwrap();
        fs::remove_file(self.workdir.join(path)).unwrap();
        index.remove_path(Path::new(path)).unwrap();
        index.write().unwrap();
        self.commit_index(&mut index, message)
    }

    /// Create or move branch `name` to the current HEAD commit.
    pub fn branch(&self, name: &str) {
        let head = self.repo.head().unwrap().peel_to_commit().unwrap();
        self.repo.branch(name, &head, true).unwrap();
    }

    fn commit_index(&mut self, index: &mut git2::Index, message: &str) -> String {
        self.clock += 60;
        let sig = Signature::new("Test User", "test@test.com", &Time::new(self.clock, 0)).unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = self.repo.find_tree(tree_id).unwrap();

        let parent = self
            .repo
            .head()
            .ok()
            .and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        let oid = self
            .repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap();
        oid.to_string()
    }
}
