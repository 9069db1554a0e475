//! Per-item sync state records
//!
//! Each tracked item owns one pretty-printed JSON file in the state
//! directory, keyed by the sanitized item name. Records are written
//! atomically; a sibling `.lock` file serializes runs on the same item.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use codesync_fs::{FileLock, NormalizedPath, sanitize_file_name};

use crate::{Error, Result};

/// What the engine last knew about one item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    /// End of the last completed run
    #[serde(default)]
    pub last_sync: Option<DateTime<Utc>>,

    /// Newest upstream commit already reconciled
    #[serde(rename = "lastCommitID", default)]
    pub last_commit_id: String,

    /// Fingerprint of the local content at the last sync
    #[serde(default)]
    pub current_local_hash: String,

    /// Fingerprint of the upstream content last fetched
    #[serde(default)]
    pub current_remote_hash: String,

    #[serde(default)]
    pub has_local_changes: bool,

    #[serde(default)]
    pub has_remote_changes: bool,
}

impl SyncState {
    /// True before the first successful sync of an item.
    pub fn is_new(&self) -> bool {
        self.last_sync.is_none() && self.last_commit_id.is_empty()
    }
}

/// Loads and saves [`SyncState`] records.
#[derive(Debug, Clone)]
pub struct SyncStateStore {
    dir: NormalizedPath,
}

impl SyncStateStore {
    pub fn new(dir: impl Into<NormalizedPath>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &NormalizedPath {
        &self.dir
    }

    /// Location of the record for `item`.
    pub fn path_for(&self, item: &str) -> NormalizedPath {
        self.dir.join(&format!("{}.json", sanitize_file_name(item)))
    }

    fn lock_path_for(&self, item: &str) -> NormalizedPath {
        self.dir.join(&format!("{}.lock", sanitize_file_name(item)))
    }

    /// Read the record for `item`.
    ///
    /// A missing record is [`Error::StateNotFound`]; an unparsable one is
    /// [`Error::Json`].
    pub fn load(&self, item: &str) -> Result<SyncState> {
        let path = self.path_for(item);
        let content = match codesync_fs::io::read_text(&path) {
            Ok(content) => content,
            Err(e) if e.is_not_found() => {
                return Err(Error::StateNotFound {
                    item: item.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&content)?)
    }

    /// Atomically replace the record for `item`.
    pub fn save(&self, item: &str, state: &SyncState) -> Result<()> {
        let mut content = serde_json::to_string_pretty(state)?;
        content.push('\n');
        codesync_fs::io::write_text(&self.path_for(item), &content)?;
        tracing::debug!(item, "Saved sync state");
        Ok(())
    }

    /// Block until this process holds the run lock of `item`.
    pub fn lock(&self, item: &str) -> Result<FileLock> {
        Ok(FileLock::acquire(&self.lock_path_for(item))?)
    }

    /// Names of the items with a record, as sanitized file stems.
    pub fn recorded_items(&self) -> Result<Vec<String>> {
        let dir = self.dir.to_native();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json")
                && let Some(stem) = path.file_stem()
            {
                names.push(stem.to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}
