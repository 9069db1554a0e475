//! Tracked item definitions

use serde::{Deserialize, Serialize};

use codesync_content::Language;
use codesync_fs::NormalizedPath;
use codesync_git::RepoRef;

use crate::{Error, Result};

fn default_branch() -> String {
    "main".to_string()
}

/// Where a tracked item comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
    #[serde(default)]
    pub owner: String,

    #[serde(default)]
    pub repo: String,

    /// File or directory path inside the upstream repository
    #[serde(default)]
    pub path: String,

    /// Branch to track
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Optional pinned commit; replaces branch-tip tracking when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
}

impl SourceSpec {
    pub fn repo_ref(&self) -> RepoRef {
        RepoRef::new(&self.owner, &self.repo)
    }

    /// The pinned revision, ignoring blank values.
    pub fn pinned_revision(&self) -> Option<&str> {
        self.revision.as_deref().map(str::trim).filter(|r| !r.is_empty())
    }
}

/// Shape of the local target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    File,
    Directory,
    Function,
}

/// Where a tracked item lives locally
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSpec {
    #[serde(default)]
    pub path: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TargetKind>,

    /// Language identifier, function targets only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Function name, function targets only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
}

/// One externally sourced fragment kept in sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedItem {
    /// Unique within a project; also keys the state record
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    pub source: SourceSpec,

    pub target: TargetSpec,

    #[serde(default)]
    pub disabled: bool,
}

impl TrackedItem {
    pub fn enabled(&self) -> bool {
        !self.disabled
    }

    /// Target kind, defaulting to a whole file.
    pub fn kind(&self) -> TargetKind {
        self.target.kind.unwrap_or(TargetKind::File)
    }

    /// Absolute (or base-relative) location of the target.
    pub fn target_path(&self, base_dir: &NormalizedPath) -> NormalizedPath {
        NormalizedPath::new(&self.target.path).resolve_against(base_dir)
    }

    /// Language and function name of a function target.
    pub fn function(&self) -> Result<(Language, &str)> {
        let language = self
            .target
            .language
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .ok_or_else(|| {
                Error::invalid(Some(self.name.as_str()), "function sync requires a language")
            })?;
        let language = Language::from_identifier(language).ok_or_else(|| {
            Error::invalid(Some(self.name.as_str()), format!("unsupported language '{language}'"))
        })?;
        let function = self
            .target
            .function
            .as_deref()
            .filter(|f| !f.trim().is_empty())
            .ok_or_else(|| {
                Error::invalid(Some(self.name.as_str()), "function sync requires a function name")
            })?;
        Ok((language, function))
    }

    /// Check the fields an enabled item needs.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| Error::invalid(Some(self.name.as_str()), message);

        if self.source.owner.is_empty() || self.source.repo.is_empty() || self.source.path.is_empty()
        {
            return Err(invalid("incomplete source configuration"));
        }
        if self.target.path.is_empty() || self.target.kind.is_none() {
            return Err(invalid("incomplete target configuration"));
        }
        if self.target.kind == Some(TargetKind::Function) {
            self.function()?;
        }
        Ok(())
    }
}
