//! Project configuration
//!
//! A YAML document listing the tracked items of one project. Relative paths
//! inside it resolve against the directory holding the file.

mod item;

pub use item::{SourceSpec, TargetKind, TargetSpec, TrackedItem};

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use codesync_fs::NormalizedPath;

use crate::{Error, Result};

/// Default configuration file name
pub const CONFIG_FILE: &str = "codesync.yaml";

fn default_state_dir() -> String {
    ".codesync".to_string()
}

/// Parsed project configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub project_name: String,

    /// Directory of per-item state records
    #[serde(default = "default_state_dir")]
    pub state_dir: String,

    /// Root of local upstream mirrors, `<root>/<owner>/<repo>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirror_root: Option<String>,

    /// Report drift without ever writing targets
    #[serde(default)]
    pub notify_only: bool,

    #[serde(default)]
    pub items: Vec<TrackedItem>,

    #[serde(skip)]
    base_dir: Option<NormalizedPath>,
}

impl Config {
    /// Parse configuration from YAML content.
    ///
    /// Relative paths resolve against the current directory until
    /// [`Config::with_base_dir`] says otherwise.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Load and parse a configuration file.
    pub fn load(path: &NormalizedPath) -> Result<Self> {
        let content = codesync_fs::io::read_text(path)?;
        let config = Self::parse(&content)?.with_base_dir(path.parent());
        tracing::debug!(path = %path, items = config.items.len(), "Loaded configuration");
        Ok(config)
    }

    pub fn with_base_dir(mut self, dir: NormalizedPath) -> Self {
        self.base_dir = Some(dir);
        self
    }

    /// Directory relative paths are resolved against.
    pub fn base_dir(&self) -> NormalizedPath {
        self.base_dir
            .clone()
            .unwrap_or_else(|| NormalizedPath::new("."))
    }

    pub fn state_dir_path(&self) -> NormalizedPath {
        NormalizedPath::new(&self.state_dir).resolve_against(&self.base_dir())
    }

    /// Mirror root, defaulting to `mirrors` inside the state directory.
    pub fn mirror_root_path(&self) -> NormalizedPath {
        match &self.mirror_root {
            Some(root) => NormalizedPath::new(root).resolve_against(&self.base_dir()),
            None => self.state_dir_path().join("mirrors"),
        }
    }

    pub fn item(&self, name: &str) -> Option<&TrackedItem> {
        self.items.iter().find(|item| item.name == name)
    }

    pub fn enabled_items(&self) -> impl Iterator<Item = &TrackedItem> {
        self.items.iter().filter(|item| item.enabled())
    }

    /// Check the configuration as a whole and every enabled item.
    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(Error::invalid(None, "config version is required"));
        }
        if self.items.is_empty() {
            return Err(Error::invalid(None, "no sync items defined"));
        }

        let mut seen = HashSet::new();
        for item in &self.items {
            if item.name.trim().is_empty() {
                return Err(Error::invalid(None, "every item needs a name"));
            }
            if !seen.insert(item.name.as_str()) {
                return Err(Error::invalid(Some(item.name.as_str()), "duplicate item name"));
            }
            if item.enabled() {
                item.validate()?;
            }
        }
        Ok(())
    }
}
