//! Command implementations for codesync-cli

pub mod diff;
pub mod resolve;
pub mod status;
pub mod sync;

pub use diff::run_diff;
pub use resolve::run_resolve;
pub use status::run_status;
pub use sync::run_sync;

use std::path::Path;
use std::sync::Arc;

use codesync_core::{Config, SyncEngine, TrackedItem};
use codesync_fs::NormalizedPath;
use codesync_git::GitMirrorClient;

use crate::error::{CliError, Result};

/// Load and validate the project configuration.
pub fn load_config(path: &Path) -> Result<Config> {
    let path = NormalizedPath::new(path);
    if !path.exists() {
        return Err(CliError::user(format!("No configuration found at {path}")));
    }
    let config = Config::load(&path)?;
    config.validate()?;
    Ok(config)
}

/// Engine reading upstream from the project's local mirrors.
pub fn engine_for(config: &Config) -> SyncEngine {
    let client = Arc::new(GitMirrorClient::new(config.mirror_root_path()));
    SyncEngine::new(config, client)
}

pub fn find_item<'a>(config: &'a Config, name: &str) -> Result<&'a TrackedItem> {
    config
        .item(name)
        .ok_or_else(|| CliError::user(format!("Unknown item '{name}'")))
}
