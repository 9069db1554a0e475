//! Diff command implementation
//!
//! Shows how an item's local content differs from upstream.

use std::path::Path;

use colored::Colorize;

use super::{engine_for, find_item, load_config};
use crate::error::Result;

/// Run the diff command
pub fn run_diff(config_path: &Path, name: &str, no_color: bool) -> Result<()> {
    if no_color {
        colored::control::set_override(false);
    }
    let config = load_config(config_path)?;
    let engine = engine_for(&config);
    let item = find_item(&config, name)?;

    let diffs = engine.preview_item(item)?;
    if diffs.is_empty() {
        println!("{} '{}' matches upstream.", "OK".green().bold(), name);
        return Ok(());
    }

    for (path, result) in &diffs {
        println!("{} {}", "---".blue().bold(), path.cyan());
        print!("{}", result.render(!no_color));
    }
    Ok(())
}
