//! Resolve command implementation

use std::path::Path;

use codesync_core::Resolution;

use super::sync::print_report;
use super::{engine_for, find_item, load_config};
use crate::error::Result;

/// Run the resolve command
pub fn run_resolve(config_path: &Path, name: &str, resolution: Resolution) -> Result<()> {
    let config = load_config(config_path)?;
    let engine = engine_for(&config);
    let item = find_item(&config, name)?;

    match engine.resolve(item, resolution) {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(failure) => Err(failure.error.into()),
    }
}
