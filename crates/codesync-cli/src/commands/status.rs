//! Status command implementation
//!
//! A dry run over every enabled item, reported as drift flags.

use std::path::Path;

use colored::Colorize;
use serde_json::json;

use codesync_core::{SyncOptions, SyncReport};
use codesync_git::short_id;

use super::sync::status_label;
use super::{engine_for, load_config};
use crate::error::Result;

/// Run the status command
pub fn run_status(config_path: &Path, json: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let engine = engine_for(&config);
    let reports = engine.sync_all(&config, &SyncOptions { dry_run: true });

    if json {
        let items: Vec<_> = reports.iter().map(report_json).collect();
        println!("{}", serde_json::to_string_pretty(&json!({ "items": items }))?);
        return Ok(());
    }

    if reports.is_empty() {
        println!("{} No enabled items.", "OK".green().bold());
        return Ok(());
    }

    for report in &reports {
        let state = &report.state;
        println!("{} {}", status_label(report.status), report.item.name.bold());
        println!(
            "   local: {}  remote: {}",
            flag(state.has_local_changes),
            flag(state.has_remote_changes)
        );
        let last_sync = state
            .last_sync
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "never".to_string());
        let commit = short_id(&state.last_commit_id);
        println!("   last sync: {}  commit: {}", last_sync, commit.dimmed());
        for error in &report.errors {
            println!("   {} {}", "!".red(), error);
        }
    }
    Ok(())
}

fn flag(changed: bool) -> colored::ColoredString {
    if changed {
        "changed".yellow()
    } else {
        "clean".green()
    }
}

fn report_json(report: &SyncReport) -> serde_json::Value {
    json!({
        "name": report.item.name,
        "status": report.status.to_string(),
        "hasLocalChanges": report.state.has_local_changes,
        "hasRemoteChanges": report.state.has_remote_changes,
        "lastSync": report.state.last_sync,
        "lastCommitID": report.state.last_commit_id,
        "pendingCommits": report.commits.len(),
        "errors": report.errors,
    })
}
