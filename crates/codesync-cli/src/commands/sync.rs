//! Sync command implementation

use std::path::Path;

use colored::{ColoredString, Colorize};

use codesync_core::{SyncOptions, SyncReport, SyncStatus};

use super::{engine_for, find_item, load_config};
use crate::error::{CliError, Result};

/// Run the sync command
///
/// Fails when any item reported errors, after every item has run.
pub fn run_sync(config_path: &Path, item: Option<&str>, dry_run: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let engine = engine_for(&config);
    let options = SyncOptions { dry_run };

    println!(
        "{} Synchronizing tracked items{}...",
        "=>".blue().bold(),
        if dry_run { " (dry run)" } else { "" }
    );

    let reports = match item {
        Some(name) => {
            let item = find_item(&config, name)?;
            if !item.enabled() {
                return Err(CliError::user(format!("Item '{name}' is disabled")));
            }
            let report = engine
                .sync_item(item, &options)
                .unwrap_or_else(|failure| failure.into_report());
            vec![report]
        }
        None => engine.sync_all(&config, &options),
    };

    for report in &reports {
        print_report(report);
    }

    if reports.iter().any(|r| r.status == SyncStatus::Conflict) {
        println!();
        println!(
            "Run {} to settle conflicts.",
            "codesync resolve <item> --keep-local | --take-remote".cyan()
        );
    }

    let failed = reports.iter().filter(|r| r.has_errors()).count();
    if failed > 0 {
        return Err(CliError::user(format!("{failed} item(s) reported errors")));
    }
    Ok(())
}

/// One status line per item, then its files, notices and errors.
pub(crate) fn print_report(report: &SyncReport) {
    println!("{} {}", status_label(report.status), report.item.name.bold());
    for commit in &report.commits {
        println!("   {} {} {}", "*".cyan(), commit.short_id().dimmed(), commit.message);
    }
    for path in &report.updated_files {
        println!("   {} {}", "+".green(), path);
    }
    for notice in &report.notices {
        println!("   {} {}", "-".yellow(), notice);
    }
    for error in &report.errors {
        println!("   {} {}", "!".red(), error);
    }
}

pub(crate) fn status_label(status: SyncStatus) -> ColoredString {
    let label = format!("{:>13}", status.to_string().to_uppercase());
    match status {
        SyncStatus::Clean => label.green(),
        SyncStatus::Applied => label.green().bold(),
        SyncStatus::LocalDirty | SyncStatus::RemoteDirty => label.yellow().bold(),
        SyncStatus::Conflict => label.red().bold(),
    }
}
