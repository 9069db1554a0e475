//! codesync CLI
//!
//! Keeps tracked files, directories and functions in step with the upstream
//! repositories they were copied from.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use codesync_core::Resolution;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(cmd) => execute_command(&cli.config, cmd),
        None => {
            println!("{} keeps vendored code in sync", "codesync".green().bold());
            println!();
            println!("Run {} for available commands.", "codesync --help".cyan());
            Ok(())
        }
    }
}

/// Log to stderr; `--verbose` forces debug, otherwise `RUST_LOG` or warn.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .try_init();
    tracing::debug!("Verbose mode enabled");
}

fn execute_command(config: &std::path::Path, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Sync { item, dry_run } => commands::run_sync(config, item.as_deref(), dry_run),
        Commands::Status { json } => commands::run_status(config, json),
        Commands::Diff { item, no_color } => commands::run_diff(config, &item, no_color),
        Commands::Resolve {
            item, keep_local, ..
        } => {
            let resolution = if keep_local {
                Resolution::KeepLocal
            } else {
                Resolution::TakeRemote
            };
            commands::run_resolve(config, &item, resolution)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_error_user() {
        let error = crate::error::CliError::user("test error");
        assert_eq!(format!("{}", error), "test error");
    }

    #[test]
    fn test_missing_config_is_user_error() {
        let temp = tempfile::TempDir::new().unwrap();
        let result = commands::run_status(&temp.path().join("codesync.yaml"), false);
        let message = result.unwrap_err().to_string();
        assert!(message.contains("No configuration found"), "{message}");
    }
}
