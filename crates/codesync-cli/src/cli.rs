//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// codesync - Keep vendored code in step with its upstream source
#[derive(Parser, Debug)]
#[command(name = "codesync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the project configuration file
    #[arg(short, long, global = true, env = "CODESYNC_CONFIG", default_value = "codesync.yaml")]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Pull upstream changes into tracked items
    ///
    /// Items changed only upstream are updated. Local edits and conflicts
    /// are reported and left alone.
    ///
    /// Examples:
    ///   codesync sync                  # All enabled items
    ///   codesync sync --item utils     # One item
    ///   codesync sync --dry-run        # Report without writing
    Sync {
        /// Only sync this item
        #[arg(short, long)]
        item: Option<String>,

        /// Preview changes without applying them
        #[arg(long)]
        dry_run: bool,
    },

    /// Show drift of every enabled item without changing anything
    Status {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show the diff between an item's local content and upstream
    Diff {
        /// Item name
        item: String,

        /// Print plain text without colors
        #[arg(long)]
        no_color: bool,
    },

    /// Settle an item whose local and upstream content both changed
    Resolve {
        /// Item name
        item: String,

        /// Keep the local content and mark upstream as seen
        #[arg(long, conflicts_with = "take_remote", required_unless_present = "take_remote")]
        keep_local: bool,

        /// Overwrite the local content with upstream
        #[arg(long)]
        take_remote: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_no_args() {
        let cli = Cli::parse_from(["codesync"]);
        assert!(!cli.verbose);
        assert!(cli.command.is_none());
        assert_eq!(cli.config, PathBuf::from("codesync.yaml"));
    }

    #[test]
    fn parse_global_flags_after_command() {
        let cli = Cli::parse_from(["codesync", "status", "-v", "--config", "sub/codesync.yaml"]);
        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from("sub/codesync.yaml"));
        assert_eq!(cli.command, Some(Commands::Status { json: false }));
    }

    #[test]
    fn parse_sync_options() {
        let cli = Cli::parse_from(["codesync", "sync", "--item", "utils", "--dry-run"]);
        assert_eq!(
            cli.command,
            Some(Commands::Sync {
                item: Some("utils".to_string()),
                dry_run: true,
            })
        );
    }

    #[test]
    fn parse_diff_command() {
        let cli = Cli::parse_from(["codesync", "diff", "utils", "--no-color"]);
        match cli.command {
            Some(Commands::Diff { item, no_color }) => {
                assert_eq!(item, "utils");
                assert!(no_color);
            }
            _ => panic!("Expected Diff command"),
        }
    }

    #[test]
    fn resolve_requires_exactly_one_side() {
        assert!(Cli::try_parse_from(["codesync", "resolve", "utils"]).is_err());
        assert!(
            Cli::try_parse_from(["codesync", "resolve", "utils", "--keep-local", "--take-remote"])
                .is_err()
        );

        let cli = Cli::parse_from(["codesync", "resolve", "utils", "--take-remote"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Resolve { keep_local: false, take_remote: true, .. })
        ));
    }
}
