//! CLI argument definitions using clap
//!
//! Commands:
//! - audit-reorder run --config <path> [--dry-run]
//! - audit-reorder candidates --config <path>
//! - audit-reorder inspect --config <path> --entity <id>
//! - audit-reorder init --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Replays address-line audit history and repairs order_id values
#[derive(Parser, Debug)]
#[command(name = "audit-reorder")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Reconcile every candidate entity and commit once
    Run {
        /// Path to configuration file
        #[arg(long, default_value = "./audit-reorder.json")]
        config: PathBuf,

        /// Roll the transaction back instead of committing
        #[arg(long)]
        dry_run: bool,
    },

    /// List entities whose history needs reconciliation
    Candidates {
        /// Path to configuration file
        #[arg(long, default_value = "./audit-reorder.json")]
        config: PathBuf,
    },

    /// Replay a single entity and print its corrections
    Inspect {
        /// Path to configuration file
        #[arg(long, default_value = "./audit-reorder.json")]
        config: PathBuf,

        /// Entity (addresslines_id) to replay
        #[arg(long)]
        entity: i64,
    },

    /// Create the audit table if it does not exist
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./audit-reorder.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_dry_run() {
        let cli = Cli::try_parse_from(["audit-reorder", "run", "--config", "c.json", "--dry-run"])
            .unwrap();
        match cli.command {
            Command::Run { config, dry_run } => {
                assert_eq!(config, PathBuf::from("c.json"));
                assert!(dry_run);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_inspect_requires_entity() {
        assert!(Cli::try_parse_from(["audit-reorder", "inspect"]).is_err());
        let cli = Cli::try_parse_from(["audit-reorder", "inspect", "--entity", "429854"]).unwrap();
        assert!(matches!(cli.command, Command::Inspect { entity: 429854, .. }));
    }
}
