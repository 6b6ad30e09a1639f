//! CLI argument definitions using clap
//!
//! Commands:
//! - tsreplay inspect --wal <path>
//! - tsreplay replay --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// tsreplay - WAL replay with user-defined timestamp size reconciliation
#[derive(Parser, Debug)]
#[command(name = "tsreplay")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print every WAL record as one JSON line
    Inspect {
        /// Path to the WAL file
        #[arg(long)]
        wal: PathBuf,
    },

    /// Replay a WAL against the configured keyspaces
    Replay {
        /// Path to configuration file
        #[arg(long, default_value = "./tsreplay.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_inspect() {
        let cli = Cli::try_parse_from(["tsreplay", "inspect", "--wal", "wal.log"]).unwrap();
        match cli.command {
            Command::Inspect { wal } => assert_eq!(wal, PathBuf::from("wal.log")),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_replay_default_config() {
        let cli = Cli::try_parse_from(["tsreplay", "replay"]).unwrap();
        match cli.command {
            Command::Replay { config } => assert_eq!(config, PathBuf::from("./tsreplay.json")),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_inspect_requires_wal() {
        assert!(Cli::try_parse_from(["tsreplay", "inspect"]).is_err());
    }
}
