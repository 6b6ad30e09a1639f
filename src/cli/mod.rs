//! CLI module for tsreplay
//!
//! Provides command-line interface for:
//! - inspect: Dump WAL records as JSON lines
//! - replay: Replay a WAL with timestamp size reconciliation

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{inspect, replay, run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_json, write_response};
