//! CLI-specific error types
//!
//! All CLI errors are FATAL: the process exits non-zero.

use std::fmt;
use std::io;

use crate::recovery::{RecoveryError, RecoveryErrorCode};
use crate::wal::WalError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdout)
    IoError,
    /// WAL could not be read
    WalError,
    /// Replay aborted
    ReplayFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "TSR_CLI_CONFIG_ERROR",
            Self::IoError => "TSR_CLI_IO_ERROR",
            Self::WalError => "TSR_CLI_WAL_ERROR",
            Self::ReplayFailed => "TSR_CLI_REPLAY_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// WAL error
    pub fn wal_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::WalError, msg)
    }

    /// Replay failed
    pub fn replay_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ReplayFailed, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<WalError> for CliError {
    fn from(e: WalError) -> Self {
        Self::wal_error(e.to_string())
    }
}

impl From<RecoveryError> for CliError {
    fn from(e: RecoveryError) -> Self {
        match e.code() {
            RecoveryErrorCode::ConfigInvalid => Self::config_error(e.message()),
            _ => Self::replay_failed(e.to_string()),
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
