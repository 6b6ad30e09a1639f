//! Replay configuration
//!
//! Example:
//!
//! ```json
//! {
//!   "wal_path": "/var/lib/tsreplay/wal/wal.log",
//!   "consistency_mode": "reconcile",
//!   "keyspaces": [
//!     { "id": 0, "timestamp_size": 0 },
//!     { "id": 1, "timestamp_size": 8 }
//!   ]
//! }
//! ```
//!
//! `keyspaces` is the registry of running column families and must list
//! every live one, zero sizes included.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::udt::{TimestampSizeConsistencyMode, TimestampSizeMap};

use super::errors::{RecoveryError, RecoveryResult};

/// A running column family and its configured timestamp size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyspaceConfig {
    pub id: u32,
    #[serde(default)]
    pub timestamp_size: u16,
}

/// Configuration for a replay run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// WAL file to replay (required)
    pub wal_path: PathBuf,

    /// "verify" or "reconcile" (optional, default "reconcile")
    #[serde(default = "default_consistency_mode")]
    pub consistency_mode: TimestampSizeConsistencyMode,

    #[serde(default)]
    pub keyspaces: Vec<KeyspaceConfig>,
}

fn default_consistency_mode() -> TimestampSizeConsistencyMode {
    TimestampSizeConsistencyMode::ReconcileInconsistency
}

impl ReplayConfig {
    /// Load and validate configuration from a JSON file
    pub fn load(path: &Path) -> RecoveryResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            RecoveryError::config_invalid(format!(
                "Failed to read config {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json_str(&content)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json_str(content: &str) -> RecoveryResult<Self> {
        let config: ReplayConfig = serde_json::from_str(content)
            .map_err(|e| RecoveryError::config_invalid(format!("Invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> RecoveryResult<()> {
        if self.wal_path.as_os_str().is_empty() {
            return Err(RecoveryError::config_invalid("wal_path must not be empty"));
        }

        let mut seen = HashSet::new();
        for keyspace in &self.keyspaces {
            if !seen.insert(keyspace.id) {
                return Err(RecoveryError::config_invalid(format!(
                    "Duplicate keyspace id: {}",
                    keyspace.id
                )));
            }
        }

        Ok(())
    }

    /// Build the running timestamp size map from the keyspace registry
    pub fn running_size_map(&self) -> TimestampSizeMap {
        self.keyspaces
            .iter()
            .map(|k| (k.id, usize::from(k.timestamp_size)))
            .collect()
    }
}
