//! Store configuration types.

use std::path::PathBuf;

use serde::Deserialize;

use crate::storage::ConsistencyLevel;

/// Keyspace used when none is configured.
pub const DEFAULT_KEYSPACE: &str = "wholesale";

/// Store type discriminator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreType {
    #[default]
    Memory,
    Sqlite,
}

/// Store configuration (discriminated union).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store type discriminator.
    #[serde(rename = "type")]
    pub store_type: StoreType,
    /// SQLite-specific configuration.
    pub sqlite: SqliteConfig,
    /// Cluster contact points. Worker `i` is pinned to entry `i % len`.
    pub contact_points: Vec<String>,
    pub keyspace: String,
    /// Consistency level for every session.
    pub consistency: ConsistencyLevel,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_type: StoreType::Memory,
            sqlite: SqliteConfig::default(),
            contact_points: Vec::new(),
            keyspace: DEFAULT_KEYSPACE.to_string(),
            consistency: ConsistencyLevel::Quorum,
        }
    }
}

/// SQLite-specific configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    /// Database file. Created if missing.
    pub path: PathBuf,
    /// How long a session waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("wholesale.db"),
            busy_timeout_ms: 5_000,
        }
    }
}
