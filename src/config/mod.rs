//! Application configuration.
//!
//! Store and harness settings, loaded from YAML files and `WHOLESALE__*`
//! environment variables.

mod harness;
mod store;

pub use harness::HarnessConfig;
pub use store::{SqliteConfig, StoreConfig, StoreType, DEFAULT_KEYSPACE};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "wholesale.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "WHOLESALE_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "WHOLESALE";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "WHOLESALE_LOG";

use serde::Deserialize;

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Store configuration.
    pub store: StoreConfig,
    /// Client harness configuration.
    pub harness: HarnessConfig,
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `wholesale.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 4. Environment variables with `CONFIG_ENV_PREFIX` prefix
    pub fn load(path: Option<&str>) -> Result<Self, ::config::ConfigError> {
        use ::config::{Config as ConfigLib, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder.add_source(env_source()).build()?;
        config.try_deserialize()
    }

    /// Parse configuration from a YAML string, ignoring the environment.
    pub fn from_yaml(yaml: &str) -> Result<Self, ::config::ConfigError> {
        use ::config::{Config as ConfigLib, File, FileFormat};

        ConfigLib::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?
            .try_deserialize()
    }
}

fn env_source() -> ::config::Environment {
    ::config::Environment::with_prefix(CONFIG_ENV_PREFIX)
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("store.contact_points")
        .try_parsing(true)
}
