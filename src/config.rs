//! Engine configuration
//!
//! Where table files live and how chatty the logs are. Values come from
//! defaults, then environment overrides, then whatever the caller sets
//! through the builder.

use std::path::{Path, PathBuf};

/// Default directory holding `.data` and `.meta` files
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Default log filter when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "CHRONODB_DATA_DIR";

/// Environment variable overriding the log filter
pub const LOG_FILTER_ENV: &str = "CHRONODB_LOG";

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Directory where table data and schema files are stored
    pub data_dir: PathBuf,
    /// `tracing_subscriber::EnvFilter` directive used by the CLI
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl EngineConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with `CHRONODB_DATA_DIR` / `CHRONODB_LOG` applied
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.trim().is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }
        if let Ok(filter) = std::env::var(LOG_FILTER_ENV) {
            if !filter.trim().is_empty() {
                config.log_filter = filter;
            }
        }
        config
    }

    /// Set the data directory
    pub fn data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.data_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the log filter
    pub fn log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }
}
