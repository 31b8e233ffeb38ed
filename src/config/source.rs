//! Where configurations come from.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::config::error::ConfigError;
use crate::config::loader::{load_config, LoadedConfig};
use crate::config::schema::LoggingConfig;

/// Supplies configurations to the manager on startup and on every reload.
pub trait ConfigSource: Send + Sync {
    fn load(&self) -> Result<LoadedConfig, ConfigError>;

    /// Called when a reload failed and the previous table stays published.
    fn reload_failed(&self, error: &ConfigError) {
        tracing::warn!(error = %error, "Configuration reload failed, keeping current configuration");
    }
}

/// TOML file on disk, with includes.
#[derive(Debug, Clone)]
pub struct FileConfigSource {
    path: PathBuf,
}

impl FileConfigSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for FileConfigSource {
    fn load(&self) -> Result<LoadedConfig, ConfigError> {
        load_config(&self.path)
    }
}

/// In-memory configuration with no files to watch.
#[derive(Debug, Default)]
pub struct StaticConfigSource {
    config: Mutex<LoggingConfig>,
}

impl StaticConfigSource {
    pub fn new(config: LoggingConfig) -> Self {
        Self {
            config: Mutex::new(config),
        }
    }

    /// Replace the configuration returned by the next `load`.
    pub fn set(&self, config: LoggingConfig) {
        *self.config.lock().unwrap_or_else(PoisonError::into_inner) = config;
    }
}

impl ConfigSource for StaticConfigSource {
    fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config = self.config.lock().unwrap_or_else(PoisonError::into_inner).clone();
        Ok(LoadedConfig {
            config,
            files: Vec::new(),
        })
    }
}
