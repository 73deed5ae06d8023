//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into
//! services. Reading process-wide environment variables during request
//! handling leads to inconsistent behaviour in multi-threaded runtimes and
//! test harnesses, so the boundaries construct a `CoreConfig` up front and
//! the core never touches the environment.

use std::path::{Path, PathBuf};

/// Errors raised while resolving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("data directory does not exist: {}", .0.display())]
    MissingDataDir(PathBuf),
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig` rooted at an existing data directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingDataDir`] if `data_dir` is not a
    /// directory.
    pub fn new(data_dir: PathBuf) -> Result<Self, ConfigError> {
        if !data_dir.is_dir() {
            return Err(ConfigError::MissingDataDir(data_dir));
        }
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Root of the bundle store.
    pub fn bundle_dir(&self) -> PathBuf {
        self.data_dir.join("bundles")
    }
}
