//! Application configuration.
//!
//! Settings are layered with figment: built-in defaults, then
//! `config.toml` in the platform config directory, then environment
//! variables prefixed with `HASHKEEPER_`. Command-line flags override the
//! merged result in [`crate::cli`].

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::reconcile::DEFAULT_CHECKPOINT_INTERVAL;
use crate::scanner::CHUNK_SIZE;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "HASHKEEPER_";

/// Durable store used when neither flag nor configuration names one.
pub const DEFAULT_DATABASE: &str = "hashes.sqlite";

/// Merged configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Durable store path
    pub database: PathBuf,
    /// Seconds between checkpoints during long runs
    pub checkpoint_interval_secs: u64,
    /// Read size for hashing; zero selects the default
    pub chunk_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DATABASE),
            checkpoint_interval_secs: DEFAULT_CHECKPOINT_INTERVAL.as_secs(),
            chunk_size: CHUNK_SIZE,
        }
    }
}

impl Config {
    /// Load from the platform config file and the environment.
    ///
    /// A missing or malformed file is not fatal: the failure is logged and
    /// defaults are used.
    #[must_use]
    pub fn load() -> Self {
        match Self::figment_from(Self::config_path()).extract() {
            Ok(config) => config,
            Err(e) => {
                log::debug!("Failed to load config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Layered figment over an optional TOML file.
    #[must_use]
    pub fn figment_from(file: Option<PathBuf>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = file {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Platform config file location, when a home directory is known.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "hashkeeper", "hashkeeper")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Checkpoint spacing as a duration.
    #[must_use]
    pub fn checkpoint_interval(&self) -> Duration {
        Duration::from_secs(self.checkpoint_interval_secs)
    }

    /// Effective chunk size.
    #[must_use]
    pub fn effective_chunk_size(&self) -> usize {
        if self.chunk_size == 0 {
            CHUNK_SIZE
        } else {
            self.chunk_size
        }
    }
}
