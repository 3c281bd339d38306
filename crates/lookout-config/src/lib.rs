//! # lookout-config
//!
//! Layered configuration loading for Lookout using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`LOOKOUT_*` prefix, `__` as separator)
//! 2. Project-level `.lookout/config.toml`
//! 3. User-level `~/.config/lookout/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `LOOKOUT_DATABASE__PATH` -> `database.path`,
//! `LOOKOUT_RETRY__MAX_ATTEMPTS` -> `retry.max_attempts`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use lookout_config::LookoutConfig;
//!
//! let config = LookoutConfig::load_with_dotenv().expect("config");
//! println!("timeline db: {}", config.database.path);
//! ```

mod database;
mod error;
mod feed;
mod general;
mod retry;

pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use feed::FeedConfig;
pub use general::{GeneralConfig, MAX_AUDIT_PAGE_LIMIT};
pub use retry::RetrySettings;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LookoutConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl LookoutConfig {
    /// Load configuration from all sources (TOML files + environment variables)
    /// and validate it.
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction fails or a value is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests and the CLI can layer extra providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".lookout/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("LOOKOUT_").split("__"))
    }

    /// Check cross-field and range constraints.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()?;
        self.feed.validate()?;
        self.retry.validate()?;
        self.general.validate()
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("lookout").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = LookoutConfig::default();
        config.validate().unwrap();
        assert_eq!(config.general.audit_page_limit, 50);
        assert_eq!(config.feed.capacity, 256);
        assert_eq!(config.retry.max_attempts, 4);
    }

    #[test]
    fn figment_builds_without_files() {
        let config: LookoutConfig = LookoutConfig::figment()
            .extract()
            .expect("should extract defaults");
        assert_eq!(config.database.path, ".lookout/timeline.db");
    }
}
