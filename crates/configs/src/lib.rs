//! # configs
//!
//! Layered settings for the forum core: built-in defaults, then an optional
//! `config/forum.toml`, then `FORUM__`-prefixed environment variables
//! (`FORUM__DATABASE__URL`, `FORUM__FORUM__MAX_TOP_LIMIT`, ...).

use std::time::Duration;

use config::{Config, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub forum: ForumSettings,
    pub log: LogSettings,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    /// e.g. `sqlite://forum.db`
    pub url: SecretString,
    pub max_connections: u32,
    pub acquire_timeout_ms: u64,
    pub busy_timeout_ms: u64,
}

impl DatabaseSettings {
    /// Settings pointing at `url` with the default pool shape.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: SecretString::from(url.into()),
            max_connections: 10,
            acquire_timeout_ms: 3_000,
            busy_timeout_ms: 5_000,
        }
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForumSettings {
    /// Size of the front-page listing.
    pub default_top_limit: i64,
    /// Hard cap applied to any requested listing size.
    pub max_top_limit: i64,
}

impl Default for ForumSettings {
    fn default() -> Self {
        Self {
            default_top_limit: 5,
            max_top_limit: 50,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// `EnvFilter` directive, e.g. `info,storage_adapters=debug`.
    pub filter: String,
    pub json: bool,
}

impl Settings {
    /// Loads `.env` (if any), then the layered sources, then validates.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_sources(Environment::with_prefix("FORUM").separator("__").try_parsing(true))
    }

    fn from_sources(env: Environment) -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .set_default("database.url", "sqlite://forum.db")?
            .set_default("database.max_connections", 10)?
            .set_default("database.acquire_timeout_ms", 3_000)?
            .set_default("database.busy_timeout_ms", 5_000)?
            .set_default("forum.default_top_limit", 5)?
            .set_default("forum.max_top_limit", 50)?
            .set_default("log.filter", "info")?
            .set_default("log.json", false)?
            .add_source(File::with_name("config/forum").required(false))
            .add_source(env)
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        tracing::debug!(?settings, "settings loaded");
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.expose_secret().trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "database.url",
                reason: "must not be empty".into(),
            });
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: "database.max_connections",
                reason: "must be at least 1".into(),
            });
        }
        if self.forum.max_top_limit < 1 {
            return Err(ConfigError::Invalid {
                key: "forum.max_top_limit",
                reason: "must be at least 1".into(),
            });
        }
        if !(1..=self.forum.max_top_limit).contains(&self.forum.default_top_limit) {
            return Err(ConfigError::Invalid {
                key: "forum.default_top_limit",
                reason: format!("must be between 1 and {}", self.forum.max_top_limit),
            });
        }
        Ok(())
    }
}
