//! Configuration module for the Reef library.
//!
//! Settings load from an optional file (TOML, YAML, JSON) overridden by
//! `REEF_*` environment variables, and every section is validated before
//! use. Containers carry their own builder-style configs; this module
//! covers the cross-cutting sections: the log sink and the boundary
//! collaborators.

use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur during configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error when the configuration source cannot be read or parsed.
    #[error("failed to load configuration: {0}")]
    LoadError(String),

    /// Error when a configuration value fails validation.
    #[error("configuration validation error: {0}")]
    ValidationError(String),
}

/// A trait for types that can be validated.
pub trait Validate {
    /// Validates that the configuration is correct.
    fn validate(&self) -> ConfigResult<()>;
}

/// Main configuration for the Reef library.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReefConfig {
    /// Log sink configuration.
    #[serde(default)]
    pub log: LogConfig,

    /// Object-store collaborator configuration.
    #[serde(default)]
    pub object_store: ObjectStoreConfig,

    /// Messaging collaborator configuration.
    #[serde(default)]
    pub messaging: MessagingConfig,
}

impl ReefConfig {
    /// Loads configuration from `path` (when given) and `REEF_*`
    /// environment overrides, then validates it.
    ///
    /// Nested keys use a double underscore in the environment:
    /// `REEF_LOG__MODE=prod` overrides `log.mode`.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let settings = builder
            .add_source(Environment::with_prefix("REEF").separator("__"))
            .build()
            .map_err(|err| ConfigError::LoadError(err.to_string()))?;

        let config: ReefConfig = settings
            .try_deserialize()
            .map_err(|err| ConfigError::LoadError(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

impl Validate for ReefConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.log.validate()?;
        self.object_store.validate()?;
        self.messaging.validate()?;
        Ok(())
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Deployment mode, `dev` or `prod`. Dev prints debug-and-above to
    /// the console; prod starts at info.
    pub mode: String,

    /// Whether to log in JSON format.
    pub json: bool,

    /// Whether error-and-above records are handed to the registered
    /// forwarders.
    pub forward_errors: bool,

    /// Whether error-and-above records are persisted through the
    /// registered store.
    pub persist_errors: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            mode: "dev".to_string(),
            json: false,
            forward_errors: true,
            persist_errors: false,
        }
    }
}

impl Validate for LogConfig {
    fn validate(&self) -> ConfigResult<()> {
        match self.mode.as_str() {
            "dev" | "prod" => Ok(()),
            other => Err(ConfigError::ValidationError(format!(
                "invalid log mode: {other}"
            ))),
        }
    }
}

/// Object-store collaborator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectStoreConfig {
    /// Whether the collaborator is wired up at all.
    pub enabled: bool,

    /// Service endpoint, `host:port`.
    pub endpoint: String,

    /// Access credentials.
    pub access_key: String,
    pub secret_key: String,

    /// Whether to speak TLS to the endpoint.
    pub use_ssl: bool,

    /// Default bucket for callers that do not name one.
    pub bucket: String,
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: String::new(),
            access_key: String::new(),
            secret_key: String::new(),
            use_ssl: true,
            bucket: String::new(),
        }
    }
}

impl Validate for ObjectStoreConfig {
    fn validate(&self) -> ConfigResult<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.endpoint.is_empty() {
            return Err(ConfigError::ValidationError(
                "object_store.endpoint must be set when enabled".to_string(),
            ));
        }
        if self.access_key.is_empty() || self.secret_key.is_empty() {
            return Err(ConfigError::ValidationError(
                "object_store credentials must be set when enabled".to_string(),
            ));
        }
        Ok(())
    }
}

/// Messaging collaborator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagingConfig {
    /// Whether the collaborator is wired up at all.
    pub enabled: bool,

    /// Broker URL, e.g. `nats://localhost:4222`.
    pub url: String,

    /// Optional authentication.
    pub username: String,
    pub password: String,

    /// Connection name reported to the broker.
    pub name: String,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            username: String::new(),
            password: String::new(),
            name: "reef".to_string(),
        }
    }
}

impl Validate for MessagingConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.enabled && self.url.is_empty() {
            return Err(ConfigError::ValidationError(
                "messaging.url must be set when enabled".to_string(),
            ));
        }
        Ok(())
    }
}
