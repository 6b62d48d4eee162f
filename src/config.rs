//! Layered configuration: optional file, then `BLADE__*` environment variables
//!
//! ```toml
//! [logging]
//! level = "info"
//! format = "text"
//!
//! [compression]
//! max_messages = 50
//! max_tokens = 8000
//! keep_recent_messages = 10
//! keep_system_messages = true
//! keep_important_messages = true
//!
//! [session]
//! max_sessions = 1000
//! model_cache_capacity = 16
//! ```

use crate::context::RetentionRules;
use crate::error::{ContextError, Result};
use config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Default config file name, looked up without extension
pub const DEFAULT_CONFIG_NAME: &str = "blade";

const ENV_PREFIX: &str = "BLADE";
const ENV_SEPARATOR: &str = "__";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub compression: CompressionConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl Config {
    /// Load `blade.{toml,yaml,json}` from the working directory if present,
    /// overlaid with environment variables
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let builder = config::Config::builder()
            .add_source(File::with_name(DEFAULT_CONFIG_NAME).required(false));
        Self::build(builder)
    }

    /// Load from an explicit file, overlaid with environment variables
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        dotenvy::dotenv().ok();
        let builder = config::Config::builder().add_source(File::from(path.as_ref()));
        Self::build(builder)
    }

    /// Parse a TOML document without consulting the environment
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn build(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?;
        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        debug!("Configuration loaded: {:?}", config);
        Ok(config)
    }

    /// Check every section
    pub fn validate(&self) -> Result<()> {
        self.logging.validate()?;
        self.compression.validate()?;
        self.session.validate()?;
        Ok(())
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.level.trim().is_empty() {
            return Err(ContextError::Configuration(
                "logging.level must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Compression trigger thresholds and retention rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    /// Compress once the history holds more messages than this
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
    /// Compress once the estimated history tokens exceed this
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    #[serde(default = "default_keep_recent")]
    pub keep_recent_messages: usize,
    #[serde(default = "default_true")]
    pub keep_system_messages: bool,
    #[serde(default = "default_true")]
    pub keep_important_messages: bool,
}

fn default_max_messages() -> usize {
    50
}

fn default_max_tokens() -> usize {
    8000
}

fn default_keep_recent() -> usize {
    10
}

fn default_true() -> bool {
    true
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            max_messages: default_max_messages(),
            max_tokens: default_max_tokens(),
            keep_recent_messages: default_keep_recent(),
            keep_system_messages: default_true(),
            keep_important_messages: default_true(),
        }
    }
}

impl CompressionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_messages == 0 {
            return Err(ContextError::Configuration(
                "compression.max_messages must be greater than zero".to_string(),
            ));
        }
        if self.max_tokens == 0 {
            return Err(ContextError::Configuration(
                "compression.max_tokens must be greater than zero".to_string(),
            ));
        }
        if self.keep_recent_messages > self.max_messages {
            return Err(ContextError::Configuration(format!(
                "compression.keep_recent_messages ({}) exceeds compression.max_messages ({})",
                self.keep_recent_messages, self.max_messages
            )));
        }
        Ok(())
    }

    /// Retention rules applied by the window manager on every pass
    pub fn rules(&self) -> RetentionRules {
        RetentionRules {
            keep_recent_messages: self.keep_recent_messages,
            keep_system_messages: self.keep_system_messages,
            keep_important_messages: self.keep_important_messages,
        }
    }
}

/// Session store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
    #[serde(default = "default_model_cache_capacity")]
    pub model_cache_capacity: u64,
}

fn default_max_sessions() -> usize {
    1000
}

fn default_model_cache_capacity() -> u64 {
    16
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
            model_cache_capacity: default_model_cache_capacity(),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_sessions == 0 {
            return Err(ContextError::Configuration(
                "session.max_sessions must be greater than zero".to_string(),
            ));
        }
        if self.model_cache_capacity == 0 {
            return Err(ContextError::Configuration(
                "session.model_cache_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
