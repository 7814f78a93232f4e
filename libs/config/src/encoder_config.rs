//! Encoder Relay Configuration Module
//!
//! Loads the relay's configuration from an optional TOML file overlaid with
//! `RDS__`-prefixed environment variables, then validates it once. Anything
//! missing or malformed fails here, before any connection is attempted.

use crate::defaults;
use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use rds_network::LinkConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Main relay configuration structure
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EncoderConfig {
    /// Encoder device connection
    pub encoder: EncoderSettings,

    /// Where track events come from
    pub queue: QueueSettings,

    /// Text filtering
    pub filter: FilterSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

/// `[encoder]` section
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EncoderSettings {
    pub host: String,
    pub port: u16,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// `[queue]` section
///
/// Queue, exchange and binding key identify the upstream feed in logs.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct QueueSettings {
    /// `stdin`, `unix:///path` or `tcp://host:port`
    pub source: String,
    #[serde(default = "default_queue_name")]
    pub queue: String,
    #[serde(default = "default_exchange")]
    pub exchange: String,
    #[serde(default = "default_binding_key")]
    pub binding_key: String,
}

/// `[filter]` section
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FilterSettings {
    pub profanity_filter_enabled: bool,
    /// JSON array or newline-separated word list
    pub word_list: Option<PathBuf>,
}

/// `[logging]` section
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_connect_timeout_ms() -> u64 {
    defaults::encoder::CONNECT_TIMEOUT_MS
}

fn default_read_timeout_ms() -> u64 {
    defaults::encoder::READ_TIMEOUT_MS
}

fn default_write_timeout_ms() -> u64 {
    defaults::encoder::WRITE_TIMEOUT_MS
}

fn default_initial_backoff_ms() -> u64 {
    defaults::encoder::INITIAL_BACKOFF_MS
}

fn default_max_backoff_ms() -> u64 {
    defaults::encoder::MAX_BACKOFF_MS
}

fn default_poll_interval_ms() -> u64 {
    defaults::encoder::POLL_INTERVAL_MS
}

fn default_queue_name() -> String {
    defaults::queue::QUEUE_NAME.to_string()
}

fn default_exchange() -> String {
    defaults::queue::EXCHANGE.to_string()
}

fn default_binding_key() -> String {
    defaults::queue::BINDING_KEY.to_string()
}

fn default_log_level() -> String {
    defaults::logging::LEVEL.to_string()
}

impl EncoderConfig {
    /// Load from `path` (or `config/encoder.toml`) with `RDS__` overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_prefix(path, defaults::ENV_PREFIX, &[])
    }

    /// Load, then apply explicit `key = value` overrides (e.g. from the
    /// command line) on top of file and environment
    pub fn load_with_overrides(path: Option<&Path>, overrides: &[(&str, &str)]) -> Result<Self> {
        Self::load_with_prefix(path, defaults::ENV_PREFIX, overrides)
    }

    /// Load with a custom environment prefix
    pub fn load_with_prefix(
        path: Option<&Path>,
        env_prefix: &str,
        overrides: &[(&str, &str)],
    ) -> Result<Self> {
        // An explicit path must exist; the default location is optional
        let builder = match path {
            Some(path) => {
                info!("Loading encoder config: {:?}", path);
                Config::builder().add_source(File::from(path).required(true))
            }
            None => {
                debug!("Looking for encoder config at {}", defaults::CONFIG_PATH);
                Config::builder()
                    .add_source(File::with_name(defaults::CONFIG_PATH).required(false))
            }
        };

        let mut builder = builder.add_source(
            Environment::with_prefix(env_prefix)
                .prefix_separator(defaults::ENV_SEPARATOR)
                .separator(defaults::ENV_SEPARATOR)
                .try_parsing(true),
        );

        for (key, value) in overrides {
            debug!("Overriding {} from command line", key);
            builder = builder
                .set_override(*key, *value)
                .with_context(|| format!("Invalid override for {}", key))?;
        }

        let config = builder.build().context("Failed to build configuration")?;

        let mut config: EncoderConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.expand_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    /// Expand environment variables in path values
    pub fn expand_env_vars(&mut self) -> Result<()> {
        if let Some(word_list) = &self.filter.word_list {
            let raw = word_list.to_string_lossy();
            let expanded =
                shellexpand::env(&raw).context("Failed to expand profanity word list path")?;
            self.filter.word_list = Some(PathBuf::from(expanded.as_ref()));
        }

        let expanded = shellexpand::env(&self.queue.source)
            .context("Failed to expand queue source")?;
        self.queue.source = expanded.into_owned();

        Ok(())
    }

    /// Reject values that would only fail later at runtime
    pub fn validate(&self) -> Result<()> {
        let encoder = &self.encoder;
        if encoder.host.trim().is_empty() {
            bail!("encoder.host must not be empty");
        }
        if encoder.port == 0 {
            bail!("encoder.port must be between 1 and 65535");
        }
        if encoder.initial_backoff_ms == 0 {
            bail!("encoder.initial_backoff_ms must be positive");
        }
        if encoder.max_backoff_ms < encoder.initial_backoff_ms {
            bail!(
                "encoder.max_backoff_ms ({}) is below encoder.initial_backoff_ms ({})",
                encoder.max_backoff_ms,
                encoder.initial_backoff_ms
            );
        }
        for (name, value) in [
            ("connect_timeout_ms", encoder.connect_timeout_ms),
            ("read_timeout_ms", encoder.read_timeout_ms),
            ("write_timeout_ms", encoder.write_timeout_ms),
            ("poll_interval_ms", encoder.poll_interval_ms),
        ] {
            if value == 0 {
                bail!("encoder.{} must be positive", name);
            }
        }

        let source = self.queue.source.as_str();
        if source != "stdin" && !source.starts_with("unix://") && !source.starts_with("tcp://") {
            bail!(
                "queue.source `{}` must be `stdin`, `unix:///path` or `tcp://host:port`",
                source
            );
        }

        if self.filter.profanity_filter_enabled && self.filter.word_list.is_none() {
            bail!("filter.word_list is required when filter.profanity_filter_enabled is true");
        }

        let level = self.logging.level.to_ascii_lowercase();
        if !defaults::logging::LEVELS.contains(&level.as_str()) {
            bail!(
                "logging.level `{}` must be one of {:?}",
                self.logging.level,
                defaults::logging::LEVELS
            );
        }

        Ok(())
    }
}

impl EncoderSettings {
    /// Settings for the device link
    pub fn link_config(&self) -> LinkConfig {
        LinkConfig {
            host: self.host.clone(),
            port: self.port,
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            write_timeout: Duration::from_millis(self.write_timeout_ms),
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }
}

/// Convenience function to load configuration from the default location
pub fn load_config() -> Result<EncoderConfig> {
    EncoderConfig::load(None)
}
