//! # RDS Encoder Relay Configuration
//!
//! Typed configuration for the relay, built once at startup and handed to the
//! device link and the track pipeline.
//!
//! ## Sources
//!
//! 1. `config/encoder.toml` (or the path given with `--config`)
//! 2. Environment variables prefixed `RDS__`, with `__` between nested keys
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rds_config::EncoderConfig;
//!
//! let config = EncoderConfig::load(None)?;
//! let link_config = config.encoder.link_config();
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod defaults;
pub mod encoder_config;

// Re-export commonly used types
pub use encoder_config::{
    load_config, EncoderConfig, EncoderSettings, FilterSettings, LoggingSettings, QueueSettings,
};
