//! Configuration defaults
//!
//! Values used when a setting is absent from both the config file and the
//! environment.

/// Encoder link defaults
pub mod encoder {
    /// Connection timeout (milliseconds)
    pub const CONNECT_TIMEOUT_MS: u64 = 5_000;

    /// Response wait (milliseconds)
    pub const READ_TIMEOUT_MS: u64 = 5_000;

    /// Command write bound (milliseconds)
    pub const WRITE_TIMEOUT_MS: u64 = 5_000;

    /// Reconnection backoff base (milliseconds)
    pub const INITIAL_BACKOFF_MS: u64 = 1_000;

    /// Reconnection backoff ceiling (milliseconds)
    pub const MAX_BACKOFF_MS: u64 = 60_000;

    /// Supervisor tick while connected (milliseconds)
    pub const POLL_INTERVAL_MS: u64 = 1_000;
}

/// Queue boundary defaults
pub mod queue {
    pub const QUEUE_NAME: &str = "rds-encoder";

    pub const EXCHANGE: &str = "spinitron";

    /// Routing key pattern for track announcements
    pub const BINDING_KEY: &str = "spinitron.#";
}

/// Logging defaults
pub mod logging {
    pub const LEVEL: &str = "info";

    /// Levels accepted by `[logging] level`
    pub const LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
}

/// Default config file location, relative to the working directory
pub const CONFIG_PATH: &str = "config/encoder.toml";

/// Environment variable prefix; `RDS__ENCODER__HOST` sets `encoder.host`
pub const ENV_PREFIX: &str = "RDS";

/// Separator between the prefix and nested keys
pub const ENV_SEPARATOR: &str = "__";
