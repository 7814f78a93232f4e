//! # RDS Network - Encoder Device Link
//!
//! ## Purpose
//!
//! Owns the one long-lived TCP connection to the SmartGen Mini RDS encoder.
//! The link reconnects on its own with exponential backoff and exposes a
//! single request/response operation, [`DeviceLink::send_command`].
//!
//! ## Architecture Role
//!
//! ```text
//! encoder service → [DeviceLink] ──TCP──▶ SmartGen Mini
//!                      │
//!                      └─ supervisor task: connect, back off, reconnect
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rds_network::{DeviceLink, LinkConfig};
//!
//! # async fn run() -> rds_network::Result<()> {
//! let link = DeviceLink::new(LinkConfig::new("192.168.1.50", 5000));
//! link.start();
//!
//! link.send_command("TEXT", "RADIOHEAD - KARMA POLICE").await?;
//!
//! link.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod backoff;
pub mod error;
pub mod link;

pub use backoff::Backoff;
pub use error::{LinkError, Result};
pub use link::{DeviceLink, LinkConfig, LinkState, LinkStats};

use std::time::Duration;

/// Default TCP connect timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default bound on waiting for a command response
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Default bound on writing a command
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Reconnection delay after the first failure
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Reconnection delay ceiling
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Supervisor tick while the link is up
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Cap on the bytes gathered for one response
pub const RESPONSE_BUFFER_SIZE: usize = 1024;
