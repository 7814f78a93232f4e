//! # Device Link - Persistent TCP Connection to the RDS Encoder
//!
//! Keeps a single TCP socket to the SmartGen Mini alive across failures and
//! exchanges one command at a time over it.
//!
//! ## Connection Lifecycle
//!
//! ```text
//!            connect ok                      transport error in send_command
//! Disconnected ──────▶ Connecting ──▶ Connected ───────────────────────────┐
//!      ▲                   │                                               │
//!      └──── backoff ◀─────┘ connect failed                                │
//!      └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A supervisor task owns connection establishment. Failure detection is
//! lazy: the supervisor never probes a live socket, `send_command` tears the
//! socket down when an exchange fails and the supervisor reconnects on its
//! next tick.
//!
//! The socket slot sits behind one async mutex. `send_command` holds it for
//! the whole write/read exchange, and the supervisor only installs a socket
//! into an empty slot, so at most one socket exists and no command is ever
//! written to a socket being torn down.

use crate::backoff::Backoff;
use crate::error::{LinkError, Result};
use crate::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_INITIAL_BACKOFF, DEFAULT_MAX_BACKOFF, DEFAULT_POLL_INTERVAL,
    DEFAULT_READ_TIMEOUT, DEFAULT_WRITE_TIMEOUT, RESPONSE_BUFFER_SIZE,
};
use parking_lot::{Mutex, RwLock};
use rds_codec::{Command, DeviceResponse};
use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::{timeout, timeout_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Encoder link configuration
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Encoder host name or address
    pub host: String,
    /// Encoder TCP port
    pub port: u16,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Bound on waiting for a command response
    pub read_timeout: Duration,
    /// Bound on writing a command
    pub write_timeout: Duration,
    /// First reconnection delay, restored after every successful connect
    pub initial_backoff: Duration,
    /// Reconnection delay ceiling
    pub max_backoff: Duration,
    /// Supervisor idle tick while connected
    pub poll_interval: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl LinkConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// `host:port` for logging
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Connection states for the encoder link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No socket; the supervisor will attempt a connect
    Disconnected,
    /// Connect attempt in progress
    Connecting,
    /// Socket established and usable
    Connected,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LinkState::Disconnected => "disconnected",
            LinkState::Connecting => "connecting",
            LinkState::Connected => "connected",
        };
        f.write_str(name)
    }
}

/// Link statistics snapshot
#[derive(Debug, Clone)]
pub struct LinkStats {
    pub state: LinkState,
    /// Delay the next failed connect will wait
    pub backoff: Duration,
    pub connect_attempts: u64,
    /// Successful connects, including reconnects
    pub connections: u64,
    pub commands_sent: u64,
    pub commands_failed: u64,
    pub connected_for: Option<Duration>,
}

/// Established socket
struct Connection {
    stream: TcpStream,
    peer_addr: SocketAddr,
    connected_at: Instant,
}

impl Connection {
    fn new(stream: TcpStream, peer_addr: SocketAddr) -> Self {
        Self {
            stream,
            peer_addr,
            connected_at: Instant::now(),
        }
    }

    /// Write one request line and read until the reply ends in `OK` or `NO`.
    ///
    /// The whole read is bounded by the read timeout. A reply still open
    /// when the timeout expires, or larger than [`RESPONSE_BUFFER_SIZE`], is
    /// returned as incomplete.
    async fn exchange(&mut self, line: &[u8], config: &LinkConfig) -> Result<RawResponse> {
        timeout(config.write_timeout, async {
            self.stream.write_all(line).await?;
            self.stream.flush().await
        })
        .await
        .map_err(|_| {
            LinkError::transport(format!(
                "Write to {} timed out after {}ms",
                self.peer_addr,
                config.write_timeout.as_millis()
            ))
        })?
        .map_err(|e| LinkError::transport_with_source("Failed to write command", e))?;

        let deadline = tokio::time::Instant::now() + config.read_timeout;
        let mut raw = Vec::with_capacity(RESPONSE_BUFFER_SIZE);
        let mut chunk = vec![0u8; RESPONSE_BUFFER_SIZE];

        loop {
            let read = match timeout_at(deadline, self.stream.read(&mut chunk)).await {
                Ok(result) => result
                    .map_err(|e| LinkError::transport_with_source("Failed to read response", e))?,
                Err(_) if raw.is_empty() => {
                    return Err(LinkError::transport(format!(
                        "No response from {} within {}ms",
                        self.peer_addr,
                        config.read_timeout.as_millis()
                    )));
                }
                Err(_) => return Ok(RawResponse { raw, complete: false }),
            };

            if read == 0 {
                return Err(LinkError::transport(format!(
                    "Connection closed by encoder at {}",
                    self.peer_addr
                )));
            }

            raw.extend_from_slice(&chunk[..read]);
            if DeviceResponse::parse(&raw).is_final() {
                return Ok(RawResponse { raw, complete: true });
            }
            if raw.len() >= RESPONSE_BUFFER_SIZE {
                return Ok(RawResponse { raw, complete: false });
            }
        }
    }
}

/// Bytes read for one command
struct RawResponse {
    raw: Vec<u8>,
    /// Ended on an `OK` or `NO` line; otherwise the rest may still be in flight
    complete: bool,
}

/// State shared between the handle and the supervisor task
struct LinkShared {
    config: LinkConfig,
    socket: tokio::sync::Mutex<Option<Connection>>,
    state: RwLock<LinkState>,
    backoff: Mutex<Backoff>,
    shutdown: CancellationToken,
    session: RwLock<Option<(SocketAddr, Instant)>>,

    // Tracking
    connect_attempts: AtomicU64,
    connections: AtomicU64,
    commands_sent: AtomicU64,
    commands_failed: AtomicU64,
}

impl LinkShared {
    fn state(&self) -> LinkState {
        *self.state.read()
    }

    fn set_state(&self, state: LinkState) {
        let previous = std::mem::replace(&mut *self.state.write(), state);
        if previous != state {
            debug!(from = %previous, to = %state, "Encoder link state changed");
        }
    }

    /// Attempt one connection and install the socket
    async fn connect(&self) -> Result<()> {
        self.set_state(LinkState::Connecting);
        self.connect_attempts.fetch_add(1, Ordering::Relaxed);

        let address = self.config.address();
        debug!(address = %address, "Connecting to encoder");

        let stream = match timeout(
            self.config.connect_timeout,
            TcpStream::connect((self.config.host.as_str(), self.config.port)),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                self.set_state(LinkState::Disconnected);
                return Err(LinkError::transport_with_source(
                    format!("Failed to connect to encoder at {}", address),
                    e,
                ));
            }
            Err(_) => {
                self.set_state(LinkState::Disconnected);
                return Err(LinkError::transport(format!(
                    "Connect to {} timed out after {}ms",
                    address,
                    self.config.connect_timeout.as_millis()
                )));
            }
        };

        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY: {}", e);
        }

        let peer_addr = match stream.peer_addr() {
            Ok(addr) => addr,
            Err(e) => {
                self.set_state(LinkState::Disconnected);
                return Err(LinkError::transport_with_source(
                    "Failed to get encoder peer address",
                    e,
                ));
            }
        };

        let mut socket = self.socket.lock().await;
        if socket.is_some() {
            // Only the supervisor installs sockets, so this means state drifted
            warn!(peer = %peer_addr, "Socket already installed, discarding new connection");
        } else {
            *socket = Some(Connection::new(stream, peer_addr));
            *self.session.write() = Some((peer_addr, Instant::now()));
            self.connections.fetch_add(1, Ordering::Relaxed);
            info!(
                "Connected to SmartGen Mini RDS encoder at `{}`",
                peer_addr
            );
        }
        self.backoff.lock().reset();
        self.set_state(LinkState::Connected);
        Ok(())
    }

    /// Drop the socket so the supervisor reconnects
    fn teardown(&self, socket: &mut Option<Connection>) {
        if let Some(connection) = socket.take() {
            debug!(
                peer = %connection.peer_addr,
                lifetime_ms = connection.connected_at.elapsed().as_millis() as u64,
                "Closed encoder socket"
            );
        }
        *self.session.write() = None;
        self.set_state(LinkState::Disconnected);
    }

    async fn send(&self, command: &Command) -> Result<()> {
        let mut socket = self.socket.lock().await;

        let Some(connection) = socket.as_mut() else {
            self.commands_failed.fetch_add(1, Ordering::Relaxed);
            warn!(command = %command.name(), "Encoder socket is not connected");
            return Err(LinkError::NotConnected);
        };

        info!(command = %command, "Sending to encoder");
        let line = command.encode_line();

        let exchanged = tokio::select! {
            _ = self.shutdown.cancelled() => {
                Err(LinkError::transport("Link stopped while command was in flight"))
            }
            result = connection.exchange(&line, &self.config) => result,
        };

        let response = match exchanged {
            Ok(reply) => {
                let response = DeviceResponse::parse(&reply.raw);
                if !reply.complete {
                    // Late bytes would be read as the next command's reply
                    warn!(
                        command = %command.name(),
                        response = %response,
                        "Encoder reply did not end in OK or NO, dropping connection"
                    );
                    self.teardown(&mut socket);
                }
                response
            }
            Err(e) => {
                error!(
                    command = %command.name(),
                    error = %e,
                    "Socket error while sending command to encoder, dropping connection"
                );
                self.teardown(&mut socket);
                self.commands_failed.fetch_add(1, Ordering::Relaxed);
                return Err(e);
            }
        };
        drop(socket);

        debug!(response = %response, "Encoder response");

        if response.is_empty() {
            self.commands_failed.fetch_add(1, Ordering::Relaxed);
            warn!(command = %command.name(), "No response from encoder");
            return Err(LinkError::NoResponse {
                command: command.to_string(),
            });
        }

        if !response.is_ok() {
            self.commands_failed.fetch_add(1, Ordering::Relaxed);
            if response.is_rejection() {
                warn!(command = %command, response = %response, "Command was rejected by encoder");
            } else {
                warn!(command = %command, response = %response, "Command returned an unexpected response");
            }
            return Err(LinkError::DeviceRejected {
                command: command.to_string(),
                response: response.to_string(),
            });
        }

        self.commands_sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Reconnection loop, runs until the shutdown token is cancelled
async fn supervise(shared: Arc<LinkShared>) {
    info!(address = %shared.config.address(), "Encoder link supervisor started");

    loop {
        let delay = match shared.state() {
            LinkState::Disconnected => {
                let attempt = tokio::select! {
                    _ = shared.shutdown.cancelled() => break,
                    result = shared.connect() => result,
                };

                match attempt {
                    Ok(()) => shared.config.poll_interval,
                    Err(e) => {
                        let delay = shared.backoff.lock().next_delay();
                        error!(
                            error = %e,
                            retry_in_ms = delay.as_millis() as u64,
                            "Failed to connect to SmartGen RDS encoder"
                        );
                        delay
                    }
                }
            }
            LinkState::Connecting | LinkState::Connected => shared.config.poll_interval,
        };

        tokio::select! {
            _ = shared.shutdown.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    info!("Encoder link supervisor stopped");
}

/// Handle to the encoder link
pub struct DeviceLink {
    shared: Arc<LinkShared>,
    supervisor: Mutex<Option<JoinHandle<()>>>,
}

impl DeviceLink {
    /// Create a link; no I/O happens until [`DeviceLink::start`]
    pub fn new(config: LinkConfig) -> Self {
        let backoff = Backoff::new(config.initial_backoff, config.max_backoff);
        Self {
            shared: Arc::new(LinkShared {
                config,
                socket: tokio::sync::Mutex::new(None),
                state: RwLock::new(LinkState::Disconnected),
                backoff: Mutex::new(backoff),
                shutdown: CancellationToken::new(),
                session: RwLock::new(None),
                connect_attempts: AtomicU64::new(0),
                connections: AtomicU64::new(0),
                commands_sent: AtomicU64::new(0),
                commands_failed: AtomicU64::new(0),
            }),
            supervisor: Mutex::new(None),
        }
    }

    /// Spawn the supervisor. Returns immediately; the first connection is
    /// made in the background. Calling it twice, or after
    /// [`DeviceLink::stop`], does nothing.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) {
        if self.shared.shutdown.is_cancelled() {
            warn!("Encoder link already stopped, not restarting");
            return;
        }

        let mut supervisor = self.supervisor.lock();
        if supervisor.is_some() {
            warn!("Encoder link already started");
            return;
        }

        *supervisor = Some(tokio::spawn(supervise(Arc::clone(&self.shared))));
    }

    /// Stop the supervisor, wait for it to exit and close the socket.
    /// Any backoff sleep or in-flight command is interrupted.
    pub async fn stop(&self) {
        self.shared.shutdown.cancel();

        let handle = self.supervisor.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "Encoder link supervisor ended abnormally");
            }
        }

        let connection = self.shared.socket.lock().await.take();
        if let Some(mut connection) = connection {
            if let Err(e) = connection.stream.shutdown().await {
                warn!("Error shutting down encoder socket: {}", e);
            }
            info!("Closed SmartGen socket to {}", connection.peer_addr);
        }

        *self.shared.session.write() = None;
        self.shared.set_state(LinkState::Disconnected);
    }

    /// Send `<name>=<value>` and wait for the encoder to acknowledge it.
    ///
    /// Fails immediately with [`LinkError::NotConnected`] when no socket is
    /// established. A [`LinkError::Transport`] failure, or a reply that
    /// never ends in `OK` or `NO`, also drops the socket so the supervisor
    /// reconnects.
    pub async fn send_command(&self, name: &str, value: &str) -> Result<()> {
        self.shared.send(&Command::new(name, value)).await
    }

    pub fn state(&self) -> LinkState {
        self.shared.state()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == LinkState::Connected
    }

    /// Address of the encoder while connected
    pub fn peer(&self) -> Option<SocketAddr> {
        self.shared.session.read().map(|(peer, _)| peer)
    }

    pub fn config(&self) -> &LinkConfig {
        &self.shared.config
    }

    /// Get link statistics
    pub fn stats(&self) -> LinkStats {
        LinkStats {
            state: self.state(),
            backoff: self.shared.backoff.lock().current(),
            connect_attempts: self.shared.connect_attempts.load(Ordering::Relaxed),
            connections: self.shared.connections.load(Ordering::Relaxed),
            commands_sent: self.shared.commands_sent.load(Ordering::Relaxed),
            commands_failed: self.shared.commands_failed.load(Ordering::Relaxed),
            connected_for: self.shared.session.read().map(|(_, at)| at.elapsed()),
        }
    }
}

impl Drop for DeviceLink {
    fn drop(&mut self) {
        // Let a supervisor that was never stopped wind down
        self.shared.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_timeouts() {
        let config = LinkConfig::new("encoder.local", 5000);
        assert_eq!(config.address(), "encoder.local:5000");
        assert_eq!(config.read_timeout, Duration::from_secs(5));
        assert_eq!(config.initial_backoff, Duration::from_secs(1));
        assert_eq!(config.max_backoff, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_new_link_is_disconnected() {
        let link = DeviceLink::new(LinkConfig::default());
        assert_eq!(link.state(), LinkState::Disconnected);
        assert!(!link.is_connected());

        let stats = link.stats();
        assert_eq!(stats.connect_attempts, 0);
        assert_eq!(stats.backoff, Duration::from_secs(1));
        assert!(stats.connected_for.is_none());
    }

    #[tokio::test]
    async fn test_stop_without_start_is_harmless() {
        let link = DeviceLink::new(LinkConfig::default());
        link.stop().await;
        assert_eq!(link.state(), LinkState::Disconnected);

        // Stopped links stay stopped
        link.start();
        assert!(link.supervisor.lock().is_none());
    }
}
