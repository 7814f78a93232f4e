//! Device link error types

use thiserror::Error;

/// Result type alias for link operations
pub type Result<T> = std::result::Result<T, LinkError>;

/// Failure of a single command exchange with the encoder
#[derive(Error, Debug)]
pub enum LinkError {
    /// No socket is currently established
    #[error("Encoder socket is not connected")]
    NotConnected,

    /// I/O failure on the socket; the link has been torn down
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        source: Option<std::io::Error>,
    },

    /// The encoder answered with nothing usable
    #[error("No response from encoder to `{command}`")]
    NoResponse { command: String },

    /// The encoder answered but the last line was not `OK`
    #[error("Command `{command}` rejected by encoder: `{response}`")]
    DeviceRejected { command: String, response: String },
}

impl LinkError {
    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Create a transport error with source
    pub fn transport_with_source(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Transport {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Whether the socket was dropped as a result of this error
    pub fn is_transport(&self) -> bool {
        matches!(self, LinkError::Transport { .. })
    }

    /// Whether this failure should reach a human: the device is reachable
    /// but unhappy, as opposed to simply offline
    pub fn should_alert(&self) -> bool {
        matches!(
            self,
            LinkError::NoResponse { .. } | LinkError::DeviceRejected { .. }
        )
    }
}
