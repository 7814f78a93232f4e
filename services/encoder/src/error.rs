//! Error types for the encoder service

use rds_codec::CodecError;
use rds_network::LinkError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Why a single track event did not make it to the encoder
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Payload was not valid JSON or lacked artist/title
    #[error("Malformed track event: {reason}")]
    MalformedEvent { reason: String },

    /// RT+ payload construction broke an internal invariant
    #[error("RT+ encoding invariant violated: {0}")]
    EncodingInvariantViolation(#[from] CodecError),

    /// The encoder link failed the command
    #[error("Encoder command `{command}` failed: {source}")]
    Device { command: String, source: LinkError },
}

impl PipelineError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedEvent {
            reason: reason.into(),
        }
    }

    /// Event was discarded before any command was sent
    pub fn is_dropped(&self) -> bool {
        matches!(self, PipelineError::MalformedEvent { .. })
    }
}

/// Failure reading deliveries from a source
#[derive(Debug, Error)]
pub enum SourceError {
    /// Endpoint string is not `stdin`, `unix://...` or `tcp://...`
    #[error("Invalid source endpoint `{endpoint}`: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// Could not open the endpoint
    #[error("Failed to connect to source `{endpoint}`: {source}")]
    Connect {
        endpoint: String,
        source: std::io::Error,
    },

    /// I/O error while reading deliveries
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A line over the length cap was discarded
    #[error("Discarded line longer than {limit} bytes")]
    LineTooLong { limit: usize },
}

impl SourceError {
    /// The source can still be read after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SourceError::LineTooLong { .. })
    }
}

/// Failure loading the profanity word list
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Failed to read word list {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse word list {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Word list is empty")]
    Empty,

    #[error("Failed to compile profanity pattern: {0}")]
    Pattern(#[from] regex::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_malformed_events_count_as_dropped() {
        let malformed = PipelineError::malformed("missing artist");
        assert!(malformed.is_dropped());

        let device = PipelineError::Device {
            command: "TEXT".to_string(),
            source: LinkError::NotConnected,
        };
        assert!(!device.is_dropped());
        assert!(device.to_string().contains("not connected"));
    }
}
