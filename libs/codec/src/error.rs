//! Codec errors for RT+ payload construction and decoding

use thiserror::Error;

/// Result type alias for codec operations
pub type CodecResult<T> = std::result::Result<T, CodecError>;

/// Errors produced while building or decoding protocol values
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Neither artist nor title could be located in the display text
    #[error("Nothing to tag: neither artist `{artist}` nor title `{title}` found in display text")]
    NothingToTag { artist: String, title: String },

    /// More than two field groups were produced; the protocol carries two
    #[error("RT+ payload would carry {count} field groups, protocol allows 2")]
    TooManyFieldGroups { count: usize },

    /// Payload did not have the expected shape
    #[error("Malformed RT+ payload: {reason}")]
    MalformedPayload { reason: String },

    /// Content type code not valid in this position
    #[error("Invalid RT+ content type code `{code}`")]
    InvalidContentType { code: String },
}

impl CodecError {
    /// Create a malformed payload error
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            reason: reason.into(),
        }
    }

    /// Whether this error means the codec itself misbehaved, as opposed to
    /// the input simply having nothing worth tagging
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, CodecError::TooManyFieldGroups { .. })
    }
}
