//! Inbound track announcement

use crate::error::{PipelineError, Result};
use serde::Deserialize;

/// One now-playing announcement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackEvent {
    pub artist: String,
    pub title: String,
    pub duration_seconds: u64,
}

/// Wire shape; everything optional so missing fields get a precise reason
#[derive(Debug, Deserialize)]
struct RawTrackEvent {
    artist: Option<String>,
    #[serde(alias = "song")]
    title: Option<String>,
    duration: Option<u64>,
}

impl TrackEvent {
    /// Parse a queue message body
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let raw: RawTrackEvent = serde_json::from_slice(body)
            .map_err(|e| PipelineError::malformed(format!("invalid JSON: {}", e)))?;

        let artist = required(raw.artist, "artist")?;
        let title = required(raw.title, "song")?;

        Ok(Self {
            artist,
            title,
            duration_seconds: raw.duration.unwrap_or(0),
        })
    }
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        Some(_) => Err(PipelineError::malformed(format!("`{}` is blank", field))),
        None => Err(PipelineError::malformed(format!("missing `{}`", field))),
    }
}
