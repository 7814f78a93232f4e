//! # Track Pipeline
//!
//! Turns one queue message into encoder commands:
//!
//! ```text
//! JSON body → TrackEvent → Sanitizer → DisplayText ──▶ TEXT=
//!                                          └─ RtPlusPayload ──▶ RT+TAG=
//! ```
//!
//! `TEXT` always goes out first. The RT+ tag is only sent once the display
//! text it indexes into has been accepted, and a failed tag never undoes the
//! text.

use crate::error::{PipelineError, Result};
use crate::event::TrackEvent;
use crate::sanitize::Sanitizer;
use async_trait::async_trait;
use rds_codec::{
    build_display_text, build_rt_plus_tag, decode_rt_plus, CodecError, DisplayText,
    RtPlusPayload, RT_PLUS_TAG_COMMAND, TEXT_COMMAND,
};
use rds_network::{DeviceLink, LinkError};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Anything that can deliver a command to the encoder
#[async_trait]
pub trait CommandSink: Send + Sync {
    async fn send_command(&self, name: &str, value: &str) -> std::result::Result<(), LinkError>;
}

#[async_trait]
impl CommandSink for DeviceLink {
    async fn send_command(&self, name: &str, value: &str) -> std::result::Result<(), LinkError> {
        DeviceLink::send_command(self, name, value).await
    }
}

/// What reached the encoder for one event
#[derive(Debug, Clone)]
pub struct Delivered {
    pub display: DisplayText,
    /// `None` when neither artist nor title could be tagged
    pub rt_plus: Option<RtPlusPayload>,
}

/// Per-message processing: parse, sanitize, encode, send
pub struct TrackPipeline<S: CommandSink> {
    sink: Arc<S>,
    sanitizer: Sanitizer,
}

impl<S: CommandSink> TrackPipeline<S> {
    pub fn new(sink: Arc<S>, sanitizer: Sanitizer) -> Self {
        Self { sink, sanitizer }
    }

    /// Process one raw message body
    pub async fn process(&self, body: &[u8]) -> Result<Delivered> {
        let event = match TrackEvent::from_slice(body) {
            Ok(event) => event,
            Err(e) => {
                error!(
                    payload = %String::from_utf8_lossy(body),
                    error = %e,
                    "Dropping track event"
                );
                return Err(e);
            }
        };
        self.process_event(&event).await
    }

    /// Process an already parsed event
    pub async fn process_event(&self, event: &TrackEvent) -> Result<Delivered> {
        info!(
            artist = %event.artist,
            title = %event.title,
            duration = event.duration_seconds,
            "Received track"
        );

        let artist = self.sanitizer.sanitize(&event.artist);
        let title = self.sanitizer.sanitize(&event.title);

        let text = build_display_text(&artist, &title);
        let tag = build_rt_plus_tag(text.as_str(), &artist, &title, event.duration_seconds);

        self.send(TEXT_COMMAND, text.as_str()).await?;

        let rt_plus = match tag {
            Ok(payload) => payload,
            Err(CodecError::NothingToTag { artist, title }) => {
                warn!(
                    artist = %artist,
                    title = %title,
                    text = %text,
                    "Neither artist nor title fits in the display text, skipping RT+TAG"
                );
                return Ok(Delivered {
                    display: text,
                    rt_plus: None,
                });
            }
            Err(e) => {
                error!(error = %e, text = %text, "Failed to build RT+TAG payload");
                return Err(PipelineError::EncodingInvariantViolation(e));
            }
        };

        let value = rt_plus.to_string();
        self.send(RT_PLUS_TAG_COMMAND, &value).await?;

        match decode_rt_plus(&value, text.as_str()) {
            Ok(decoded) => debug!(
                artist = %decoded.artist,
                title = %decoded.title,
                "Decoded RT+ payload"
            ),
            Err(e) => warn!(payload = %value, error = %e, "Sent RT+ payload does not decode"),
        }

        Ok(Delivered {
            display: text,
            rt_plus: Some(rt_plus),
        })
    }

    async fn send(&self, command: &str, value: &str) -> Result<()> {
        self.sink
            .send_command(command, value)
            .await
            .map_err(|source| {
                error!(command = %command, error = %source, "Failed to send command to encoder");
                PipelineError::Device {
                    command: command.to_string(),
                    source,
                }
            })
    }
}
