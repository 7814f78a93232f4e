//! # RDS Protocol Codec
//!
//! ## Purpose
//!
//! The "rules" layer for the SmartGen Mini RDS encoder protocol. Everything in
//! this crate is pure: no sockets, no clocks, no global state.
//!
//! - Display text construction (`TEXT=` value, 64 character hard limit)
//! - RT+ (RadioText Plus) tag payload construction (`RT+TAG=` value)
//! - RT+ payload decoding, used to sanity check what was sent
//! - Command line framing and device response parsing
//!
//! ## Architecture Role
//!
//! ```text
//! track metadata → [codec] → network/ (DeviceLink) → encoder hardware
//!                  DisplayText
//!                  RtPlusPayload
//!                  Command / DeviceResponse
//! ```
//!
//! ## What This Crate Does NOT Contain
//! - Socket management or reconnection (belongs in `rds-network`)
//! - Text sanitization and profanity filtering (belongs in the encoder service)

pub mod command;
pub mod constants;
pub mod display;
pub mod error;
pub mod rt_plus;

pub use command::{Command, DeviceResponse};
pub use constants::*;
pub use display::{build_display_text, DisplayText};
pub use error::{CodecError, CodecResult};
pub use rt_plus::{
    build_rt_plus_tag, decode_rt_plus, ContentType, DecodedTags, RtPlusPayload, TagField,
};
