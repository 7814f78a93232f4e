//! Protocol constants for the SmartGen Mini encoder

/// Command setting the RadioText shown on receivers
pub const TEXT_COMMAND: &str = "TEXT";

/// Command setting the RT+ tags for the current RadioText
pub const RT_PLUS_TAG_COMMAND: &str = "RT+TAG";

/// Hard limit of the `TEXT=` value
pub const MAX_TEXT_LEN: usize = 64;

/// Widest start/length field in an RT+ payload (00-63)
pub const MAX_FIELD_LEN: usize = 63;

/// The second group's length field only accepts 00-31
pub const MAX_SECOND_FIELD_LEN: usize = 31;

/// Timeout field range is 0-255 minutes, 0 meaning no timeout
pub const MAX_TIMEOUT_MINUTES: u64 = 255;

/// RT+ carries at most two tagged items per command
pub const MAX_FIELD_GROUPS: usize = 2;

/// Placeholder used in logs when a track has no artist
pub const NO_ARTIST: &str = "NO ARTIST";

/// Placeholder used in logs when a track has no title
pub const NO_TITLE: &str = "NO TITLE";

/// Final response line signalling the encoder accepted a command
pub const RESPONSE_OK: &str = "OK";

/// First response line signalling the encoder refused a command
pub const RESPONSE_NO: &str = "NO";

/// Line terminator for requests
pub const LINE_TERMINATOR: &str = "\r\n";
