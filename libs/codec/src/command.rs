//! Command line framing and response parsing
//!
//! Requests are single ASCII lines `<COMMAND>=<VALUE>\r\n`. Responses are one
//! or more lines; the encoder accepted the command iff the last line is `OK`.

use crate::constants::{LINE_TERMINATOR, RESPONSE_NO, RESPONSE_OK};
use std::fmt;

/// A single request to the encoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: String,
    value: String,
}

impl Command {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Wire bytes for this command. Characters outside ASCII are dropped
    /// rather than rejected.
    pub fn encode_line(&self) -> Vec<u8> {
        let mut line = Vec::with_capacity(self.name.len() + self.value.len() + 3);
        line.extend(self.name.bytes().filter(u8::is_ascii));
        line.push(b'=');
        line.extend(self.value.bytes().filter(u8::is_ascii));
        line.extend_from_slice(LINE_TERMINATOR.as_bytes());
        line
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// Decoded encoder reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceResponse {
    lines: Vec<String>,
}

impl DeviceResponse {
    /// Decode raw bytes as ASCII, dropping anything undecodable, then split
    /// the trimmed text into lines
    pub fn parse(raw: &[u8]) -> Self {
        let text: String = raw
            .iter()
            .filter(|b| b.is_ascii())
            .map(|&b| b as char)
            .collect();

        let lines = text
            .trim()
            .lines()
            .map(|line| line.trim_end_matches('\r').to_string())
            .collect();

        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn last_line(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }

    /// Accepted iff the last line is exactly `OK`
    pub fn is_ok(&self) -> bool {
        self.last_line() == Some(RESPONSE_OK)
    }

    /// Explicit refusal: the first line is `NO`
    pub fn is_rejection(&self) -> bool {
        self.lines.first().map(String::as_str) == Some(RESPONSE_NO)
    }

    /// The reply is complete: its last line is `OK` or `NO`
    pub fn is_final(&self) -> bool {
        matches!(self.last_line(), Some(RESPONSE_OK) | Some(RESPONSE_NO))
    }
}

impl fmt::Display for DeviceResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines.join(" | "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_line_appends_crlf() {
        let command = Command::new("TEXT", "RADIOHEAD - KARMA POLICE");
        assert_eq!(command.encode_line(), b"TEXT=RADIOHEAD - KARMA POLICE\r\n".to_vec());
    }

    #[test]
    fn test_encode_line_drops_non_ascii() {
        let command = Command::new("TEXT", "BJÖRK - JÓGA");
        assert_eq!(command.encode_line(), b"TEXT=BJRK - JGA\r\n".to_vec());
    }

    #[test]
    fn test_ok_is_last_line() {
        assert!(DeviceResponse::parse(b"OK").is_ok());
        assert!(DeviceResponse::parse(b"OK\r\n").is_ok());
        assert!(DeviceResponse::parse(b"TEXT=FOO\r\nOK\r\n").is_ok());
        assert!(!DeviceResponse::parse(b"OK\r\nNO\r\n").is_ok());
        assert!(!DeviceResponse::parse(b"ok").is_ok());
    }

    #[test]
    fn test_final_line_ends_the_reply() {
        assert!(DeviceResponse::parse(b"OK").is_final());
        assert!(DeviceResponse::parse(b"TEXT=FOO\r\nOK\r\n").is_final());
        assert!(DeviceResponse::parse(b"NO\r\n").is_final());
        assert!(!DeviceResponse::parse(b"TEXT=FOO\r\n").is_final());
        assert!(!DeviceResponse::parse(b"\r\n").is_final());
    }

    #[test]
    fn test_empty_and_whitespace_responses() {
        assert!(DeviceResponse::parse(b"").is_empty());
        assert!(DeviceResponse::parse(b"\r\n\r\n").is_empty());
        assert!(!DeviceResponse::parse(b"\r\n").is_ok());
    }

    #[test]
    fn test_rejection_and_garbage_bytes() {
        let response = DeviceResponse::parse(b"NO\r\n");
        assert!(response.is_rejection());
        assert!(!response.is_ok());

        let response = DeviceResponse::parse(&[0xff, b'O', b'K', 0xfe]);
        assert!(response.is_ok());
    }
}
