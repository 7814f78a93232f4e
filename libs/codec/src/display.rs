//! `TEXT=` value construction

use crate::constants::MAX_TEXT_LEN;
use std::fmt;
use tracing::{debug, warn};

/// RadioText as shown on receivers: `"<ARTIST> - <TITLE>"`, uppercase, at
/// most [`MAX_TEXT_LEN`] characters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayText {
    text: String,
    truncated: bool,
}

impl DisplayText {
    /// The text to send as the `TEXT=` value
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether the joined text was cut to fit the limit
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Whether `needle` survives intact in the displayed text
    pub fn contains(&self, needle: &str) -> bool {
        !needle.is_empty() && self.text.contains(needle)
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for DisplayText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl AsRef<str> for DisplayText {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

/// Join artist and title as `"<ARTIST> - <TITLE>"` and cut the result to the
/// first 64 characters. Truncation can cut mid-word; nothing is rebalanced.
pub fn build_display_text(artist: &str, title: &str) -> DisplayText {
    let joined = format!("{} - {}", artist, title).to_uppercase();
    let truncated = joined.chars().count() > MAX_TEXT_LEN;

    let text = if truncated {
        let cut: String = joined.chars().take(MAX_TEXT_LEN).collect();
        warn!(
            original = %joined,
            truncated = %cut,
            "TEXT value exceeds {} characters",
            MAX_TEXT_LEN
        );
        cut
    } else {
        joined
    };

    debug!(text = %text, truncated, "Built TEXT value");
    DisplayText { text, truncated }
}
