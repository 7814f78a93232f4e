//! # RT+ (RadioText Plus) Tag Payloads
//!
//! RT+ marks substrings of the RadioText with a semantic role. The SmartGen
//! `RT+TAG=` value has eight comma separated fields:
//!
//! ```text
//! <type1>,<start1>,<len1>,<type2>,<start2>,<len2>,<running>,<timeout>
//!  00-63   00-63    00-63  00-63   00-63    00-31   0-1      0-255
//! ```
//!
//! Only two items can be tagged per command. The item toggle bit is flipped
//! by the encoder itself on every `RT+TAG` command, so it is not part of the
//! payload. Timeout is in minutes, 0 meaning the tags never expire.

use crate::constants::{
    MAX_FIELD_GROUPS, MAX_FIELD_LEN, MAX_SECOND_FIELD_LEN, MAX_TIMEOUT_MINUTES, NO_ARTIST,
    NO_TITLE,
};
use crate::error::{CodecError, CodecResult};
use std::fmt;
use tracing::{debug, error, warn};

/// RT+ content type codes used by this system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// ITEM.TITLE
    Title,
    /// ITEM.ARTIST
    Artist,
    /// DUMMY_CLASS, pads a payload carrying a single real tag
    Blank,
}

impl ContentType {
    /// Two digit wire code
    pub fn code(self) -> &'static str {
        match self {
            ContentType::Title => "01",
            ContentType::Artist => "04",
            ContentType::Blank => "00",
        }
    }

    /// Parse a wire code, accepting unpadded forms such as `4`
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().parse::<u8>().ok()? {
            1 => Some(ContentType::Title),
            4 => Some(ContentType::Artist),
            0 => Some(ContentType::Blank),
            _ => None,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One tagged item: content type plus character offset and length into the
/// RadioText
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagField {
    pub content_type: ContentType,
    pub start: u8,
    pub length: u8,
}

impl TagField {
    pub fn new(content_type: ContentType, start: u8, length: u8) -> Self {
        Self {
            content_type,
            start,
            length,
        }
    }

    /// Filler group sent when only one item could be tagged
    pub fn blank() -> Self {
        Self::new(ContentType::Blank, 0, 0)
    }

    pub fn is_blank(&self) -> bool {
        self.content_type == ContentType::Blank
    }

    /// Exclusive end offset
    pub fn end(&self) -> usize {
        self.start as usize + self.length as usize
    }
}

impl fmt::Display for TagField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_blank() {
            // The encoder expects the filler zero padded
            f.write_str("00,00,00")
        } else {
            write!(f, "{},{},{}", self.content_type, self.start, self.length)
        }
    }
}

/// Complete `RT+TAG=` value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtPlusPayload {
    fields: [TagField; MAX_FIELD_GROUPS],
    running: bool,
    timeout_minutes: u8,
}

impl RtPlusPayload {
    pub fn first(&self) -> &TagField {
        &self.fields[0]
    }

    pub fn second(&self) -> &TagField {
        &self.fields[1]
    }

    pub fn fields(&self) -> &[TagField] {
        &self.fields
    }

    /// Item running bit; this system never announces a stopped item
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn timeout_minutes(&self) -> u8 {
        self.timeout_minutes
    }

    /// Field for the given content type, if it was tagged
    pub fn field(&self, content_type: ContentType) -> Option<&TagField> {
        self.fields.iter().find(|f| f.content_type == content_type)
    }
}

impl fmt::Display for RtPlusPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.fields[0],
            self.fields[1],
            u8::from(self.running),
            self.timeout_minutes
        )
    }
}

/// Locate `needle` in `text`, returning character offset and length.
/// Length is cut to the field width.
fn locate(text: &str, needle: &str, content_type: ContentType) -> Option<TagField> {
    let Some(byte_index) = text.find(needle) else {
        warn!(
            content_type = ?content_type,
            needle = %needle,
            text = %text,
            "Substring not found in display text, omitting tag"
        );
        return None;
    };

    let start = text[..byte_index].chars().count();
    if start > MAX_FIELD_LEN {
        warn!(
            content_type = ?content_type,
            start,
            "Substring starts beyond offset {}, omitting tag",
            MAX_FIELD_LEN
        );
        return None;
    }

    let mut length = needle.chars().count();
    if length > MAX_FIELD_LEN {
        error!(
            content_type = ?content_type,
            needle = %needle,
            "Substring exceeds {} characters, trimming",
            MAX_FIELD_LEN
        );
        length = MAX_FIELD_LEN;
    }

    Some(TagField::new(content_type, start as u8, length as u8))
}

/// Build the `RT+TAG=` payload for `text`, tagging `artist` and `title`
/// where they occur in it.
///
/// Empty artist or title values are not tagged. Items that do not occur in
/// the display text (typically cut off by truncation) are omitted rather
/// than tagged at a wrong offset. A single surviving item is padded with a
/// blank group; no surviving item is an error.
pub fn build_rt_plus_tag(
    text: &str,
    artist: &str,
    title: &str,
    duration_seconds: u64,
) -> CodecResult<RtPlusPayload> {
    debug!("Building `RT+TAG` payload");

    let mut groups: Vec<TagField> = Vec::with_capacity(MAX_FIELD_GROUPS);

    for (content_type, value, sentinel) in [
        (ContentType::Artist, artist, NO_ARTIST),
        (ContentType::Title, title, NO_TITLE),
    ] {
        if value.is_empty() || value == sentinel {
            warn!(content_type = ?content_type, "No value provided, using `{}`", sentinel);
            continue;
        }
        if let Some(field) = locate(text, value, content_type) {
            groups.push(field);
        }
    }

    if groups.is_empty() {
        error!(text = %text, "No valid artist or title found in display text");
        return Err(CodecError::NothingToTag {
            artist: artist.to_string(),
            title: title.to_string(),
        });
    }

    if groups.len() > MAX_FIELD_GROUPS {
        error!(
            count = groups.len(),
            "More than two RT+ field groups produced, refusing to truncate"
        );
        return Err(CodecError::TooManyFieldGroups {
            count: groups.len(),
        });
    }

    if groups.len() == 1 {
        groups.push(TagField::blank());
    }

    // The second length field has a narrower range than every other field
    if groups[1].length as usize > MAX_SECOND_FIELD_LEN {
        debug!(
            length = groups[1].length,
            "Second RT+ length exceeds {}, clamping", MAX_SECOND_FIELD_LEN
        );
        groups[1].length = MAX_SECOND_FIELD_LEN as u8;
    }

    let timeout_minutes = (duration_seconds / 60).min(MAX_TIMEOUT_MINUTES) as u8;

    let payload = RtPlusPayload {
        fields: [groups[0], groups[1]],
        running: true,
        timeout_minutes,
    };

    debug!(payload = %payload, "Final `RT+TAG` payload");
    Ok(payload)
}

/// Artist and title recovered from an RT+ payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedTags {
    pub artist: String,
    pub title: String,
}

fn parse_number(raw: &str, name: &str) -> CodecResult<usize> {
    raw.trim()
        .parse::<usize>()
        .map_err(|_| CodecError::malformed(format!("{} `{}` is not a number", name, raw)))
}

fn slice_chars(text: &str, start: usize, length: usize) -> String {
    text.chars().skip(start).take(length).collect()
}

/// Decode an `RT+TAG=` value against the RadioText it was built for.
///
/// An item with no tag decodes to an empty string.
pub fn decode_rt_plus(payload: &str, text: &str) -> CodecResult<DecodedTags> {
    debug!(payload = %payload, text = %text, "Decoding RT+ payload");

    let parts: Vec<&str> = payload.split(',').collect();
    if parts.len() != 8 {
        return Err(CodecError::malformed(format!(
            "expected 8 fields, got {}",
            parts.len()
        )));
    }

    let first = ContentType::from_code(parts[0]).ok_or_else(|| CodecError::InvalidContentType {
        code: parts[0].to_string(),
    })?;
    if first == ContentType::Blank {
        return Err(CodecError::InvalidContentType {
            code: parts[0].to_string(),
        });
    }
    let second = ContentType::from_code(parts[3]).ok_or_else(|| CodecError::InvalidContentType {
        code: parts[3].to_string(),
    })?;

    let groups = [
        (first, parse_number(parts[1], "start1")?, parse_number(parts[2], "length1")?),
        (second, parse_number(parts[4], "start2")?, parse_number(parts[5], "length2")?),
    ];
    let running = parse_number(parts[6], "running bit")?;
    if running > 1 {
        return Err(CodecError::malformed(format!("running bit {} is not 0 or 1", running)));
    }
    parse_number(parts[7], "timeout")?;

    let mut decoded = DecodedTags::default();
    for (content_type, start, length) in groups {
        match content_type {
            ContentType::Artist => decoded.artist = slice_chars(text, start, length),
            ContentType::Title => decoded.title = slice_chars(text, start, length),
            ContentType::Blank => {}
        }
    }

    Ok(decoded)
}
