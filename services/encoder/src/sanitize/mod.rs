//! Broadcast text normalization
//!
//! The encoder only accepts printable ASCII. Every artist and title passes
//! through [`Sanitizer::sanitize`] before display text or RT+ offsets are
//! computed, so offsets always index into what was actually sent.

mod profanity;

pub use profanity::ProfanityFilter;

use rds_codec::MAX_TEXT_LEN;
use tracing::debug;

/// Artist/title normalizer
#[derive(Debug, Clone, Default)]
pub struct Sanitizer {
    profanity: Option<ProfanityFilter>,
}

impl Sanitizer {
    pub fn new(profanity: Option<ProfanityFilter>) -> Self {
        Self { profanity }
    }

    /// Sanitizer without profanity masking
    pub fn without_filter() -> Self {
        Self::default()
    }

    pub fn filters_profanity(&self) -> bool {
        self.profanity.is_some()
    }

    /// ASCII-fold, strip control characters, collapse whitespace, mask
    /// profanity, uppercase, cap at 64 characters
    pub fn sanitize(&self, raw: &str) -> String {
        let folded = deunicode::deunicode(raw);

        let cleaned = folded
            .chars()
            .map(|c| if c.is_control() { ' ' } else { c })
            .collect::<String>();
        let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

        let masked = match &self.profanity {
            Some(filter) => filter.mask(&collapsed).into_owned(),
            None => collapsed,
        };

        let sanitized: String = masked.to_uppercase().chars().take(MAX_TEXT_LEN).collect();
        if sanitized != raw {
            debug!(raw = %raw, sanitized = %sanitized, "Sanitized text");
        }
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folds_accents_to_ascii() {
        let sanitizer = Sanitizer::without_filter();
        assert_eq!(sanitizer.sanitize("Beyoncé"), "BEYONCE");
        assert_eq!(sanitizer.sanitize("Sigur Rós"), "SIGUR ROS");
        assert!(sanitizer.sanitize("Motörhead – Ace of Spades").is_ascii());
    }

    #[test]
    fn test_collapses_whitespace_and_controls() {
        let sanitizer = Sanitizer::without_filter();
        assert_eq!(sanitizer.sanitize("  Karma\tPolice \n"), "KARMA POLICE");
        assert_eq!(sanitizer.sanitize("A\u{0007}B"), "A B");
    }

    #[test]
    fn test_caps_length() {
        let sanitizer = Sanitizer::without_filter();
        assert_eq!(sanitizer.sanitize(&"x".repeat(100)).len(), MAX_TEXT_LEN);
    }

    #[test]
    fn test_masks_profanity_by_whole_word() {
        let filter = ProfanityFilter::from_words(["darn"]).unwrap();
        let sanitizer = Sanitizer::new(Some(filter));
        assert!(sanitizer.filters_profanity());
        assert_eq!(sanitizer.sanitize("Darn Darned Darn"), "**** DARNED ****");
    }
}
