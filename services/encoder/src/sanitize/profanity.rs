//! Whole-word profanity masking

use crate::error::FilterError;
use regex::{Captures, Regex, RegexBuilder};
use std::borrow::Cow;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Masks listed words with asterisks of the same length.
///
/// Matching is case-insensitive and whole-word only: `ass` is masked, `class`
/// is not. All words compile into one pattern at startup.
#[derive(Debug, Clone)]
pub struct ProfanityFilter {
    pattern: Regex,
    word_count: usize,
}

impl ProfanityFilter {
    pub fn from_words<I, S>(words: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut words: Vec<String> = words
            .into_iter()
            .map(|word| word.as_ref().trim().to_string())
            .filter(|word| !word.is_empty())
            .collect();

        if words.is_empty() {
            return Err(FilterError::Empty);
        }

        // Longest first so a phrase wins over a word it contains
        words.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        words.dedup();

        let alternatives: Vec<String> = words.iter().map(|word| regex::escape(word)).collect();
        let pattern = RegexBuilder::new(&format!(r"\b(?:{})\b", alternatives.join("|")))
            .case_insensitive(true)
            .build()?;

        debug!(words = words.len(), "Compiled profanity filter");

        Ok(Self {
            pattern,
            word_count: words.len(),
        })
    }

    /// Load a `words.json` style JSON array, or one word per line with `#`
    /// comments
    pub fn load(path: &Path) -> Result<Self, FilterError> {
        let contents = fs::read_to_string(path).map_err(|source| FilterError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let filter = if contents.trim_start().starts_with('[') {
            let words: Vec<String> =
                serde_json::from_str(&contents).map_err(|source| FilterError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?;
            Self::from_words(words)?
        } else {
            Self::from_words(
                contents
                    .lines()
                    .filter(|line| !line.trim_start().starts_with('#')),
            )?
        };

        info!(path = ?path, words = filter.word_count, "Loaded profanity word list");
        Ok(filter)
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    /// Replace every listed word with `*` of equal length
    pub fn mask<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let masked = self.pattern.replace_all(text, |caps: &Captures| {
            "*".repeat(caps[0].chars().count())
        });

        if let Cow::Owned(_) = masked {
            info!("Masked profane words in `{}`", masked);
        }
        masked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn filter() -> ProfanityFilter {
        ProfanityFilter::from_words(["darn", "heck", "dang it"]).unwrap()
    }

    #[test]
    fn test_masks_whole_words_only() {
        let filter = filter();
        assert_eq!(filter.mask("darn it all"), "**** it all");
        assert_eq!(filter.mask("darned socks"), "darned socks");
        assert_eq!(filter.mask("what the heck."), "what the ****.");
    }

    #[test]
    fn test_case_insensitive_and_phrase() {
        let filter = filter();
        assert_eq!(filter.mask("DARN IT, DANG IT"), "**** IT, *******");
        assert!(filter.is_match("Heck"));
        assert!(!filter.is_match("checkers"));
    }

    #[test]
    fn test_untouched_text_is_borrowed() {
        assert!(matches!(filter().mask("clean text"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_empty_list_is_rejected() {
        assert!(matches!(
            ProfanityFilter::from_words(["", "  "]),
            Err(FilterError::Empty)
        ));
    }

    #[test]
    fn test_load_json_and_plain_lists() {
        let mut json = tempfile::NamedTempFile::new().unwrap();
        write!(json, r#"["darn", "heck"]"#).unwrap();
        assert_eq!(ProfanityFilter::load(json.path()).unwrap().word_count(), 2);

        let mut plain = tempfile::NamedTempFile::new().unwrap();
        writeln!(plain, "# mild words").unwrap();
        writeln!(plain, "darn").unwrap();
        writeln!(plain).unwrap();
        writeln!(plain, "heck").unwrap();
        let filter = ProfanityFilter::load(plain.path()).unwrap();
        assert_eq!(filter.word_count(), 2);
        assert_eq!(filter.mask("heck"), "****");
    }

    #[test]
    fn test_load_reports_bad_json() {
        let mut json = tempfile::NamedTempFile::new().unwrap();
        write!(json, r#"["darn", 3]"#).unwrap();
        assert!(matches!(
            ProfanityFilter::load(json.path()),
            Err(FilterError::Parse { .. })
        ));
    }
}
