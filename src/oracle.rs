//! External oracles
//!
//! The engine never tags text or checks spelling itself. Both capabilities are
//! injected through these traits so any annotation backend or dictionary can
//! sit behind them.

use crate::error::ComputeError;
use crate::types::{Document, RawSample};
use std::collections::HashSet;

/// Vocabulary membership oracle used by the token filter
pub trait Dictionary: Send + Sync {
    /// Whether `word` (already lowercased) is a correctly spelled word.
    ///
    /// Returns `ComputeError::AnnotationUnavailable` when the backing
    /// dictionary cannot be consulted.
    fn is_known(&self, word: &str) -> Result<bool, ComputeError>;
}

/// Annotation oracle turning a raw sample into an annotated document
pub trait Annotator: Send + Sync {
    fn annotate(&self, sample: &RawSample) -> Result<Document, ComputeError>;
}

/// In-memory word list dictionary
#[derive(Debug, Clone, Default)]
pub struct WordListDictionary {
    words: HashSet<String>,
}

impl WordListDictionary {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// Parse a newline-separated word list; `#` lines are comments
    pub fn from_word_list(list: &str) -> Self {
        Self::new(
            list.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        )
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Dictionary for WordListDictionary {
    fn is_known(&self, word: &str) -> Result<bool, ComputeError> {
        Ok(self.words.contains(word))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_list_lookup_is_lowercase() {
        let dict = WordListDictionary::new(["Cat", " sat "]);
        assert!(dict.is_known("cat").unwrap());
        assert!(dict.is_known("sat").unwrap());
        assert!(!dict.is_known("dog").unwrap());
        assert_eq!(dict.len(), 2);
    }

    #[test]
    fn test_from_word_list_skips_comments() {
        let dict = WordListDictionary::from_word_list("# header\nthe\n\ncat\n");
        assert_eq!(dict.len(), 2);
        assert!(dict.is_known("the").unwrap());
        assert!(!dict.is_known("# header").unwrap());
    }
}
