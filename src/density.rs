//! Lexical density
//!
//! Share of content words among the non-punctuation tokens of a document.
//! Runs over the unfiltered token sequence: function words are excluded by
//! part of speech, not by spelling.

use crate::config::{EngineConfig, LabelSet};
use crate::types::{Document, Token};

/// Lexical density calculator bound to one engine configuration
#[derive(Debug, Clone)]
pub struct DensityCalculator {
    content_pos: LabelSet,
    punctuation_pos: LabelSet,
}

/// Counts behind a lexical density value
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DensityMeasure {
    pub content_words: usize,
    pub counted_tokens: usize,
    pub lexical_density: f64,
}

impl DensityCalculator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            content_pos: LabelSet::from(&config.content_pos_set),
            punctuation_pos: LabelSet::from(&config.punctuation_pos),
        }
    }

    /// Lexical density of a document, 0 when it has no non-punctuation tokens
    pub fn lexical_density(&self, document: &Document) -> f64 {
        self.measure(document).lexical_density
    }

    pub fn measure(&self, document: &Document) -> DensityMeasure {
        let counted: Vec<&Token> = document
            .tokens()
            .iter()
            .filter(|token| !self.is_punctuation(token))
            .collect();

        let content_words = counted
            .iter()
            .filter(|token| self.content_pos.contains(&token.pos))
            .count();

        let lexical_density = if counted.is_empty() {
            0.0
        } else {
            content_words as f64 / counted.len() as f64
        };

        DensityMeasure {
            content_words,
            counted_tokens: counted.len(),
            lexical_density,
        }
    }

    /// Punctuation by tag, or by surface text made only of non-alphanumeric characters
    fn is_punctuation(&self, token: &Token) -> bool {
        self.punctuation_pos.contains(&token.pos) || !token.text.chars().any(char::is_alphanumeric)
    }
}
