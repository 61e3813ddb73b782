//! Token filtering
//!
//! Decides which tokens of a document take part in the vocabulary measures
//! (TTR and MATTR). A token survives when its lowercased form is non-empty,
//! purely alphabetic, not a configured stopword, and known to the dictionary.
//! Configured abbreviations skip the dictionary lookup; single letters other
//! than the configured single-letter words are dropped. Clitics split off by
//! the annotator ("n't", "'ll") are replaced by their full word first.

use crate::config::{EngineConfig, LabelSet};
use crate::error::ComputeError;
use crate::oracle::Dictionary;
use crate::types::{Document, FilteredTokenView};
use std::borrow::Cow;
use std::collections::HashMap;

const APOSTROPHES: [char; 2] = ['\'', '\u{2019}'];

/// Token filter bound to one engine configuration
#[derive(Debug, Clone)]
pub struct TokenFilter {
    stopwords: LabelSet,
    abbreviations: LabelSet,
    single_letter_words: LabelSet,
    contractions: HashMap<String, String>,
}

impl TokenFilter {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            stopwords: LabelSet::from(&config.stopwords),
            abbreviations: LabelSet::from(&config.abbreviations),
            single_letter_words: LabelSet::from(&config.single_letter_words),
            contractions: config
                .contractions
                .iter()
                .map(|(clitic, word)| {
                    (
                        clitic.trim().to_lowercase().replace('\u{2019}', "'"),
                        word.trim().to_lowercase(),
                    )
                })
                .collect(),
        }
    }

    /// Build the filtered view of a document.
    ///
    /// Fails with the dictionary's error if it cannot be consulted; filtering
    /// is never skipped silently.
    pub fn filter<'a>(
        &self,
        document: &'a Document,
        dictionary: &dyn Dictionary,
    ) -> Result<FilteredTokenView<'a>, ComputeError> {
        let mut indices = Vec::new();
        let mut forms = Vec::new();

        for (index, token) in document.tokens().iter().enumerate() {
            let form = self.expand_contraction(normalize(&token.text));
            if self.admits(&form, dictionary)? {
                indices.push(index);
                forms.push(form);
            }
        }

        Ok(FilteredTokenView::new(document, indices, forms))
    }

    fn expand_contraction<'d>(&self, form: Cow<'d, str>) -> Cow<'d, str> {
        if !form.contains(APOSTROPHES) {
            return form;
        }
        let key = form.replace('\u{2019}', "'");
        match self.contractions.get(&key) {
            Some(word) => Cow::Owned(word.clone()),
            None => form,
        }
    }

    fn admits(&self, form: &str, dictionary: &dyn Dictionary) -> Result<bool, ComputeError> {
        if form.is_empty() || !form.chars().all(char::is_alphabetic) {
            return Ok(false);
        }
        if self.stopwords.contains(form) {
            return Ok(false);
        }
        if form.chars().count() == 1 && !self.single_letter_words.contains(form) {
            return Ok(false);
        }
        if self.abbreviations.contains(form) {
            return Ok(true);
        }
        dictionary.is_known(form)
    }
}

/// Trim and lowercase a surface form, borrowing when it is already normalized
pub fn normalize(text: &str) -> Cow<'_, str> {
    let trimmed = text.trim();
    if trimmed.chars().any(char::is_uppercase) {
        Cow::Owned(trimmed.to_lowercase())
    } else {
        Cow::Borrowed(trimmed)
    }
}
