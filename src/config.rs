//! Engine configuration
//!
//! Label vocabularies differ between annotation backends, so every tag set the
//! engine matches against lives here rather than in the calculators. Tags and
//! labels are compared case-insensitively.

use crate::error::ComputeError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Default MATTR window length (tokens)
pub const DEFAULT_WINDOW_LENGTH: usize = 30;

/// Universal POS tags counted as content words
pub const DEFAULT_CONTENT_POS: &[&str] = &["NOUN", "PROPN", "VERB", "ADJ", "ADV"];

/// Dependency labels marking subordinate clauses
pub const DEFAULT_CLAUSE_LABELS: &[&str] =
    &["advcl", "acl", "relcl", "acl:relcl", "ccomp", "xcomp", "pcomp"];

const DEFAULT_ROOT_LABELS: &[&str] = &["ROOT", "root"];
const DEFAULT_COORDINATION_LABELS: &[&str] = &["conj"];
const DEFAULT_PUNCTUATION_POS: &[&str] = &["PUNCT"];
const DEFAULT_ABBREVIATIONS: &[&str] = &["mr", "mrs", "ms", "dr", "prof", "etc", "vs", "eg", "ie"];
const DEFAULT_SINGLE_LETTER_WORDS: &[&str] = &["a", "i"];
const DEFAULT_CONTRACTIONS: &[(&str, &str)] = &[
    ("n't", "not"),
    ("'ll", "will"),
    ("'ve", "have"),
    ("'re", "are"),
    ("'d", "would"),
    ("'m", "am"),
];

/// What the DCR denominator counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseCountBasis {
    /// Root and coordinate-root predicates, falling back to sentences when none exist
    #[default]
    RootPredicates,
    /// Number of sentences
    SentenceCount,
}

/// Caller-supplied engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// MATTR window size in tokens
    pub window_length: usize,
    /// POS tags counted as content words for lexical density
    pub content_pos_set: BTreeSet<String>,
    /// Dependency labels counted as subordinate clauses for DCR
    pub clause_dependency_labels: BTreeSet<String>,
    /// DCR denominator basis
    pub clause_count_basis: ClauseCountBasis,
    /// Dependency labels marking a sentence root
    pub root_labels: BTreeSet<String>,
    /// Dependency labels joining coordinate clauses to their head clause
    pub coordination_labels: BTreeSet<String>,
    /// POS tags treated as punctuation regardless of surface text
    pub punctuation_pos: BTreeSet<String>,
    /// Forms excluded from the filtered view; empty disables stopword filtering
    pub stopwords: BTreeSet<String>,
    /// Forms admitted to the filtered view without a dictionary lookup
    pub abbreviations: BTreeSet<String>,
    /// Single-letter forms that are real words; other single letters are dropped
    pub single_letter_words: BTreeSet<String>,
    /// Clitic tokens (as split off by the annotator) mapped to their full word
    pub contractions: BTreeMap<String, String>,
    /// Abort the run on the first failing document instead of skipping it
    pub fail_fast: bool,
    /// Compute documents on the rayon thread pool
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_length: DEFAULT_WINDOW_LENGTH,
            content_pos_set: label_set(DEFAULT_CONTENT_POS),
            clause_dependency_labels: label_set(DEFAULT_CLAUSE_LABELS),
            clause_count_basis: ClauseCountBasis::default(),
            root_labels: label_set(DEFAULT_ROOT_LABELS),
            coordination_labels: label_set(DEFAULT_COORDINATION_LABELS),
            punctuation_pos: label_set(DEFAULT_PUNCTUATION_POS),
            stopwords: BTreeSet::new(),
            abbreviations: label_set(DEFAULT_ABBREVIATIONS),
            single_letter_words: label_set(DEFAULT_SINGLE_LETTER_WORDS),
            contractions: DEFAULT_CONTRACTIONS
                .iter()
                .map(|(clitic, word)| (clitic.to_string(), word.to_string()))
                .collect(),
            fail_fast: false,
            parallel: true,
        }
    }
}

impl EngineConfig {
    /// Load configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ComputeError::ConfigurationError(format!("invalid config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_window_length(mut self, window_length: usize) -> Self {
        self.window_length = window_length;
        self
    }

    pub fn with_clause_count_basis(mut self, basis: ClauseCountBasis) -> Self {
        self.clause_count_basis = basis;
        self
    }

    pub fn with_content_pos<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.content_pos_set = tags.into_iter().map(|t| t.as_ref().to_string()).collect();
        self
    }

    pub fn with_clause_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.clause_dependency_labels = labels
            .into_iter()
            .map(|l| l.as_ref().to_string())
            .collect();
        self
    }

    pub fn with_stopwords<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.stopwords = words.into_iter().map(|w| w.as_ref().to_string()).collect();
        self
    }

    pub fn with_contractions<I, K, V>(mut self, contractions: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.contractions = contractions
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
            .collect();
        self
    }

    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    pub fn fail_fast(mut self) -> Self {
        self.fail_fast = true;
        self
    }

    /// Reject configurations no document could be measured under
    pub fn validate(&self) -> Result<(), ComputeError> {
        if self.window_length == 0 {
            return Err(ComputeError::ConfigurationError(
                "window_length must be a positive integer".to_string(),
            ));
        }

        let required = [
            ("content_pos_set", &self.content_pos_set),
            ("clause_dependency_labels", &self.clause_dependency_labels),
            ("root_labels", &self.root_labels),
            ("punctuation_pos", &self.punctuation_pos),
        ];
        for (name, set) in required {
            if set.iter().all(|label| label.trim().is_empty()) {
                return Err(ComputeError::ConfigurationError(format!(
                    "{name} must contain at least one label"
                )));
            }
        }

        Ok(())
    }
}

fn label_set(labels: &[&str]) -> BTreeSet<String> {
    labels.iter().map(|l| l.to_string()).collect()
}

/// Case-insensitive label set used by the calculators
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct LabelSet(BTreeSet<String>);

impl LabelSet {
    pub(crate) fn contains(&self, label: &str) -> bool {
        self.0.contains(&label.to_lowercase())
    }
}

impl From<&BTreeSet<String>> for LabelSet {
    fn from(labels: &BTreeSet<String>) -> Self {
        Self(
            labels
                .iter()
                .map(|l| l.trim().to_lowercase())
                .filter(|l| !l.is_empty())
                .collect(),
        )
    }
}
