//! Core types for the Synheart Lexis engine
//!
//! This module defines the data structures that flow through each stage of the
//! engine: annotated documents, filtered token views, per-document metric
//! records, per-student timelines, and the payload handed to report renderers.

use crate::error::ComputeError;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// A single annotated token produced by the external annotation pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Surface text as it appeared in the sample
    pub text: String,
    /// Lemma assigned by the annotator
    #[serde(default)]
    pub lemma: String,
    /// Part-of-speech tag (backend vocabulary, e.g. "NOUN")
    pub pos: String,
    /// Dependency relation label (backend vocabulary, e.g. "nsubj")
    pub dep: String,
    /// Document-level index of the syntactic head (own index for roots)
    pub head: usize,
}

impl Token {
    pub fn new(text: &str, lemma: &str, pos: &str, dep: &str, head: usize) -> Self {
        Self {
            text: text.to_string(),
            lemma: lemma.to_string(),
            pos: pos.to_string(),
            dep: dep.to_string(),
            head,
        }
    }
}

/// Metadata identifying where a document came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Student the sample belongs to
    pub student_id: String,
    /// Date label derived from the file name (e.g. "2024-01-15", "Week3")
    pub date_label: String,
    /// Source identifier (file path) of the sample
    pub source_path: String,
}

impl DocumentMetadata {
    pub fn new(student_id: &str, date_label: &str, source_path: &str) -> Self {
        Self {
            student_id: student_id.to_string(),
            date_label: date_label.to_string(),
            source_path: source_path.to_string(),
        }
    }

    /// File name component of the source path, used as an ordering tie-break
    pub fn file_name(&self) -> &str {
        self.source_path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.source_path.as_str())
    }
}

/// An annotated writing sample. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    metadata: DocumentMetadata,
    tokens: Vec<Token>,
    sentence_starts: Vec<usize>,
}

impl Document {
    /// Build a document, checking that every head index points inside the document
    pub fn new(metadata: DocumentMetadata, tokens: Vec<Token>) -> Result<Self, ComputeError> {
        Self::with_sentences(metadata, tokens, Vec::new())
    }

    /// Build a document with explicit sentence boundaries (start token indices)
    pub fn with_sentences(
        metadata: DocumentMetadata,
        tokens: Vec<Token>,
        sentence_starts: Vec<usize>,
    ) -> Result<Self, ComputeError> {
        if metadata.student_id.trim().is_empty() {
            return Err(ComputeError::MalformedMetadata(format!(
                "missing student id for '{}'",
                metadata.source_path
            )));
        }

        if let Some((index, token)) = tokens
            .iter()
            .enumerate()
            .find(|(_, token)| token.head >= tokens.len())
        {
            return Err(ComputeError::ParseError(format!(
                "token {index} ('{}') has head {} outside document of {} tokens",
                token.text,
                token.head,
                tokens.len()
            )));
        }

        let ordered = sentence_starts.windows(2).all(|pair| pair[0] < pair[1]);
        let in_range = sentence_starts
            .last()
            .map_or(true, |&last| last < tokens.len().max(1));
        if !ordered || !in_range {
            return Err(ComputeError::ParseError(format!(
                "sentence boundaries {sentence_starts:?} are not ascending within {} tokens",
                tokens.len()
            )));
        }

        Ok(Self {
            metadata,
            tokens,
            sentence_starts,
        })
    }

    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn sentence_starts(&self) -> &[usize] {
        &self.sentence_starts
    }

    /// Number of sentences: explicit boundaries when the annotator supplied
    /// them, otherwise the number of self-headed tokens (at least one for a
    /// non-empty document)
    pub fn sentence_count(&self) -> usize {
        if !self.sentence_starts.is_empty() {
            return self.sentence_starts.len();
        }
        if self.tokens.is_empty() {
            return 0;
        }
        let roots = self
            .tokens
            .iter()
            .enumerate()
            .filter(|(index, token)| token.head == *index)
            .count();
        roots.max(1)
    }
}

/// Raw, not yet annotated writing sample
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSample {
    pub metadata: DocumentMetadata,
    pub text: String,
}

/// Tokens of a document surviving the filter policy, in document order
#[derive(Debug, Clone)]
pub struct FilteredTokenView<'a> {
    document: &'a Document,
    indices: Vec<usize>,
    forms: Vec<Cow<'a, str>>,
}

impl<'a> FilteredTokenView<'a> {
    pub(crate) fn new(
        document: &'a Document,
        indices: Vec<usize>,
        forms: Vec<Cow<'a, str>>,
    ) -> Self {
        Self {
            document,
            indices,
            forms,
        }
    }

    pub fn document(&self) -> &'a Document {
        self.document
    }

    /// Indices into the document's token sequence
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Normalized (lowercased) forms of the surviving tokens
    pub fn forms(&self) -> &[Cow<'a, str>] {
        &self.forms
    }

    pub fn tokens(&self) -> impl Iterator<Item = &'a Token> + '_ {
        let tokens = self.document.tokens();
        self.indices.iter().map(move |&i| &tokens[i])
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}

/// Quality flag attached to a metric record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityFlag {
    /// The document has no word tokens at all; all ratios are zero
    EmptyDocument,
    /// No token survived the filter, so TTR and MATTR rest on no evidence
    LowConfidence,
    /// Fewer filtered tokens than the MATTR window; MATTR equals TTR
    ShortSample,
    /// Date label could not be parsed; ordering falls back to file name
    MalformedMetadata,
}

/// Raw counts behind the ratios of a record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentCounts {
    /// Tokens in the filtered view
    pub total_words: usize,
    /// Distinct normalized forms in the filtered view
    pub unique_words: usize,
    /// Non-punctuation tokens (lexical density denominator)
    pub density_tokens: usize,
    /// Content-word tokens (lexical density numerator)
    pub content_words: usize,
    /// Tokens carrying a subordinate clause label
    pub dependent_clauses: usize,
    /// Clause count used as the DCR denominator
    pub main_clauses: usize,
    /// Dependent plus main clauses
    pub total_clauses: usize,
    /// Sentences in the document
    pub sentences: usize,
}

/// Metrics computed for one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub student_id: String,
    pub date_label: String,
    pub source_path: String,
    /// Type-token ratio over the filtered view (0-1)
    pub ttr: f64,
    /// Moving-average type-token ratio over the filtered view (0-1)
    pub mattr: f64,
    /// Content words over non-punctuation tokens (0-1)
    pub lexical_density: f64,
    /// Dependent clause ratio (>= 0)
    pub dcr: f64,
    pub counts: DocumentCounts,
    pub quality_flags: Vec<QualityFlag>,
}

impl MetricRecord {
    pub fn is_low_confidence(&self) -> bool {
        self.quality_flags.contains(&QualityFlag::LowConfidence)
    }
}

/// Chronologically ordered records for one student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentTimeline {
    pub student_id: String,
    pub records: Vec<MetricRecord>,
}

/// A document that could not be turned into a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFailure {
    pub student_id: String,
    pub date_label: String,
    pub source_path: String,
    pub error: String,
}

/// Outcome of one aggregation run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    /// One timeline per student, ordered by student id
    pub timelines: Vec<StudentTimeline>,
    /// Documents skipped because annotation or dictionary lookup failed
    pub failures: Vec<DocumentFailure>,
}

impl AggregateReport {
    pub fn timeline(&self, student_id: &str) -> Option<&StudentTimeline> {
        self.timelines.iter().find(|t| t.student_id == student_id)
    }

    pub fn record_count(&self) -> usize {
        self.timelines.iter().map(|t| t.records.len()).sum()
    }
}

/// Producer metadata embedded in renderer payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexisProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Payload handed to the external report renderer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelinePayload {
    pub schema_version: String,
    pub producer: LexisProducer,
    pub computed_at_utc: String,
    pub timelines: Vec<StudentTimeline>,
    pub failures: Vec<DocumentFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> DocumentMetadata {
        DocumentMetadata::new("alice", "Week1", "mydata/alice/Week1.txt")
    }

    #[test]
    fn test_document_rejects_out_of_range_head() {
        let tokens = vec![Token::new("cat", "cat", "NOUN", "ROOT", 3)];
        let result = Document::new(meta(), tokens);
        assert!(matches!(result, Err(ComputeError::ParseError(_))));
    }

    #[test]
    fn test_document_rejects_missing_student() {
        let result = Document::new(DocumentMetadata::new(" ", "Week1", "a.txt"), vec![]);
        assert!(matches!(result, Err(ComputeError::MalformedMetadata(_))));
    }

    #[test]
    fn test_document_rejects_unordered_sentences() {
        let tokens = vec![
            Token::new("Go", "go", "VERB", "ROOT", 0),
            Token::new("Stop", "stop", "VERB", "ROOT", 1),
        ];
        let result = Document::with_sentences(meta(), tokens, vec![1, 0]);
        assert!(result.is_err());
    }

    #[test]
    fn test_sentence_count_from_roots() {
        let tokens = vec![
            Token::new("Go", "go", "VERB", "ROOT", 0),
            Token::new(".", ".", "PUNCT", "punct", 0),
            Token::new("Stop", "stop", "VERB", "ROOT", 2),
        ];
        let doc = Document::new(meta(), tokens).unwrap();
        assert_eq!(doc.sentence_count(), 2);
    }

    #[test]
    fn test_sentence_count_prefers_boundaries() {
        let tokens = vec![
            Token::new("Go", "go", "VERB", "ROOT", 0),
            Token::new("now", "now", "ADV", "advmod", 0),
        ];
        let doc = Document::with_sentences(meta(), tokens, vec![0]).unwrap();
        assert_eq!(doc.sentence_count(), 1);

        let empty = Document::new(meta(), vec![]).unwrap();
        assert_eq!(empty.sentence_count(), 0);
    }

    #[test]
    fn test_file_name() {
        assert_eq!(meta().file_name(), "Week1.txt");
        let windows = DocumentMetadata::new("bob", "Week2", r"mydata\bob\Week2.txt");
        assert_eq!(windows.file_name(), "Week2.txt");
    }
}
