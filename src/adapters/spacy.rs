//! spaCy JSON adapter
//!
//! Parses the output of spaCy's `Doc.to_json()`. Tokens there carry character
//! offsets into the top-level `text` rather than their own text, and sentences
//! are character spans; both are mapped back to token indices here. A `text`
//! field on a token, when present, takes precedence over the offsets.

use crate::error::ComputeError;
use crate::types::{Document, DocumentMetadata, Token};
use serde::{Deserialize, Serialize};

use super::AnnotationAdapter;

/// spaCy `Doc.to_json()` adapter
pub struct SpacyJsonAdapter;

impl AnnotationAdapter for SpacyJsonAdapter {
    fn parse(&self, raw: &str, metadata: DocumentMetadata) -> Result<Document, ComputeError> {
        let doc: SpacyDoc = serde_json::from_str(raw)
            .map_err(|e| ComputeError::ParseError(format!("Failed to parse spaCy JSON: {e}")))?;

        let mut tokens = Vec::with_capacity(doc.tokens.len());
        for (index, token) in doc.tokens.iter().enumerate() {
            if token.id.is_some_and(|id| id != index) {
                return Err(ComputeError::ParseError(format!(
                    "token at position {index} has id {:?}",
                    token.id
                )));
            }

            let text = match &token.text {
                Some(text) => text.clone(),
                None => char_slice(&doc.text, token.start, token.end)
                    .ok_or_else(|| {
                        ComputeError::ParseError(format!(
                            "token {index} span {}..{} outside text",
                            token.start, token.end
                        ))
                    })?
                    .to_string(),
            };

            tokens.push(Token {
                text,
                lemma: token.lemma.clone().unwrap_or_default(),
                pos: token.pos.clone(),
                dep: token.dep.clone(),
                head: token.head,
            });
        }

        let sentence_starts = sentence_starts(&doc);
        Document::with_sentences(metadata, tokens, sentence_starts)
    }
}

/// Token index of the first token at or after each sentence's start offset
fn sentence_starts(doc: &SpacyDoc) -> Vec<usize> {
    let mut starts: Vec<usize> = doc
        .sents
        .iter()
        .filter_map(|sent| doc.tokens.iter().position(|t| t.start >= sent.start))
        .collect();
    starts.dedup();
    starts
}

/// Slice by character offsets (spaCy offsets count characters, not bytes)
fn char_slice(text: &str, start: usize, end: usize) -> Option<&str> {
    if start > end {
        return None;
    }
    let byte_at = |offset: usize| {
        text.char_indices()
            .map(|(byte, _)| byte)
            .chain(std::iter::once(text.len()))
            .nth(offset)
    };
    let from = byte_at(start)?;
    let to = byte_at(end)?;
    text.get(from..to)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SpacyDoc {
    #[serde(default)]
    text: String,
    tokens: Vec<SpacyToken>,
    #[serde(default)]
    sents: Vec<SpacySpan>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SpacyToken {
    id: Option<usize>,
    #[serde(default)]
    start: usize,
    #[serde(default)]
    end: usize,
    text: Option<String>,
    lemma: Option<String>,
    #[serde(default)]
    pos: String,
    #[serde(default)]
    dep: String,
    head: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SpacySpan {
    start: usize,
    end: usize,
}
