//! CoNLL-U adapter
//!
//! Parses Universal Dependencies CoNLL-U output (Stanza, UDPipe, Trankit).
//! Each token line has ten tab-separated columns; sentences are separated by
//! blank lines and may carry `#` comment lines. Multiword-token ranges
//! (`1-2`) and empty nodes (`1.1`) are skipped. HEAD is 1-based within the
//! sentence with `0` for the root, and is rewritten to a document-level index
//! (the root points at itself).

use crate::error::ComputeError;
use crate::types::{Document, DocumentMetadata, Token};

use super::AnnotationAdapter;

const COLUMN_COUNT: usize = 10;

/// CoNLL-U adapter
pub struct ConlluAdapter;

impl AnnotationAdapter for ConlluAdapter {
    fn parse(&self, raw: &str, metadata: DocumentMetadata) -> Result<Document, ComputeError> {
        let mut tokens: Vec<Token> = Vec::new();
        let mut sentence_starts = Vec::new();
        let mut sentence: Vec<ConlluRow> = Vec::new();

        for (line_no, line) in raw.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                flush_sentence(&mut sentence, &mut tokens, &mut sentence_starts)?;
                continue;
            }
            if line.starts_with('#') {
                continue;
            }
            if let Some(row) = parse_row(line, line_no + 1)? {
                sentence.push(row);
            }
        }
        flush_sentence(&mut sentence, &mut tokens, &mut sentence_starts)?;

        Document::with_sentences(metadata, tokens, sentence_starts)
    }
}

struct ConlluRow {
    id: usize,
    form: String,
    lemma: String,
    upos: String,
    head: usize,
    deprel: String,
    line_no: usize,
}

/// Parse one token line; `None` for multiword ranges and empty nodes
fn parse_row(line: &str, line_no: usize) -> Result<Option<ConlluRow>, ComputeError> {
    let columns: Vec<&str> = line.split('\t').collect();
    if columns.len() != COLUMN_COUNT {
        return Err(ComputeError::ParseError(format!(
            "line {line_no}: expected {COLUMN_COUNT} columns, found {}",
            columns.len()
        )));
    }

    let id = columns[0];
    if id.contains('-') || id.contains('.') {
        return Ok(None);
    }

    let parse_index = |value: &str, column: &str| {
        value.parse::<usize>().map_err(|_| {
            ComputeError::ParseError(format!("line {line_no}: invalid {column} '{value}'"))
        })
    };

    let lemma = match columns[2] {
        "_" => String::new(),
        lemma => lemma.to_string(),
    };

    Ok(Some(ConlluRow {
        id: parse_index(id, "ID")?,
        form: columns[1].to_string(),
        lemma,
        upos: columns[3].to_string(),
        head: parse_index(columns[6], "HEAD")?,
        deprel: columns[7].to_string(),
        line_no,
    }))
}

/// Append a finished sentence to the document, rebasing head indices
fn flush_sentence(
    sentence: &mut Vec<ConlluRow>,
    tokens: &mut Vec<Token>,
    sentence_starts: &mut Vec<usize>,
) -> Result<(), ComputeError> {
    if sentence.is_empty() {
        return Ok(());
    }

    let offset = tokens.len();
    let len = sentence.len();
    sentence_starts.push(offset);

    for (position, row) in sentence.drain(..).enumerate() {
        if row.id != position + 1 {
            return Err(ComputeError::ParseError(format!(
                "line {}: expected token id {}, found {}",
                row.line_no,
                position + 1,
                row.id
            )));
        }
        if row.head > len {
            return Err(ComputeError::ParseError(format!(
                "line {}: head {} outside sentence of {len} tokens",
                row.line_no, row.head
            )));
        }

        let head = match row.head {
            0 => offset + position,
            head => offset + head - 1,
        };

        tokens.push(Token {
            text: row.form,
            lemma: row.lemma,
            pos: row.upos,
            dep: row.deprel,
            head,
        });
    }

    Ok(())
}
