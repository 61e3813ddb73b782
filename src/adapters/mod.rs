//! Annotation backend adapters
//!
//! This module provides adapters that parse the output of an external
//! annotation backend and map it to the backend-agnostic [`Document`] model.

mod conllu;
mod spacy;

pub use conllu::ConlluAdapter;
pub use spacy::SpacyJsonAdapter;

use crate::error::ComputeError;
use crate::types::{Document, DocumentMetadata};

/// Trait for annotation backend adapters
pub trait AnnotationAdapter {
    /// Parse annotated output and build a document carrying `metadata`
    fn parse(&self, raw: &str, metadata: DocumentMetadata) -> Result<Document, ComputeError>;
}
