//! Synheart Lexis - Longitudinal writing development metrics
//!
//! Lexis turns annotated writing samples (tokens with part-of-speech tags and
//! dependency labels) into per-student timelines of four measures through a
//! deterministic pipeline: annotation adapter → token filter →
//! {TTR/MATTR, lexical density, dependent clause ratio} → chronological
//! aggregation → renderer payload encoding.
//!
//! Tagging, parsing and spell checking are external; they are injected through
//! the [`oracle::Dictionary`] and [`oracle::Annotator`] traits or arrive as
//! backend output parsed by an [`adapters::AnnotationAdapter`].

pub mod adapters;
pub mod aggregator;
pub mod chronology;
pub mod clause;
pub mod config;
pub mod density;
pub mod encoder;
pub mod error;
pub mod filter;
pub mod lexical;
pub mod oracle;
pub mod pipeline;
pub mod types;

pub use adapters::{AnnotationAdapter, ConlluAdapter, SpacyJsonAdapter};
pub use aggregator::MetricsEngine;
pub use config::{ClauseCountBasis, EngineConfig};
pub use error::ComputeError;
pub use oracle::{Annotator, Dictionary, WordListDictionary};
pub use pipeline::{annotated_json_to_timelines, AnnotatedSample, LexisProcessor};
pub use types::{Document, DocumentMetadata, MetricRecord, StudentTimeline, Token};

/// Lexis version embedded in all renderer payloads
pub const LEXIS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for renderer payloads
pub const PRODUCER_NAME: &str = "synheart-lexis";
