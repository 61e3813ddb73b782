//! Pipeline orchestration
//!
//! This module provides the public API for Synheart Lexis. It runs annotated
//! backend output through the adapter, the metrics engine, and the encoder.

use crate::adapters::AnnotationAdapter;
use crate::aggregator::MetricsEngine;
use crate::config::EngineConfig;
use crate::encoder::TimelineEncoder;
use crate::error::ComputeError;
use crate::oracle::Dictionary;
use crate::types::{AggregateReport, Document, DocumentMetadata};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One annotated sample in a batch, as produced by the annotation backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotatedSample {
    pub metadata: DocumentMetadata,
    /// Backend output (spaCy JSON document, CoNLL-U text, ...)
    pub annotation: String,
}

/// Convert a JSON array of annotated samples to renderer timeline JSON
/// (stateless, one-shot).
///
/// # Arguments
/// * `batch_json` - JSON array of `{ "metadata": {...}, "annotation": "..." }`
/// * `adapter` - Adapter for the backend that produced the annotations
/// * `dictionary` - Vocabulary oracle for the token filter
/// * `config` - Engine configuration
///
/// # Example
/// ```ignore
/// let config = EngineConfig::default();
/// let json = annotated_json_to_timelines(&batch, &SpacyJsonAdapter, &dictionary, config)?;
/// ```
pub fn annotated_json_to_timelines(
    batch_json: &str,
    adapter: &dyn AnnotationAdapter,
    dictionary: &dyn Dictionary,
    config: EngineConfig,
) -> Result<String, ComputeError> {
    let samples: Vec<AnnotatedSample> = serde_json::from_str(batch_json)?;
    let processor = LexisProcessor::new(config)?;
    processor.process(&samples, adapter, dictionary)
}

/// Processor reusing one engine and encoder across batches.
///
/// Holds no state between batches beyond the validated configuration, so
/// results never depend on earlier runs.
pub struct LexisProcessor {
    engine: MetricsEngine,
    encoder: TimelineEncoder,
}

impl LexisProcessor {
    pub fn new(config: EngineConfig) -> Result<Self, ComputeError> {
        Ok(Self {
            engine: MetricsEngine::new(config)?,
            encoder: TimelineEncoder::new(),
        })
    }

    pub fn with_encoder(
        config: EngineConfig,
        encoder: TimelineEncoder,
    ) -> Result<Self, ComputeError> {
        Ok(Self {
            engine: MetricsEngine::new(config)?,
            encoder,
        })
    }

    pub fn engine(&self) -> &MetricsEngine {
        &self.engine
    }

    /// Parse, measure and encode a batch; returns renderer payload JSON
    pub fn process(
        &self,
        samples: &[AnnotatedSample],
        adapter: &dyn AnnotationAdapter,
        dictionary: &dyn Dictionary,
    ) -> Result<String, ComputeError> {
        let report = self.report(samples, adapter, dictionary)?;
        self.encoder.encode_to_json(&report)
    }

    /// Parse and measure a batch without encoding.
    ///
    /// Samples whose annotation cannot be parsed are reported as failures in
    /// input order alongside dictionary failures, or abort the batch under
    /// fail-fast.
    pub fn report(
        &self,
        samples: &[AnnotatedSample],
        adapter: &dyn AnnotationAdapter,
        dictionary: &dyn Dictionary,
    ) -> Result<AggregateReport, ComputeError> {
        let parsed: Vec<(&DocumentMetadata, Result<Document, ComputeError>)> = samples
            .iter()
            .map(|sample| {
                let document = adapter.parse(&sample.annotation, sample.metadata.clone());
                (&sample.metadata, document)
            })
            .collect();

        let rejected = parsed.iter().filter(|(_, document)| document.is_err()).count();
        debug!(samples = samples.len(), rejected, "parsed annotation batch");

        self.engine.aggregate_parsed(parsed, dictionary)
    }
}
