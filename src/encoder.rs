//! Timeline encoding
//!
//! This module encodes aggregated timelines into the JSON payload consumed by
//! the external report renderer.

use crate::error::ComputeError;
use crate::types::{AggregateReport, LexisProducer, TimelinePayload};
use crate::{LEXIS_VERSION, PRODUCER_NAME};
use chrono::Utc;
use uuid::Uuid;

/// Current timeline payload schema version
pub const TIMELINE_SCHEMA_VERSION: &str = "lexis.timeline.v1";

/// Encoder for renderer payloads
pub struct TimelineEncoder {
    instance_id: String,
}

impl Default for TimelineEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl TimelineEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn encode(&self, report: &AggregateReport) -> TimelinePayload {
        TimelinePayload {
            schema_version: TIMELINE_SCHEMA_VERSION.to_string(),
            producer: LexisProducer {
                name: PRODUCER_NAME.to_string(),
                version: LEXIS_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
            timelines: report.timelines.clone(),
            failures: report.failures.clone(),
        }
    }

    /// Encode to JSON string
    pub fn encode_to_json(&self, report: &AggregateReport) -> Result<String, ComputeError> {
        let payload = self.encode(report);
        serde_json::to_string_pretty(&payload)
            .map_err(|e| ComputeError::EncodingError(e.to_string()))
    }
}
