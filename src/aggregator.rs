//! Metrics aggregation
//!
//! Turns documents into metric records and merges them into per-student
//! timelines. Each record is a pure function of one document plus the
//! read-only oracles, so documents may be computed in any order or in
//! parallel; timelines are ordered by a stable chronological sort afterwards,
//! never by completion order.

use crate::chronology::{parse_date_label, ChronoKey};
use crate::clause::DcrEstimator;
use crate::config::EngineConfig;
use crate::density::DensityCalculator;
use crate::error::ComputeError;
use crate::filter::TokenFilter;
use crate::lexical::{mattr, ttr, type_count};
use crate::oracle::{Annotator, Dictionary};
use crate::types::{
    AggregateReport, Document, DocumentCounts, DocumentFailure, DocumentMetadata, MetricRecord,
    QualityFlag, RawSample, StudentTimeline,
};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Metrics engine holding a validated configuration and its calculators
#[derive(Debug, Clone)]
pub struct MetricsEngine {
    config: EngineConfig,
    filter: TokenFilter,
    density: DensityCalculator,
    dcr: DcrEstimator,
}

impl MetricsEngine {
    /// Create an engine, rejecting invalid configuration before any document is seen
    pub fn new(config: EngineConfig) -> Result<Self, ComputeError> {
        config.validate()?;
        Ok(Self {
            filter: TokenFilter::new(&config),
            density: DensityCalculator::new(&config),
            dcr: DcrEstimator::new(&config),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compute the metric record of one document.
    ///
    /// All four measures are computed from the same document; the record is
    /// returned whole or not at all.
    #[tracing::instrument(
        skip(self, document, dictionary),
        fields(student = %document.metadata().student_id, date = %document.metadata().date_label)
    )]
    pub fn compute_record(
        &self,
        document: &Document,
        dictionary: &dyn Dictionary,
    ) -> Result<MetricRecord, ComputeError> {
        let view = self.filter.filter(document, dictionary)?;
        let forms = view.forms();

        let ttr = ttr(forms);
        let mattr = mattr(forms, self.config.window_length);
        let density = self.density.measure(document);
        let clauses = self.dcr.measure(document);

        let counts = DocumentCounts {
            total_words: forms.len(),
            unique_words: type_count(forms),
            density_tokens: density.counted_tokens,
            content_words: density.content_words,
            dependent_clauses: clauses.dependent_clauses,
            main_clauses: clauses.main_clauses,
            total_clauses: clauses.dependent_clauses + clauses.main_clauses,
            sentences: clauses.sentences,
        };

        let metadata = document.metadata();
        let quality_flags = self.quality_flags(metadata, &counts);

        debug!(
            tokens = document.tokens().len(),
            filtered = counts.total_words,
            ttr,
            mattr,
            lexical_density = density.lexical_density,
            dcr = clauses.dcr,
            "computed metric record"
        );

        Ok(MetricRecord {
            student_id: metadata.student_id.clone(),
            date_label: metadata.date_label.clone(),
            source_path: metadata.source_path.clone(),
            ttr,
            mattr,
            lexical_density: density.lexical_density,
            dcr: clauses.dcr,
            counts,
            quality_flags,
        })
    }

    fn quality_flags(
        &self,
        metadata: &DocumentMetadata,
        counts: &DocumentCounts,
    ) -> Vec<QualityFlag> {
        let mut flags = Vec::new();

        // Density and DCR read the unfiltered tokens, so an empty filtered
        // view alone does not make every ratio zero
        let nothing_measured = counts.density_tokens == 0 && counts.dependent_clauses == 0;
        if counts.total_words == 0 {
            if nothing_measured {
                flags.push(QualityFlag::EmptyDocument);
            }
            flags.push(QualityFlag::LowConfidence);
        } else if counts.total_words < self.config.window_length {
            flags.push(QualityFlag::ShortSample);
        }

        if parse_date_label(&metadata.date_label).is_none() {
            warn!(
                student = %metadata.student_id,
                date_label = %metadata.date_label,
                "date label is not chronological; ordering by file name"
            );
            flags.push(QualityFlag::MalformedMetadata);
        }

        flags
    }

    /// Compute records for every document and group them into timelines.
    ///
    /// A document whose oracle fails is reported in `failures` and skipped,
    /// unless the configuration asks for fail-fast, in which case the first
    /// failure in input order is returned.
    pub fn aggregate(
        &self,
        documents: &[Document],
        dictionary: &dyn Dictionary,
    ) -> Result<AggregateReport, ComputeError> {
        let items: Vec<(&DocumentMetadata, &Document)> =
            documents.iter().map(|d| (d.metadata(), d)).collect();
        self.run(items, |document| self.compute_record(document, dictionary))
    }

    /// Annotate raw samples, then aggregate them.
    ///
    /// An annotator failure affects only its own sample and is reported as
    /// `AnnotationUnavailable`.
    pub fn aggregate_samples(
        &self,
        samples: &[RawSample],
        annotator: &dyn Annotator,
        dictionary: &dyn Dictionary,
    ) -> Result<AggregateReport, ComputeError> {
        let items: Vec<(&DocumentMetadata, &RawSample)> =
            samples.iter().map(|s| (&s.metadata, s)).collect();
        self.run(items, |sample| {
            let document = annotator.annotate(sample).map_err(|e| match e {
                unavailable @ ComputeError::AnnotationUnavailable(_) => unavailable,
                other => ComputeError::AnnotationUnavailable(other.to_string()),
            })?;
            self.compute_record(&document, dictionary)
        })
    }

    /// Aggregate documents produced by an earlier parsing step.
    ///
    /// Parse errors take their input position among the metric failures, so
    /// the failure list and fail-fast both follow input order.
    pub fn aggregate_parsed(
        &self,
        parsed: Vec<(&DocumentMetadata, Result<Document, ComputeError>)>,
        dictionary: &dyn Dictionary,
    ) -> Result<AggregateReport, ComputeError> {
        self.run(parsed, |parsed| {
            parsed.and_then(|document| self.compute_record(&document, dictionary))
        })
    }

    /// Compute every item, in parallel when configured, keeping input order
    fn run<'m, T, F>(
        &self,
        items: Vec<(&'m DocumentMetadata, T)>,
        compute: F,
    ) -> Result<AggregateReport, ComputeError>
    where
        T: Send,
        F: Fn(T) -> Result<MetricRecord, ComputeError> + Sync + Send,
    {
        let outcomes: Vec<(&DocumentMetadata, Result<MetricRecord, ComputeError>)> =
            if self.config.parallel {
                items
                    .into_par_iter()
                    .map(|(metadata, item)| (metadata, compute(item)))
                    .collect()
            } else {
                items
                    .into_iter()
                    .map(|(metadata, item)| (metadata, compute(item)))
                    .collect()
            };
        self.merge(outcomes)
    }

    /// Group outcomes by student and sort each timeline chronologically
    fn merge(
        &self,
        outcomes: Vec<(&DocumentMetadata, Result<MetricRecord, ComputeError>)>,
    ) -> Result<AggregateReport, ComputeError> {
        let mut by_student: BTreeMap<String, Vec<(ChronoKey, MetricRecord)>> = BTreeMap::new();
        let mut failures = Vec::new();

        for (position, (metadata, outcome)) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(record) => {
                    let key =
                        ChronoKey::new(&metadata.date_label, metadata.file_name(), position);
                    by_student
                        .entry(record.student_id.clone())
                        .or_default()
                        .push((key, record));
                }
                Err(e) if self.config.fail_fast => return Err(e),
                Err(e) => {
                    warn!(
                        student = %metadata.student_id,
                        source = %metadata.source_path,
                        error = %e,
                        "skipping document"
                    );
                    failures.push(DocumentFailure {
                        student_id: metadata.student_id.clone(),
                        date_label: metadata.date_label.clone(),
                        source_path: metadata.source_path.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let undated = by_student
            .values()
            .flatten()
            .filter(|(key, _)| !key.is_dated())
            .count();

        let timelines: Vec<StudentTimeline> = by_student
            .into_iter()
            .map(|(student_id, mut keyed)| {
                keyed.sort_by(|(a, _), (b, _)| a.cmp(b));
                StudentTimeline {
                    student_id,
                    records: keyed.into_iter().map(|(_, record)| record).collect(),
                }
            })
            .collect();

        let report = AggregateReport {
            timelines,
            failures,
        };
        info!(
            students = report.timelines.len(),
            records = report.record_count(),
            failures = report.failures.len(),
            undated,
            "aggregated metric timelines"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::WordListDictionary;
    use crate::types::Token;
    use pretty_assertions::assert_eq;

    struct FlakyDictionary {
        inner: WordListDictionary,
        broken_word: &'static str,
    }

    impl Dictionary for FlakyDictionary {
        fn is_known(&self, word: &str) -> Result<bool, ComputeError> {
            if word == self.broken_word {
                return Err(ComputeError::AnnotationUnavailable(format!(
                    "lookup of '{word}' timed out"
                )));
            }
            self.inner.is_known(word)
        }
    }

    /// Annotator splitting on whitespace, tagging every word as a root noun
    struct WhitespaceAnnotator;

    impl Annotator for WhitespaceAnnotator {
        fn annotate(&self, sample: &RawSample) -> Result<Document, ComputeError> {
            if sample.text.contains("<garbled>") {
                return Err(ComputeError::ParseError("annotator rejected input".to_string()));
            }
            if sample.text.contains("<offline>") {
                return Err(ComputeError::AnnotationUnavailable("tagger offline".to_string()));
            }
            let tokens = sample
                .text
                .split_whitespace()
                .enumerate()
                .map(|(i, w)| Token::new(w, w, "NOUN", "ROOT", i))
                .collect();
            Document::new(sample.metadata.clone(), tokens)
        }
    }

    fn dictionary() -> WordListDictionary {
        WordListDictionary::new(["the", "cat", "sat", "dog", "ran", "on", "mat", "and"])
    }

    fn scenario_doc(student: &str, date: &str) -> Document {
        let tokens = vec![
            Token::new("the", "the", "DET", "det", 1),
            Token::new("cat", "cat", "NOUN", "nsubj", 3),
            Token::new("cat", "cat", "NOUN", "appos", 1),
            Token::new("sat", "sit", "VERB", "ROOT", 3),
        ];
        let path = format!("mydata/{student}/{date}.txt");
        Document::new(DocumentMetadata::new(student, date, &path), tokens).unwrap()
    }

    fn engine(window: usize) -> MetricsEngine {
        MetricsEngine::new(EngineConfig::default().with_window_length(window)).unwrap()
    }

    #[test]
    fn test_engine_rejects_bad_config() {
        let result = MetricsEngine::new(EngineConfig::default().with_window_length(0));
        assert!(matches!(result, Err(ComputeError::ConfigurationError(_))));
    }

    #[test]
    fn test_scenario_record() {
        // The filtered view is dictionary-based: "the" drops out only because
        // this dictionary lacks it
        let mut dict_words = vec!["cat", "sat"];
        let doc = scenario_doc("alice", "Week1");
        let record = engine(2)
            .compute_record(&doc, &WordListDictionary::new(&dict_words))
            .unwrap();

        assert!((record.ttr - 2.0 / 3.0).abs() < 1e-12);
        assert!((record.mattr - 0.75).abs() < 1e-12);
        assert!((record.lexical_density - 0.75).abs() < 1e-12);
        assert_eq!(record.dcr, 0.0);
        assert_eq!(record.counts.total_words, 3);
        assert_eq!(record.counts.unique_words, 2);
        assert_eq!(record.counts.main_clauses, 1);
        assert!(record.quality_flags.is_empty());

        dict_words.push("the");
        let with_the = engine(2)
            .compute_record(&doc, &WordListDictionary::new(&dict_words))
            .unwrap();
        assert_eq!(with_the.counts.total_words, 4);
        assert!((with_the.ttr - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_empty_document_is_flagged_not_dropped() {
        let metadata = DocumentMetadata::new("bob", "Week1", "bob/Week1.txt");
        let doc = Document::new(metadata, vec![]).unwrap();
        let record = engine(30).compute_record(&doc, &dictionary()).unwrap();

        assert_eq!(record.ttr, 0.0);
        assert_eq!(record.mattr, 0.0);
        assert_eq!(record.lexical_density, 0.0);
        assert_eq!(record.dcr, 0.0);
        assert!(record.is_low_confidence());
        assert!(record.quality_flags.contains(&QualityFlag::EmptyDocument));
    }

    #[test]
    fn test_misspelled_only_document_is_low_confidence_not_empty() {
        let tokens = vec![
            Token::new("Catt", "catt", "NOUN", "nsubj", 1),
            Token::new("satt", "satt", "VERB", "ROOT", 1),
        ];
        let doc =
            Document::new(DocumentMetadata::new("bob", "Week1", "bob/Week1.txt"), tokens).unwrap();
        let record = engine(30).compute_record(&doc, &dictionary()).unwrap();

        assert_eq!(record.ttr, 0.0);
        assert_eq!(record.lexical_density, 1.0);
        assert_eq!(record.quality_flags, vec![QualityFlag::LowConfidence]);
    }

    #[test]
    fn test_punctuation_only_document_is_empty() {
        let tokens = vec![
            Token::new("!", "!", "PUNCT", "ROOT", 0),
            Token::new("?", "?", "PUNCT", "punct", 0),
        ];
        let doc =
            Document::new(DocumentMetadata::new("bob", "Week1", "bob/Week1.txt"), tokens).unwrap();
        let record = engine(30).compute_record(&doc, &dictionary()).unwrap();

        assert_eq!(record.lexical_density, 0.0);
        assert_eq!(record.dcr, 0.0);
        assert_eq!(
            record.quality_flags,
            vec![QualityFlag::EmptyDocument, QualityFlag::LowConfidence]
        );
    }

    #[test]
    fn test_short_sample_mattr_equals_ttr() {
        let record = engine(30)
            .compute_record(&scenario_doc("alice", "Week1"), &dictionary())
            .unwrap();
        assert_eq!(record.mattr, record.ttr);
        assert_eq!(record.quality_flags, vec![QualityFlag::ShortSample]);
    }

    #[test]
    fn test_timeline_is_chronological() {
        let docs = vec![
            scenario_doc("alice", "Week2"),
            scenario_doc("alice", "Week1"),
            scenario_doc("bob", "2024-02-01"),
            scenario_doc("alice", "Week10"),
            scenario_doc("bob", "2024-01-15"),
        ];
        let report = engine(2).aggregate(&docs, &dictionary()).unwrap();

        let alice: Vec<&str> = report
            .timeline("alice")
            .unwrap()
            .records
            .iter()
            .map(|r| r.date_label.as_str())
            .collect();
        assert_eq!(alice, vec!["Week1", "Week2", "Week10"]);

        let bob: Vec<&str> = report
            .timeline("bob")
            .unwrap()
            .records
            .iter()
            .map(|r| r.date_label.as_str())
            .collect();
        assert_eq!(bob, vec!["2024-01-15", "2024-02-01"]);
        assert_eq!(report.timelines[0].student_id, "alice");
    }

    #[test]
    fn test_malformed_date_sorts_last_by_file_name() {
        let docs = vec![
            scenario_doc("alice", "final"),
            scenario_doc("alice", "Week3"),
            scenario_doc("alice", "draft"),
        ];
        let report = engine(2).aggregate(&docs, &dictionary()).unwrap();
        let records = &report.timeline("alice").unwrap().records;

        let labels: Vec<&str> = records.iter().map(|r| r.date_label.as_str()).collect();
        assert_eq!(labels, vec!["Week3", "draft", "final"]);
        assert!(records[1].quality_flags.contains(&QualityFlag::MalformedMetadata));
    }

    #[test]
    fn test_failed_document_is_skipped() {
        let metadata = scenario_doc("alice", "Week2").metadata().clone();
        let broken =
            Document::new(metadata, vec![Token::new("dog", "dog", "NOUN", "ROOT", 0)]).unwrap();
        let docs = vec![scenario_doc("alice", "Week1"), broken];
        let dict = FlakyDictionary {
            inner: dictionary(),
            broken_word: "dog",
        };

        let report = engine(2).aggregate(&docs, &dict).unwrap();
        assert_eq!(report.record_count(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].date_label, "Week2");
        assert!(report.failures[0].error.contains("timed out"));
    }

    #[test]
    fn test_fail_fast_returns_error() {
        let docs = vec![scenario_doc("alice", "Week1")];
        let dict = FlakyDictionary {
            inner: dictionary(),
            broken_word: "cat",
        };
        let engine = MetricsEngine::new(EngineConfig::default().fail_fast()).unwrap();

        let result = engine.aggregate(&docs, &dict);
        assert!(matches!(result, Err(ComputeError::AnnotationUnavailable(_))));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let docs: Vec<Document> = (1..=12)
            .map(|week| {
                let student = if week % 2 == 0 { "alice" } else { "bob" };
                scenario_doc(student, &format!("Week{week}"))
            })
            .collect();

        let parallel = engine(2).aggregate(&docs, &dictionary()).unwrap();
        let config = EngineConfig::default().with_window_length(2).sequential();
        let sequential = MetricsEngine::new(config)
            .unwrap()
            .aggregate(&docs, &dictionary())
            .unwrap();

        assert_eq!(parallel, sequential);
        let again = engine(2).aggregate(&docs, &dictionary()).unwrap();
        assert_eq!(parallel, again);
    }

    #[test]
    fn test_aggregate_samples_isolates_annotator_failures() {
        let samples = vec![
            RawSample {
                metadata: DocumentMetadata::new("carol", "Week2", "carol/Week2.txt"),
                text: "the dog ran".to_string(),
            },
            RawSample {
                metadata: DocumentMetadata::new("carol", "Week1", "carol/Week1.txt"),
                text: "<garbled>".to_string(),
            },
        ];

        let report = engine(30)
            .aggregate_samples(&samples, &WhitespaceAnnotator, &dictionary())
            .unwrap();

        assert_eq!(report.record_count(), 1);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].error.starts_with("Annotation unavailable"));

        let record = &report.timeline("carol").unwrap().records[0];
        assert_eq!(record.counts.total_words, 3);
        assert_eq!(record.counts.main_clauses, 3);
    }

    #[test]
    fn test_annotator_unavailable_reason_is_kept() {
        let samples = vec![RawSample {
            metadata: DocumentMetadata::new("carol", "Week1", "carol/Week1.txt"),
            text: "<offline>".to_string(),
        }];

        let report = engine(30)
            .aggregate_samples(&samples, &WhitespaceAnnotator, &dictionary())
            .unwrap();
        assert_eq!(report.failures[0].error, "Annotation unavailable: tagger offline");
    }
}
