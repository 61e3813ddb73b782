//! Dependent clause ratio (DCR)
//!
//! A dependency-label heuristic: tokens labelled with a subordinate clause
//! relation are counted against the number of main clauses. Parser
//! mislabelling passes straight through, so the value is approximate.
//!
//! Main clauses are sentence roots plus coordinate roots, i.e. tokens attached
//! by a coordination label to a root or to another coordinate root. So
//! "she ran and he hid and we laughed" has three main clauses.

use crate::config::{ClauseCountBasis, EngineConfig, LabelSet};
use crate::types::{Document, Token};

/// DCR estimator bound to one engine configuration
#[derive(Debug, Clone)]
pub struct DcrEstimator {
    clause_labels: LabelSet,
    root_labels: LabelSet,
    coordination_labels: LabelSet,
    basis: ClauseCountBasis,
}

/// Counts behind a DCR value
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DcrMeasure {
    pub dependent_clauses: usize,
    /// Denominator actually used
    pub main_clauses: usize,
    pub sentences: usize,
    pub dcr: f64,
}

impl DcrEstimator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            clause_labels: LabelSet::from(&config.clause_dependency_labels),
            root_labels: LabelSet::from(&config.root_labels),
            coordination_labels: LabelSet::from(&config.coordination_labels),
            basis: config.clause_count_basis,
        }
    }

    /// Dependent clause ratio of a document, 0 when the denominator is 0
    pub fn dcr(&self, document: &Document) -> f64 {
        self.measure(document).dcr
    }

    pub fn measure(&self, document: &Document) -> DcrMeasure {
        let tokens = document.tokens();
        let sentences = document.sentence_count();

        let dependent_clauses = tokens
            .iter()
            .filter(|token| self.clause_labels.contains(&token.dep))
            .count();

        let main_clauses = match self.basis {
            ClauseCountBasis::RootPredicates => match self.count_main_predicates(tokens) {
                0 => sentences,
                n => n,
            },
            ClauseCountBasis::SentenceCount => sentences,
        };

        let dcr = if main_clauses == 0 {
            0.0
        } else {
            dependent_clauses as f64 / main_clauses as f64
        };

        DcrMeasure {
            dependent_clauses,
            main_clauses,
            sentences,
            dcr,
        }
    }

    fn count_main_predicates(&self, tokens: &[Token]) -> usize {
        (0..tokens.len())
            .filter(|&index| self.is_main_predicate(tokens, index))
            .count()
    }

    /// Follow coordination links upward until a root (main) or anything else (not main)
    fn is_main_predicate(&self, tokens: &[Token], index: usize) -> bool {
        let mut current = index;
        // A chain longer than the document means the head links form a cycle
        for _ in 0..=tokens.len() {
            let token = &tokens[current];
            if self.root_labels.contains(&token.dep) {
                return true;
            }
            if !self.coordination_labels.contains(&token.dep) || token.head == current {
                return false;
            }
            current = token.head;
        }
        false
    }
}
