//! Candidate extraction
//!
//! Turns the annotated spans of one document into the set of unique
//! name candidates submitted for resolution.

use std::collections::BTreeSet;
use std::sync::Arc;

use personae_core::Span;

use crate::StopSets;

/// Derives name candidates from annotated spans
#[derive(Debug, Clone)]
pub struct CandidateExtractor {
    stop_sets: Arc<StopSets>,
}

impl CandidateExtractor {
    pub fn new(stop_sets: Arc<StopSets>) -> Self {
        Self { stop_sets }
    }

    /// Candidate for a single span, `None` when it is a stop word.
    ///
    /// The name fact wins over the normalized form: it repairs spans that
    /// the segmenter split apart, e.g. around image captions.
    pub fn candidate_for(&self, span: &Span) -> Option<String> {
        if self.stop_sets.is_stop_word(&span.normal) {
            return None;
        }

        match &span.fact {
            Some(fact) => Some(fact.fullname()),
            None => Some(span.normal.clone()),
        }
    }

    /// Unique candidates of a document, compared by exact string equality
    pub fn extract(&self, spans: &[Span]) -> BTreeSet<String> {
        let candidates: BTreeSet<String> = spans
            .iter()
            .filter_map(|span| self.candidate_for(span))
            .collect();

        tracing::debug!(
            spans = spans.len(),
            candidates = candidates.len(),
            "Extracted possible personalities"
        );
        candidates
    }
}
