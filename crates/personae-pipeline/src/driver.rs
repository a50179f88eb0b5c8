//! Resolution driver
//!
//! Runs extraction, resolution, and classification for one document
//! and produces its deduplicated personality set.
//!
//! Author: hephaex@gmail.com

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use personae_core::{AnnotateOptions, Annotator, Document, Personality, Result, Span};
use personae_extractor::{CandidateExtractor, EntityClassifier, StopSets, Verdict};
use personae_kb::{KnowledgeBaseResolver, Resolution};

/// What happened to a single candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateOutcome {
    /// Emitted as a verified or unverified personality
    Emitted(Personality),
    /// Resolved to a page carrying a stop category
    Vetoed { category: String },
    /// Knowledge base failed; status unknown, nothing emitted
    Skipped { reason: String },
}

/// Counters for one document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionStats {
    pub candidates: usize,
    pub verified: usize,
    pub unverified: usize,
    pub vetoed: usize,
    pub skipped: usize,
}

impl ResolutionStats {
    fn record(&mut self, outcome: &CandidateOutcome) {
        match outcome {
            CandidateOutcome::Emitted(p) if p.is_verified() => self.verified += 1,
            CandidateOutcome::Emitted(_) => self.unverified += 1,
            CandidateOutcome::Vetoed { .. } => self.vetoed += 1,
            CandidateOutcome::Skipped { .. } => self.skipped += 1,
        }
    }

    pub fn merge(&mut self, other: &ResolutionStats) {
        self.candidates += other.candidates;
        self.verified += other.verified;
        self.unverified += other.unverified;
        self.vetoed += other.vetoed;
        self.skipped += other.skipped;
    }
}

/// Personalities found in one document
#[derive(Debug, Clone, Default)]
pub struct DocumentResolution {
    pub personalities: BTreeSet<Personality>,
    pub stats: ResolutionStats,
}

/// Per-document orchestration of extractor, resolver, and classifier
pub struct ResolutionDriver {
    extractor: CandidateExtractor,
    resolver: KnowledgeBaseResolver,
    classifier: EntityClassifier,
    /// Shared by every document so the limit holds corpus-wide
    lookup_permits: Arc<Semaphore>,
    max_concurrent_lookups: usize,
}

impl ResolutionDriver {
    pub fn new(
        stop_sets: Arc<StopSets>,
        resolver: KnowledgeBaseResolver,
        max_concurrent_lookups: usize,
    ) -> Self {
        let max_concurrent_lookups = max_concurrent_lookups.max(1);
        Self {
            extractor: CandidateExtractor::new(Arc::clone(&stop_sets)),
            resolver,
            classifier: EntityClassifier::new(stop_sets),
            lookup_permits: Arc::new(Semaphore::new(max_concurrent_lookups)),
            max_concurrent_lookups,
        }
    }

    /// Resolve and classify a single candidate
    pub async fn resolve_candidate(&self, candidate: &str) -> CandidateOutcome {
        let resolution = match self.lookup_permits.acquire().await {
            Ok(_permit) => self.resolver.resolve(candidate).await,
            Err(_) => Resolution::Unavailable("lookup pool closed".to_string()),
        };

        match resolution {
            Resolution::NoMatch => {
                tracing::debug!(candidate, "Added as unverified, nothing found");
                CandidateOutcome::Emitted(Personality::unverified(candidate))
            }
            Resolution::Unavailable(reason) => {
                tracing::warn!(candidate, %reason, "Knowledge base lookup failed, skipping candidate");
                CandidateOutcome::Skipped { reason }
            }
            Resolution::Found(page) => match self.classifier.judge(&page) {
                Verdict::Vetoed { category } => {
                    tracing::debug!(candidate, title = %page.title, %category, "Prohibited category, skipping");
                    CandidateOutcome::Vetoed { category }
                }
                Verdict::Classified { personality_type } => {
                    let personality =
                        Personality::verified(page.title, page.url, personality_type);
                    tracing::debug!(candidate, %personality, "Verified personality");
                    CandidateOutcome::Emitted(personality)
                }
                Verdict::Unclassified => {
                    tracing::debug!(candidate, title = %page.title, "Unknown page type, added as unverified");
                    CandidateOutcome::Emitted(Personality::unverified(candidate))
                }
            },
        }
    }

    /// Resolve every non-empty candidate of a document's spans
    pub async fn process_spans(&self, spans: &[Span]) -> DocumentResolution {
        let candidates: Vec<String> = self
            .extractor
            .extract(spans)
            .into_iter()
            .filter(|c| !c.is_empty())
            .collect();

        let outcomes: Vec<CandidateOutcome> = stream::iter(candidates.iter())
            .map(|candidate| self.resolve_candidate(candidate))
            .buffer_unordered(self.max_concurrent_lookups)
            .collect()
            .await;

        let mut resolution = DocumentResolution {
            stats: ResolutionStats {
                candidates: candidates.len(),
                ..Default::default()
            },
            ..Default::default()
        };

        for outcome in outcomes {
            resolution.stats.record(&outcome);
            if let CandidateOutcome::Emitted(personality) = outcome {
                resolution.personalities.insert(personality);
            }
        }

        resolution
    }

    /// Annotate a document and resolve its personalities
    pub async fn process_document(
        &self,
        annotator: &dyn Annotator,
        document: &Document,
    ) -> Result<DocumentResolution> {
        tracing::info!(
            document = %document.name,
            preview = document.preview(100),
            "Started processing document"
        );

        let spans = annotator
            .annotate(&document.text, AnnotateOptions::full())
            .await?;
        let resolution = self.process_spans(&spans).await;

        tracing::info!(
            document = %document.name,
            candidates = resolution.stats.candidates,
            personalities = resolution.personalities.len(),
            vetoed = resolution.stats.vetoed,
            skipped = resolution.stats.skipped,
            "Extracted actual personalities"
        );
        Ok(resolution)
    }
}
