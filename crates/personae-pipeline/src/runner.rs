//! Corpus runner
//!
//! Drives every document through the [`ResolutionDriver`] with bounded
//! concurrency and folds finished documents into the aggregator in input
//! order. Cancellation or the batch timeout drops in-flight documents;
//! documents already folded stay valid.
//!
//! Author: hephaex@gmail.com

use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use personae_core::{Annotator, Document, Personality, PipelineConfig};

use crate::aggregator::CorpusAggregator;
use crate::driver::{ResolutionDriver, ResolutionStats};

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Cancelled,
    TimedOut,
}

/// Personalities of one finished document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    pub id: Uuid,
    pub name: String,
    pub personalities: Vec<Personality>,
    pub stats: ResolutionStats,
}

/// Run-wide counters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub documents_total: usize,
    pub documents_processed: usize,
    pub documents_failed: usize,
    pub resolution: ResolutionStats,
}

/// Everything a corpus run produced
#[derive(Debug)]
pub struct CorpusRun {
    pub status: RunStatus,
    pub summary: RunSummary,
    /// Per-document sets in input order
    pub documents: Vec<DocumentReport>,
    pub aggregator: CorpusAggregator,
}

/// Runs a batch of documents through resolution and aggregation
pub struct CorpusRunner {
    driver: Arc<ResolutionDriver>,
    annotator: Arc<dyn Annotator>,
    document_concurrency: usize,
    batch_timeout: Option<Duration>,
}

impl CorpusRunner {
    pub fn new(driver: Arc<ResolutionDriver>, annotator: Arc<dyn Annotator>) -> Self {
        Self::from_config(driver, annotator, &PipelineConfig::default())
    }

    /// Create from config
    pub fn from_config(
        driver: Arc<ResolutionDriver>,
        annotator: Arc<dyn Annotator>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            driver,
            annotator,
            document_concurrency: config.document_concurrency.max(1),
            batch_timeout: config.batch_timeout_secs.map(Duration::from_secs),
        }
    }

    /// Set the batch timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.batch_timeout = Some(timeout);
        self
    }

    /// Process documents until done, cancelled, or timed out
    pub async fn run(&self, documents: Vec<Document>, cancel: CancellationToken) -> CorpusRun {
        let deadline = self.batch_timeout.map(|timeout| Instant::now() + timeout);
        let mut run = CorpusRun {
            status: RunStatus::Completed,
            summary: RunSummary {
                documents_total: documents.len(),
                ..Default::default()
            },
            documents: Vec::new(),
            aggregator: CorpusAggregator::new(),
        };

        // `buffered` yields in input order, so folding stays deterministic
        let mut results = pin!(stream::iter(documents)
            .map(|document| {
                let driver = Arc::clone(&self.driver);
                let annotator = Arc::clone(&self.annotator);
                async move {
                    let result = driver.process_document(annotator.as_ref(), &document).await;
                    (document, result)
                }
            })
            .buffered(self.document_concurrency));

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    run.status = RunStatus::Cancelled;
                    break;
                }
                _ = wait_until(deadline) => {
                    run.status = RunStatus::TimedOut;
                    break;
                }
                next = results.next() => next,
            };

            let Some((document, result)) = next else {
                break;
            };

            match result {
                Ok(resolution) => {
                    run.summary.documents_processed += 1;
                    run.summary.resolution.merge(&resolution.stats);
                    run.aggregator
                        .add_document(resolution.personalities.iter().cloned());
                    run.documents.push(DocumentReport {
                        id: document.id,
                        name: document.name,
                        personalities: resolution.personalities.into_iter().collect(),
                        stats: resolution.stats,
                    });
                }
                Err(e) => {
                    run.summary.documents_failed += 1;
                    tracing::warn!(document = %document.name, error = %e, "Document failed, skipping");
                }
            }
        }

        match run.status {
            RunStatus::Completed => tracing::info!(
                documents = run.summary.documents_processed,
                failed = run.summary.documents_failed,
                personalities = run.aggregator.len(),
                "Processed all documents"
            ),
            status => tracing::warn!(
                ?status,
                processed = run.summary.documents_processed,
                total = run.summary.documents_total,
                "Run stopped early, keeping finished documents"
            ),
        }

        run
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
