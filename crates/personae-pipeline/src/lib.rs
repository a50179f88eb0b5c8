//! Personae Pipeline - Resolution driver and corpus aggregation
//!
//! Wires the candidate extractor, knowledge base resolver, and entity
//! classifier into a per-document driver, then runs a whole corpus
//! through it and counts how often each personality appears.
//!
//! ```text
//! spans -> candidates -> pages -> verdicts -> document set -> aggregator
//! ```
//!
//! Author: hephaex@gmail.com

pub mod aggregator;
pub mod corpus;
pub mod driver;
pub mod report;
pub mod runner;

pub use aggregator::CorpusAggregator;
pub use corpus::{AnnotatedDocument, LoadedCorpus, PreAnnotatedCorpus};
pub use driver::{CandidateOutcome, DocumentResolution, ResolutionDriver, ResolutionStats};
pub use report::{CorpusReport, RankedPersonality};
pub use runner::{CorpusRun, CorpusRunner, DocumentReport, RunStatus, RunSummary};

pub use tokio_util::sync::CancellationToken;
