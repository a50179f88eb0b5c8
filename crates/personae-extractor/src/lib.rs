//! Personae Extractor - Candidate extraction and classification
//!
//! Turns annotated spans into name candidates and maps resolved
//! knowledge base pages to personality types, vetoing known noise.
//!
//! Author: hephaex@gmail.com

pub mod candidates;
pub mod classifier;
pub mod stop_sets;

pub use candidates::CandidateExtractor;
pub use classifier::{EntityClassifier, Verdict};
pub use stop_sets::{StopSets, DEFAULT_STOP_CATEGORIES};
