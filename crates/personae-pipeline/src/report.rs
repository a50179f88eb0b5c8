//! Run reports
//!
//! Serializable summary of a corpus run: the top-K list, every aggregated
//! personality with its count, and the `fullname;count` lines used to
//! build word clouds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use personae_core::Personality;

use crate::runner::{CorpusRun, RunStatus, RunSummary};

/// A personality with its corpus-wide count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedPersonality {
    pub personality: Personality,
    pub count: usize,
}

/// Report of a finished run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusReport {
    pub generated_at: DateTime<Utc>,
    pub status: RunStatus,
    pub summary: RunSummary,
    pub total_personalities: usize,
    pub top: Vec<RankedPersonality>,
    /// All personalities in first-seen order
    pub personalities: Vec<RankedPersonality>,
}

impl CorpusReport {
    pub fn from_run(run: &CorpusRun, top_k: usize) -> Self {
        let ranked = |(personality, count): (&Personality, usize)| RankedPersonality {
            personality: personality.clone(),
            count,
        };

        Self {
            generated_at: Utc::now(),
            status: run.status,
            summary: run.summary.clone(),
            total_personalities: run.aggregator.total_mentions(),
            top: run.aggregator.top_k(top_k).into_iter().map(ranked).collect(),
            personalities: run.aggregator.iter().map(ranked).collect(),
        }
    }

    /// `fullname;count` per personality
    pub fn word_cloud_lines(&self) -> Vec<String> {
        self.personalities
            .iter()
            .map(|r| format!("{};{}", r.personality.fullname(), r.count))
            .collect()
    }

    /// Human-readable report
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "Processed documents: {} of {} ({} failed, status: {:?})\n",
            self.summary.documents_processed,
            self.summary.documents_total,
            self.summary.documents_failed,
            self.status
        ));
        out.push_str(&format!(
            "Total personalities extracted: {}\n",
            self.total_personalities
        ));
        out.push_str(&format!("Top-{} extracted personalities:\n", self.top.len()));
        for (i, r) in self.top.iter().enumerate() {
            out.push_str(&format!(
                "{:>3}. {} ({}) x {}\n",
                i + 1,
                r.personality.fullname(),
                r.personality.personality_type(),
                r.count
            ));
        }
        out.push('\n');
        for line in self.word_cloud_lines() {
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}
