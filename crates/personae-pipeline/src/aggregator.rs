//! Corpus aggregation
//!
//! Folds per-document personality sets into occurrence counts. A
//! personality counts once per document it appears in.

use std::collections::HashMap;

use personae_core::Personality;

/// Frequency map over personality identity, in first-seen order
#[derive(Debug, Clone, Default)]
pub struct CorpusAggregator {
    /// Position of each personality in `entries`
    index: HashMap<Personality, usize>,
    entries: Vec<(Personality, usize)>,
    documents: usize,
}

impl CorpusAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one document's personality set
    pub fn add_document<I>(&mut self, personalities: I)
    where
        I: IntoIterator<Item = Personality>,
    {
        for personality in personalities {
            match self.index.get(&personality) {
                Some(&pos) => self.entries[pos].1 += 1,
                None => {
                    self.index.insert(personality.clone(), self.entries.len());
                    self.entries.push((personality, 1));
                }
            }
        }
        self.documents += 1;
    }

    /// Occurrences of a personality (0 when never seen)
    pub fn count(&self, personality: &Personality) -> usize {
        self.index
            .get(personality)
            .map(|&pos| self.entries[pos].1)
            .unwrap_or(0)
    }

    /// Number of distinct personalities
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of documents folded so far
    pub fn documents(&self) -> usize {
        self.documents
    }

    /// Sum of all counts
    pub fn total_mentions(&self) -> usize {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    /// Every personality with its count, in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&Personality, usize)> {
        self.entries.iter().map(|(p, count)| (p, *count))
    }

    /// The `k` most frequent personalities, ties in first-seen order
    pub fn top_k(&self, k: usize) -> Vec<(&Personality, usize)> {
        let mut ranked: Vec<(&Personality, usize)> = self.iter().collect();
        // Stable sort keeps first-seen order among equal counts
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(k);
        ranked
    }
}
