//! Entity classification
//!
//! Maps a knowledge base page to a personality type by its categories.
//! Pages carrying a stop category are vetoed outright.

use std::sync::Arc;

use serde::Serialize;

use personae_core::{KnowledgeBasePage, PersonalityType};

use crate::StopSets;

/// Outcome of judging a resolved page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// Known noise, must not be emitted at all
    Vetoed { category: String },
    /// Recognized personality type
    Classified { personality_type: PersonalityType },
    /// Real page, but none of the recognized categories
    Unclassified,
}

/// Classifies pages and vetoes noise topics
#[derive(Debug, Clone)]
pub struct EntityClassifier {
    stop_sets: Arc<StopSets>,
}

impl EntityClassifier {
    pub fn new(stop_sets: Arc<StopSets>) -> Self {
        Self { stop_sets }
    }

    /// Stop category that vetoes the page, if any
    pub fn veto_category<'a>(&self, page: &'a KnowledgeBasePage) -> Option<&'a str> {
        self.stop_sets.find_stop_category(&page.categories)
    }

    pub fn is_vetoed(&self, page: &KnowledgeBasePage) -> bool {
        self.veto_category(page).is_some()
    }

    /// First type, in declared priority order, recognizing any page category
    pub fn classify(&self, page: &KnowledgeBasePage) -> Option<PersonalityType> {
        PersonalityType::ALL
            .into_iter()
            .filter(|t| *t != PersonalityType::Unverified)
            .find(|t| page.categories.iter().any(|c| t.accepts_category(c)))
    }

    /// Veto first, then classification
    pub fn judge(&self, page: &KnowledgeBasePage) -> Verdict {
        if let Some(category) = self.veto_category(page) {
            return Verdict::Vetoed {
                category: category.to_string(),
            };
        }

        match self.classify(page) {
            Some(personality_type) => Verdict::Classified { personality_type },
            None => Verdict::Unclassified,
        }
    }
}
