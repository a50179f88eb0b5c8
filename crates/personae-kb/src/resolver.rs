//! Candidate resolution
//!
//! Looks a name candidate up in the knowledge base and picks one page:
//! 1. `"<candidate> (<company qualifier>)"`, so ambiguous names resolve
//!    to the organization
//! 2. `"<candidate> (<social network qualifier>)"`
//! 3. the first search result, trusting the knowledge base ranking
//!
//! Author: hephaex@gmail.com

use std::sync::Arc;

use personae_core::{KnowledgeBaseClient, KnowledgeBaseConfig, KnowledgeBasePage};

/// Outcome of resolving one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A page was chosen and fetched
    Found(KnowledgeBasePage),
    /// The search returned nothing
    NoMatch,
    /// Search or fetch failed; the candidate's status is unknown
    Unavailable(String),
}

/// Resolves name candidates against a knowledge base
#[derive(Clone)]
pub struct KnowledgeBaseResolver {
    client: Arc<dyn KnowledgeBaseClient>,
    company_suffix: String,
    social_network_suffix: String,
}

impl KnowledgeBaseResolver {
    /// Create a resolver with the default (Russian) title qualifiers
    pub fn new(client: Arc<dyn KnowledgeBaseClient>) -> Self {
        Self::from_config(client, &KnowledgeBaseConfig::default())
    }

    /// Create from config
    pub fn from_config(client: Arc<dyn KnowledgeBaseClient>, config: &KnowledgeBaseConfig) -> Self {
        Self::with_qualifiers(
            client,
            &config.company_qualifier,
            &config.social_network_qualifier,
        )
    }

    /// Create with explicit title qualifiers, e.g. `"company"`
    pub fn with_qualifiers(
        client: Arc<dyn KnowledgeBaseClient>,
        company: &str,
        social_network: &str,
    ) -> Self {
        Self {
            client,
            company_suffix: format!(" ({})", company.to_lowercase()),
            social_network_suffix: format!(" ({})", social_network.to_lowercase()),
        }
    }

    /// Pick the title to fetch among search results
    pub fn choose_title<'a>(&self, candidate: &str, results: &'a [String]) -> Option<&'a str> {
        let base = candidate.to_lowercase();
        let company = format!("{base}{}", self.company_suffix);
        let social_network = format!("{base}{}", self.social_network_suffix);

        let find = |wanted: &str| {
            results
                .iter()
                .find(|title| title.to_lowercase() == wanted)
                .map(String::as_str)
        };

        find(&company)
            .or_else(|| find(&social_network))
            .or_else(|| results.first().map(String::as_str))
    }

    /// Search, disambiguate, and fetch the page for a candidate
    pub async fn resolve(&self, candidate: &str) -> Resolution {
        let results = match self.client.search(candidate).await {
            Ok(results) => results,
            Err(e) => return Resolution::Unavailable(e.to_string()),
        };

        let Some(title) = self.choose_title(candidate, &results) else {
            tracing::debug!(candidate, "Nothing found in knowledge base");
            return Resolution::NoMatch;
        };

        tracing::debug!(
            candidate,
            title,
            results = results.len(),
            "Processing personality according to knowledge base"
        );

        match self.client.fetch(title).await {
            Ok(page) => Resolution::Found(page),
            Err(e) => Resolution::Unavailable(e.to_string()),
        }
    }
}
