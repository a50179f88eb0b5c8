//! MediaWiki Action API client
//!
//! Searches article titles and fetches canonical title, URL, and
//! categories of a page. Works against any MediaWiki installation;
//! the default configuration points at the Russian Wikipedia.

use async_trait::async_trait;
use personae_core::{
    KnowledgeBaseClient, KnowledgeBaseConfig, KnowledgeBasePage, PersonaeError, Result,
};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    #[serde(default)]
    info: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PageResponse {
    query: Option<PageQuery>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    #[serde(default)]
    pages: Vec<RawPage>,
}

#[derive(Debug, Deserialize)]
struct RawPage {
    title: String,
    fullurl: Option<String>,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    #[serde(default)]
    categories: Vec<CategoryRef>,
}

#[derive(Debug, Deserialize)]
struct CategoryRef {
    title: String,
}

fn unavailable(message: impl Into<String>) -> PersonaeError {
    PersonaeError::KnowledgeBaseUnavailable(message.into())
}

fn api_error(error: ApiError) -> PersonaeError {
    unavailable(format!("MediaWiki error {}: {}", error.code, error.info))
}

/// Titles from a `list=search` response
fn parse_search_response(body: &str) -> Result<Vec<String>> {
    let response: SearchResponse = serde_json::from_str(body)
        .map_err(|e| unavailable(format!("Failed to parse search response: {e}")))?;

    if let Some(error) = response.error {
        return Err(api_error(error));
    }

    Ok(response
        .query
        .map(|q| q.search.into_iter().map(|hit| hit.title).collect())
        .unwrap_or_default())
}

/// Page from a `prop=info|categories` response
fn parse_page_response(body: &str, requested: &str) -> Result<KnowledgeBasePage> {
    let response: PageResponse = serde_json::from_str(body)
        .map_err(|e| unavailable(format!("Failed to parse page response: {e}")))?;

    if let Some(error) = response.error {
        return Err(api_error(error));
    }

    let page = response
        .query
        .and_then(|q| q.pages.into_iter().next())
        .ok_or_else(|| unavailable(format!("No page returned for {requested}")))?;

    if page.missing || page.invalid {
        return Err(unavailable(format!("Page {requested} does not exist")));
    }

    let url = page
        .fullurl
        .ok_or_else(|| unavailable(format!("Page {} has no URL", page.title)))?;

    Ok(KnowledgeBasePage::new(page.title, url)
        .with_categories(page.categories.into_iter().map(|c| c.title)))
}

// ============================================================================
// Client
// ============================================================================

/// MediaWiki Action API client
pub struct MediaWikiClient {
    client: Client,
    api_url: String,
    search_limit: u32,
}

impl MediaWikiClient {
    /// Create a client for an API endpoint with default settings
    pub fn new(api_url: impl Into<String>) -> Result<Self> {
        let config = KnowledgeBaseConfig {
            api_url: api_url.into(),
            ..Default::default()
        };
        Self::from_config(&config)
    }

    /// Create from config
    pub fn from_config(config: &KnowledgeBaseConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| unavailable(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            search_limit: config.search_limit,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    async fn get(&self, params: &[(&str, &str)]) -> Result<String> {
        let response = self
            .client
            .get(&self.api_url)
            .query(params)
            .query(&[("format", "json"), ("formatversion", "2")])
            .send()
            .await
            .map_err(|e| unavailable(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(unavailable(format!("MediaWiki HTTP {status}: {error_text}")));
        }

        response
            .text()
            .await
            .map_err(|e| unavailable(format!("Failed to read response: {e}")))
    }
}

#[async_trait]
impl KnowledgeBaseClient for MediaWikiClient {
    async fn search(&self, query: &str) -> Result<Vec<String>> {
        let limit = self.search_limit.to_string();
        let body = self
            .get(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
                ("srprop", ""),
            ])
            .await?;

        parse_search_response(&body)
    }

    async fn fetch(&self, title: &str) -> Result<KnowledgeBasePage> {
        let body = self
            .get(&[
                ("action", "query"),
                ("prop", "info|categories"),
                ("inprop", "url"),
                ("redirects", "1"),
                ("cllimit", "max"),
                ("titles", title),
            ])
            .await?;

        parse_page_response(&body, title)
    }

    fn name(&self) -> &str {
        "mediawiki"
    }
}

// ============================================================================
// Tests
// ============================================================================
