//! Caching layer for knowledge base lookups
//!
//! The same names show up in many documents of a corpus, so search
//! results and fetched pages are cached in front of any
//! [`KnowledgeBaseClient`].
//!
//! Uses the moka crate for thread-safe, async-compatible caching
//! with TTL support. Failures are never cached.

use async_trait::async_trait;
use moka::future::Cache;
use personae_core::{CacheConfig, KnowledgeBaseClient, KnowledgeBasePage, Result};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Cached Client
// ============================================================================

/// Knowledge base client decorator caching searches and pages
#[derive(Clone)]
pub struct CachedKnowledgeBase {
    inner: Arc<dyn KnowledgeBaseClient>,
    searches: Cache<String, Arc<Vec<String>>>,
    pages: Cache<String, Arc<KnowledgeBasePage>>,
    search_stats: Arc<CacheStats>,
    page_stats: Arc<CacheStats>,
}

impl CachedKnowledgeBase {
    /// Wrap a client with default cache settings
    pub fn new(inner: Arc<dyn KnowledgeBaseClient>) -> Self {
        Self::with_config(inner, &CacheConfig::default())
    }

    /// Wrap a client with custom cache settings
    pub fn with_config(inner: Arc<dyn KnowledgeBaseClient>, config: &CacheConfig) -> Self {
        let ttl = Duration::from_secs(config.ttl_seconds);

        Self {
            inner,
            searches: Cache::builder()
                .max_capacity(config.max_capacity)
                .time_to_live(ttl)
                .build(),
            pages: Cache::builder()
                .max_capacity(config.max_capacity)
                .time_to_live(ttl)
                .build(),
            search_stats: Arc::new(CacheStats::new("search")),
            page_stats: Arc::new(CacheStats::new("page")),
        }
    }

    /// Get search cache statistics
    pub fn search_stats(&self) -> Arc<CacheStats> {
        Arc::clone(&self.search_stats)
    }

    /// Get page cache statistics
    pub fn page_stats(&self) -> Arc<CacheStats> {
        Arc::clone(&self.page_stats)
    }

    /// Combined statistics for both caches
    pub fn all_stats(&self) -> Vec<CacheStatsReport> {
        vec![self.search_stats.report(), self.page_stats.report()]
    }

    /// Clear all cached lookups
    pub async fn clear(&self) {
        self.searches.invalidate_all();
        self.pages.invalidate_all();
        // Wait for all pending invalidations to complete
        self.searches.run_pending_tasks().await;
        self.pages.run_pending_tasks().await;
        self.search_stats.reset();
        self.page_stats.reset();
    }
}

#[async_trait]
impl KnowledgeBaseClient for CachedKnowledgeBase {
    async fn search(&self, query: &str) -> Result<Vec<String>> {
        if let Some(hit) = self.searches.get(query).await {
            self.search_stats.record_hit();
            return Ok(hit.as_ref().clone());
        }
        self.search_stats.record_miss();

        let titles = self.inner.search(query).await?;
        self.searches
            .insert(query.to_string(), Arc::new(titles.clone()))
            .await;
        self.search_stats.record_write();
        Ok(titles)
    }

    async fn fetch(&self, title: &str) -> Result<KnowledgeBasePage> {
        if let Some(hit) = self.pages.get(title).await {
            self.page_stats.record_hit();
            return Ok(hit.as_ref().clone());
        }
        self.page_stats.record_miss();

        let page = self.inner.fetch(title).await?;
        self.pages
            .insert(title.to_string(), Arc::new(page.clone()))
            .await;
        self.page_stats.record_write();
        Ok(page)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

// ============================================================================
// Cache Statistics
// ============================================================================

/// Statistics for cache performance monitoring
#[derive(Debug)]
pub struct CacheStats {
    name: String,
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
}

impl CacheStats {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            writes: AtomicU64::new(0),
        }
    }

    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.writes.store(0, Ordering::Relaxed);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Total requests (hits + misses)
    pub fn total_requests(&self) -> u64 {
        self.hits() + self.misses()
    }

    /// Calculate hit rate (0.0 - 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            0.0
        } else {
            self.hits() as f64 / total as f64
        }
    }

    pub fn report(&self) -> CacheStatsReport {
        CacheStatsReport {
            name: self.name.clone(),
            hits: self.hits(),
            misses: self.misses(),
            writes: self.writes(),
            total_requests: self.total_requests(),
            hit_rate: self.hit_rate(),
        }
    }
}

/// Serializable cache statistics report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStatsReport {
    pub name: String,
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub total_requests: u64,
    /// Hit rate (0.0 - 1.0)
    pub hit_rate: f64,
}

// ============================================================================
// Tests
// ============================================================================
