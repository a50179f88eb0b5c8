//! Personae KB - Knowledge base access and disambiguation
//!
//! Provides the MediaWiki client, a caching decorator for any
//! [`KnowledgeBaseClient`](personae_core::KnowledgeBaseClient), and the
//! resolver that picks one page per name candidate.
//!
//! Author: hephaex@gmail.com

pub mod cache;
pub mod mediawiki;
pub mod resolver;

pub use cache::{CacheStats, CacheStatsReport, CachedKnowledgeBase};
pub use mediawiki::MediaWikiClient;
pub use resolver::{KnowledgeBaseResolver, Resolution};
