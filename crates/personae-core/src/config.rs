//! Personae Configuration Management
//!
//! Handles configuration from environment variables and TOML files
//! with defaults suited to the Russian Wikipedia.
//!
//! Author: hephaex@gmail.com

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Knowledge base connection
    pub knowledge_base: KnowledgeBaseConfig,

    /// Stop word / stop category sources
    pub stop_lists: StopListConfig,

    /// Resolution pipeline tuning
    pub pipeline: PipelineConfig,

    /// Lookup cache
    pub cache: CacheConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_override()
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Merge with environment variables (env takes precedence)
    ///
    /// Every variable that is set wins over the current value, even when it
    /// equals the built-in default.
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        // Knowledge base
        if let Ok(url) = std::env::var("KB_API_URL") {
            self.knowledge_base.api_url = url;
        }
        if let Ok(agent) = std::env::var("KB_USER_AGENT") {
            self.knowledge_base.user_agent = agent;
        }
        if let Ok(secs) = std::env::var("KB_TIMEOUT_SECS") {
            self.knowledge_base.timeout_secs = parse_var("KB_TIMEOUT_SECS", secs)?;
        }

        // Stop lists
        if let Ok(path) = std::env::var("STOP_WORDS_PATH") {
            self.stop_lists.stop_words_path = Some(PathBuf::from(path));
        }
        if let Ok(path) = std::env::var("STOP_CATEGORIES_PATH") {
            self.stop_lists.stop_categories_path = Some(PathBuf::from(path));
        }

        // Pipeline
        if let Ok(n) = std::env::var("MAX_CONCURRENT_LOOKUPS") {
            self.pipeline.max_concurrent_lookups = parse_var("MAX_CONCURRENT_LOOKUPS", n)?;
        }
        if let Ok(n) = std::env::var("DOCUMENT_CONCURRENCY") {
            self.pipeline.document_concurrency = parse_var("DOCUMENT_CONCURRENCY", n)?;
        }
        if let Ok(n) = std::env::var("TOP_K") {
            self.pipeline.top_k = parse_var("TOP_K", n)?;
        }
        if let Ok(secs) = std::env::var("BATCH_TIMEOUT_SECS") {
            self.pipeline.batch_timeout_secs = Some(parse_var("BATCH_TIMEOUT_SECS", secs)?);
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.logging.level = level;
        }

        self.validate()?;
        Ok(self)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.max_concurrent_lookups == 0 {
            return Err(ConfigError::InvalidValue {
                key: "pipeline.max_concurrent_lookups".to_string(),
                value: "0".to_string(),
            });
        }
        if self.pipeline.document_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                key: "pipeline.document_concurrency".to_string(),
                value: "0".to_string(),
            });
        }
        if self.knowledge_base.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "knowledge_base.timeout_secs".to_string(),
                value: "0".to_string(),
            });
        }
        if self.knowledge_base.search_limit == 0 {
            return Err(ConfigError::InvalidValue {
                key: "knowledge_base.search_limit".to_string(),
                value: "0".to_string(),
            });
        }
        if self.knowledge_base.api_url.trim().is_empty() {
            return Err(ConfigError::MissingRequired(
                "knowledge_base.api_url".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

/// Knowledge base (MediaWiki) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeBaseConfig {
    /// MediaWiki Action API endpoint
    pub api_url: String,

    /// Maximum number of search results to consider
    pub search_limit: u32,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// User-Agent sent with every request
    pub user_agent: String,

    /// Title qualifier marking a company article, e.g. "Apple (компания)"
    pub company_qualifier: String,

    /// Title qualifier marking a social network article
    pub social_network_qualifier: String,
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            api_url: "https://ru.wikipedia.org/w/api.php".to_string(),
            search_limit: 10,
            timeout_secs: 30,
            user_agent: concat!("personae/", env!("CARGO_PKG_VERSION")).to_string(),
            company_qualifier: "компания".to_string(),
            social_network_qualifier: "социальная сеть".to_string(),
        }
    }
}

/// Stop list sources
///
/// Files hold one entry per line; blank lines and `#` comments are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StopListConfig {
    /// Normalized forms to drop before resolution
    pub stop_words_path: Option<PathBuf>,

    /// Category labels that veto a page (built-in list when unset)
    pub stop_categories_path: Option<PathBuf>,
}

/// Resolution pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Knowledge base lookups in flight across the whole corpus
    pub max_concurrent_lookups: usize,

    /// Documents processed at the same time
    pub document_concurrency: usize,

    /// Size of the top-K list in reports
    pub top_k: usize,

    /// Abort the batch after this many seconds
    pub batch_timeout_secs: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_lookups: 4,
            document_concurrency: 2,
            top_k: 30,
            batch_timeout_secs: None,
        }
    }
}

/// Lookup cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Wrap the knowledge base client with a cache
    pub enabled: bool,

    /// Maximum entries per cache (searches and pages)
    pub max_capacity: u64,

    /// Time-to-live of a cached entry in seconds
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_capacity: 10_000,
            ttl_seconds: 3600,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
