//! Personae Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout Personae:
//! - Annotated input (documents, spans, name facts)
//! - Knowledge base pages and personality types
//! - Resolved personalities and their identity key
//! - Common error types
//! - Collaborator traits (annotator, knowledge base client)
//! - Configuration management
//!
//! Author: hephaex@gmail.com

pub mod config;

pub use config::{
    AppConfig, CacheConfig, ConfigError, KnowledgeBaseConfig, LoggingConfig, PipelineConfig,
    StopListConfig,
};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for Personae operations
#[derive(Error, Debug)]
pub enum PersonaeError {
    #[error("Knowledge base unavailable: {0}")]
    KnowledgeBaseUnavailable(String),

    #[error("Annotation error: {0}")]
    AnnotationError(String),

    #[error("Stop list error: {0}")]
    StopListError(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PersonaeError>;

// ============================================================================
// Documents and Annotations
// ============================================================================

/// A raw document of the corpus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier
    pub id: Uuid,

    /// Human-readable name (usually the source file name)
    pub name: String,

    /// Full text
    pub text: String,
}

impl Document {
    /// Create a new document with a fresh identifier
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            text: text.into(),
        }
    }

    /// First characters of the text, for log lines
    pub fn preview(&self, max_chars: usize) -> &str {
        match self.text.char_indices().nth(max_chars) {
            Some((idx, _)) => &self.text[..idx],
            None => &self.text,
        }
    }
}

/// First/last name parts extracted from a span by the annotator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameFact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<String>,
}

impl NameFact {
    pub fn new(first: Option<&str>, last: Option<&str>) -> Self {
        Self {
            first: first.map(str::to_string),
            last: last.map(str::to_string),
        }
    }

    /// `first last` with missing parts treated as empty, trimmed
    pub fn fullname(&self) -> String {
        format!(
            "{} {}",
            self.first.as_deref().unwrap_or(""),
            self.last.as_deref().unwrap_or("")
        )
        .trim()
        .to_string()
    }
}

/// An annotated name mention
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Surface string as it appears in the text
    pub text: String,

    /// Normalized (lemmatized) form
    pub normal: String,

    /// Structured name parts, if the annotator could extract them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fact: Option<NameFact>,
}

impl Span {
    pub fn new(text: impl Into<String>, normal: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            normal: normal.into(),
            fact: None,
        }
    }

    pub fn with_fact(mut self, fact: NameFact) -> Self {
        self.fact = Some(fact);
        self
    }
}

/// Capabilities requested from the annotator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotateOptions {
    pub with_names: bool,
    pub with_morphology: bool,
    pub with_syntax: bool,
}

impl AnnotateOptions {
    /// Everything enabled, which is what name resolution needs
    pub fn full() -> Self {
        Self {
            with_names: true,
            with_morphology: true,
            with_syntax: true,
        }
    }

    pub fn is_full(&self) -> bool {
        self.with_names && self.with_morphology && self.with_syntax
    }
}

// ============================================================================
// Knowledge Base Models
// ============================================================================

/// A page fetched from the knowledge base
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBasePage {
    /// Canonical title
    pub title: String,

    /// Canonical URL
    pub url: String,

    /// Category labels attached to the page
    pub categories: BTreeSet<String>,
}

impl KnowledgeBasePage {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            categories: BTreeSet::new(),
        }
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories
            .extend(categories.into_iter().map(Into::into));
        self
    }
}

// ============================================================================
// Personality Types
// ============================================================================

/// Kind of a resolved personality
///
/// Declaration order is the classification priority: a page whose categories
/// match several variants is assigned the first one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PersonalityType {
    Individual,
    Company,
    MediaGroup,
    Unverified,
}

impl PersonalityType {
    /// All variants in priority order
    pub const ALL: [PersonalityType; 4] = [
        Self::Individual,
        Self::Company,
        Self::MediaGroup,
        Self::Unverified,
    ];

    /// Category labels recognized for this type
    pub fn categories(&self) -> &'static [&'static str] {
        match self {
            Self::Individual => &["Категория:Персоналии по алфавиту"],
            Self::Company => &[
                "Категория:Компании по алфавиту",
                "Категория:Сайты по алфавиту",
            ],
            Self::MediaGroup => &["Категория:Музыкальные коллективы по алфавиту"],
            Self::Unverified => &[],
        }
    }

    /// Check whether a category label belongs to this type
    pub fn accepts_category(&self, category: &str) -> bool {
        self.categories().contains(&category)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "INDIVIDUAL",
            Self::Company => "COMPANY",
            Self::MediaGroup => "MEDIA_GROUP",
            Self::Unverified => "UNVERIFIED",
        }
    }
}

impl std::fmt::Display for PersonalityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Personalities
// ============================================================================

/// A resolved entity
///
/// Equality, hashing, and ordering all go through [`Personality::key`], so a
/// value produced from one document is interchangeable with the same value
/// produced from another.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Personality {
    /// Confirmed against the knowledge base
    Verified {
        fullname: String,
        source_url: String,
        personality_type: PersonalityType,
    },
    /// Could not be confirmed but is still reported
    Unverified { fullname: String },
}

impl Personality {
    pub fn verified(
        fullname: impl Into<String>,
        source_url: impl Into<String>,
        personality_type: PersonalityType,
    ) -> Self {
        Self::Verified {
            fullname: fullname.into(),
            source_url: source_url.into(),
            personality_type,
        }
    }

    pub fn unverified(fullname: impl Into<String>) -> Self {
        Self::Unverified {
            fullname: fullname.into(),
        }
    }

    pub fn fullname(&self) -> &str {
        match self {
            Self::Verified { fullname, .. } | Self::Unverified { fullname } => fullname,
        }
    }

    pub fn personality_type(&self) -> PersonalityType {
        match self {
            Self::Verified {
                personality_type, ..
            } => *personality_type,
            Self::Unverified { .. } => PersonalityType::Unverified,
        }
    }

    /// Link proving the personality exists, e.g. the wiki article
    pub fn source(&self) -> Option<&str> {
        match self {
            Self::Verified { source_url, .. } => Some(source_url),
            Self::Unverified { .. } => None,
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified { .. })
    }

    /// Identity used for equality, hashing, and aggregation
    pub fn key(&self) -> (&str, PersonalityType, Option<&str>) {
        (self.fullname(), self.personality_type(), self.source())
    }
}

impl PartialEq for Personality {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Personality {}

impl Hash for Personality {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for Personality {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Personality {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key().cmp(&other.key())
    }
}

impl std::fmt::Display for Personality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Personality[{}, {}, {}]",
            self.fullname(),
            self.personality_type(),
            self.source().unwrap_or("None")
        )
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Linguistic annotator producing name spans for a text
#[async_trait::async_trait]
pub trait Annotator: Send + Sync {
    /// Segment and tag the text, returning its name spans
    async fn annotate(&self, text: &str, options: AnnotateOptions) -> Result<Vec<Span>>;
}

/// Client for the external knowledge base
///
/// Both calls fail with [`PersonaeError::KnowledgeBaseUnavailable`] on
/// transport or service errors.
#[async_trait::async_trait]
pub trait KnowledgeBaseClient: Send + Sync {
    /// Titles matching the query, most relevant first (possibly empty)
    async fn search(&self, query: &str) -> Result<Vec<String>>;

    /// Full page for an exact title
    async fn fetch(&self, title: &str) -> Result<KnowledgeBasePage>;

    /// Client name for logging
    fn name(&self) -> &str;
}

// ============================================================================
// Tests
// ============================================================================
