//! Stop word and stop category sets
//!
//! Loaded once at startup and shared read-only through `Arc`.

use std::collections::HashSet;
use std::path::Path;

use personae_core::{PersonaeError, Result, StopListConfig};

/// Categories of pages that are known noise: disambiguation pages,
/// states, places, works of art, software and crypto topics, museums.
pub const DEFAULT_STOP_CATEGORIES: &[&str] = &[
    "Категория:Страницы значений по алфавиту",
    "Категория:Государства по алфавиту",
    "Категория:Литературные произведения по алфавиту",
    "Категория:Населённые пункты по алфавиту",
    "Категория:Фильмы по алфавиту",
    "Категория:Блокчейн",
    "Категория:Программное обеспечение по алфавиту",
    "Категория:Криптография",
    "Категория:Криптовалюты",
    "Категория:Музеи по алфавиту",
];

/// Immutable stop word and stop category sets
#[derive(Debug, Clone, Default)]
pub struct StopSets {
    /// Case-folded normalized forms
    stop_words: HashSet<String>,
    /// Exact category labels
    stop_categories: HashSet<String>,
}

impl StopSets {
    /// Build from explicit lists; stop words are case-folded
    pub fn new<W, C>(stop_words: W, stop_categories: C) -> Self
    where
        W: IntoIterator,
        W::Item: AsRef<str>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            stop_words: stop_words
                .into_iter()
                .map(|w| w.as_ref().to_lowercase())
                .collect(),
            stop_categories: stop_categories.into_iter().map(Into::into).collect(),
        }
    }

    /// No stop words, built-in stop categories
    pub fn with_default_categories() -> Self {
        Self::new(Vec::<String>::new(), DEFAULT_STOP_CATEGORIES.iter().copied())
    }

    /// Load the sets named in the configuration
    pub fn from_config(config: &StopListConfig) -> Result<Self> {
        let stop_words = match &config.stop_words_path {
            Some(path) => load_list(path)?,
            None => Vec::new(),
        };

        let stop_categories = match &config.stop_categories_path {
            Some(path) => load_list(path)?,
            None => DEFAULT_STOP_CATEGORIES
                .iter()
                .map(|c| c.to_string())
                .collect(),
        };

        let sets = Self::new(stop_words, stop_categories);
        tracing::info!(
            stop_words = sets.stop_words.len(),
            stop_categories = sets.stop_categories.len(),
            "Loaded stop lists"
        );
        Ok(sets)
    }

    /// Check a normalized form against the stop words, ignoring case
    pub fn is_stop_word(&self, normal: &str) -> bool {
        self.stop_words.contains(&normal.to_lowercase())
    }

    pub fn is_stop_category(&self, category: &str) -> bool {
        self.stop_categories.contains(category)
    }

    /// First stop category found among the given categories
    pub fn find_stop_category<'a, I>(&self, categories: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a String>,
    {
        categories
            .into_iter()
            .find(|c| self.is_stop_category(c))
            .map(String::as_str)
    }

    pub fn stop_word_count(&self) -> usize {
        self.stop_words.len()
    }

    pub fn stop_category_count(&self) -> usize {
        self.stop_categories.len()
    }
}

/// Read a list file: one entry per line, blank lines and `#` comments skipped
pub fn load_list(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        PersonaeError::StopListError(format!("failed to read {}: {e}", path.display()))
    })?;
    Ok(parse_list(&content))
}

fn parse_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
