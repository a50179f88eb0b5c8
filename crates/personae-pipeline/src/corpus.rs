//! Pre-annotated corpus input
//!
//! Annotation happens outside this system. Its output is stored as one
//! JSON file per document:
//!
//! ```json
//! {"name": "post-1", "text": "...", "spans": [{"text": "...", "normal": "...", "fact": {"first": "..."}}]}
//! ```
//!
//! [`PreAnnotatedCorpus`] serves those spans through the [`Annotator`] trait.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use personae_core::{AnnotateOptions, Annotator, Document, PersonaeError, Result, Span};

/// On-disk form of an annotated document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotatedDocument {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub name: Option<String>,
    pub text: String,
    #[serde(default)]
    pub spans: Vec<Span>,
}

/// Result of loading a corpus directory
#[derive(Debug, Default)]
pub struct LoadedCorpus {
    pub corpus: PreAnnotatedCorpus,
    /// Documents in file-name order
    pub documents: Vec<Document>,
    /// Files that could not be read or parsed
    pub skipped: Vec<PathBuf>,
}

/// Annotator backed by spans computed ahead of time
#[derive(Debug, Clone, Default)]
pub struct PreAnnotatedCorpus {
    spans_by_text: HashMap<String, Vec<Span>>,
}

impl PreAnnotatedCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register spans for a text; a later insert for the same text wins.
    ///
    /// Returns the replaced spans when they differ from the new ones.
    pub fn insert(&mut self, text: impl Into<String>, spans: Vec<Span>) -> Option<Vec<Span>> {
        self.spans_by_text
            .insert(text.into(), spans.clone())
            .filter(|previous| *previous != spans)
    }

    pub fn len(&self) -> usize {
        self.spans_by_text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans_by_text.is_empty()
    }

    /// Register an annotated document and return its plain form
    pub fn add_document(&mut self, annotated: AnnotatedDocument, fallback_name: &str) -> Document {
        let document = Document {
            id: annotated.id.unwrap_or_else(Uuid::new_v4),
            name: annotated
                .name
                .unwrap_or_else(|| fallback_name.to_string()),
            text: annotated.text,
        };
        if self.insert(document.text.clone(), annotated.spans).is_some() {
            tracing::warn!(
                document = %document.name,
                "Another document has the same text with different spans, using this one"
            );
        }
        document
    }

    /// Load every `.json` file of a directory
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<LoadedCorpus> {
        let dir = dir.as_ref();
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("json")
            })
            .collect();
        paths.sort();

        tracing::info!(dir = %dir.display(), files = paths.len(), "Started processing files");

        let mut loaded = LoadedCorpus::default();
        for path in paths {
            match read_document(&path) {
                Ok(annotated) => {
                    let fallback = path
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .unwrap_or_default()
                        .to_string();
                    let document = loaded.corpus.add_document(annotated, &fallback);
                    loaded.documents.push(document);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable document");
                    loaded.skipped.push(path);
                }
            }
        }

        Ok(loaded)
    }
}

fn read_document(path: &Path) -> Result<AnnotatedDocument> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| PersonaeError::InvalidDocument(format!("{}: {e}", path.display())))
}

#[async_trait]
impl Annotator for PreAnnotatedCorpus {
    async fn annotate(&self, text: &str, options: AnnotateOptions) -> Result<Vec<Span>> {
        // Stored spans are name spans; without name tagging there are none
        if !options.with_names {
            return Ok(Vec::new());
        }

        self.spans_by_text
            .get(text)
            .cloned()
            .ok_or_else(|| PersonaeError::AnnotationError("no annotation for text".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn test_annotate_known_text() {
        let mut corpus = PreAnnotatedCorpus::new();
        corpus.insert("Acme hires", vec![Span::new("Acme", "Acme")]);

        let spans = corpus
            .annotate("Acme hires", AnnotateOptions::full())
            .await
            .unwrap();
        assert_eq!(spans, vec![Span::new("Acme", "Acme")]);

        let none = corpus
            .annotate("Acme hires", AnnotateOptions::default())
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_same_text_different_spans() {
        let mut corpus = PreAnnotatedCorpus::new();
        let first = AnnotatedDocument {
            id: None,
            name: Some("first".to_string()),
            text: "Acme".to_string(),
            spans: vec![Span::new("Acme", "Acme")],
        };
        let second = AnnotatedDocument {
            name: Some("second".to_string()),
            spans: vec![Span::new("Acme", "Acme Corp")],
            ..first.clone()
        };

        assert!(corpus.insert("Acme", first.spans.clone()).is_none());
        assert!(corpus.insert("Acme", first.spans.clone()).is_none());
        assert_eq!(
            corpus.insert("Acme", second.spans.clone()),
            Some(first.spans.clone())
        );

        let a = corpus.add_document(first, "a");
        let b = corpus.add_document(second, "b");
        assert_ne!(a.id, b.id);
        assert_eq!(corpus.len(), 1);

        // The later file wins for both documents
        let spans = corpus.annotate("Acme", AnnotateOptions::full()).await.unwrap();
        assert_eq!(spans, vec![Span::new("Acme", "Acme Corp")]);
    }

    #[tokio::test]
    async fn test_annotate_unknown_text_fails() {
        let corpus = PreAnnotatedCorpus::new();
        assert!(matches!(
            corpus.annotate("???", AnnotateOptions::full()).await,
            Err(PersonaeError::AnnotationError(_))
        ));
    }

    #[test]
    fn test_load_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("b.json"),
            r#"{"text": "Илон Маск", "spans": [{"text": "Илон Маск", "normal": "Илон Маск", "fact": {"first": "Илон", "last": "Маск"}}]}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("a.json"),
            r#"{"name": "first", "text": "Яндекс", "spans": [{"text": "Яндекс", "normal": "Яндекс"}]}"#,
        )
        .unwrap();
        fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let loaded = PreAnnotatedCorpus::load_dir(dir.path()).unwrap();

        let names: Vec<&str> = loaded.documents.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["first", "b"]);
        assert_eq!(loaded.skipped.len(), 1);
        assert_eq!(loaded.corpus.len(), 2);
    }

    #[test]
    fn test_load_missing_dir() {
        assert!(PreAnnotatedCorpus::load_dir("/nonexistent/corpus").is_err());
    }
}
