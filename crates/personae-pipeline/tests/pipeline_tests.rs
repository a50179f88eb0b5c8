//! Pipeline Integration Tests
//!
//! Run whole documents through annotation, resolution, classification,
//! and aggregation against an in-memory knowledge base.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use personae_core::{
    Document, KnowledgeBaseClient, KnowledgeBasePage, NameFact, PersonaeError, Personality,
    PersonalityType, PipelineConfig, Result, Span,
};
use personae_extractor::{StopSets, DEFAULT_STOP_CATEGORIES};
use personae_kb::{CachedKnowledgeBase, KnowledgeBaseResolver};
use personae_pipeline::{
    CancellationToken, CorpusReport, CorpusRunner, PreAnnotatedCorpus, ResolutionDriver,
    RunStatus,
};

const COMPANY: &str = "Категория:Компании по алфавиту";
const PERSON: &str = "Категория:Персоналии по алфавиту";
const STATE: &str = "Категория:Государства по алфавиту";

// =============================================================================
// Fixtures
// =============================================================================

/// In-memory knowledge base with canned searches and pages
#[derive(Default)]
struct MemoryKb {
    searches: HashMap<String, Vec<String>>,
    pages: HashMap<String, KnowledgeBasePage>,
    down: Vec<String>,
    slow: Vec<String>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    search_calls: AtomicUsize,
}

impl MemoryKb {
    fn article(mut self, query: &str, results: &[&str], title: &str, categories: &[&str]) -> Self {
        self.searches.insert(
            query.to_string(),
            results.iter().map(|r| r.to_string()).collect(),
        );
        self.pages.insert(
            title.to_string(),
            KnowledgeBasePage::new(title, format!("https://kb/{}", title.replace(' ', "_")))
                .with_categories(categories.iter().copied()),
        );
        self
    }

    fn down(mut self, query: &str) -> Self {
        self.down.push(query.to_string());
        self
    }

    fn slow(mut self, query: &str) -> Self {
        self.slow.push(query.to_string());
        self
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl KnowledgeBaseClient for MemoryKb {
    async fn search(&self, query: &str) -> Result<Vec<String>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if self.slow.iter().any(|q| q == query) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        } else if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.down.iter().any(|q| q == query) {
            return Err(PersonaeError::KnowledgeBaseUnavailable("503".to_string()));
        }
        Ok(self.searches.get(query).cloned().unwrap_or_default())
    }

    async fn fetch(&self, title: &str) -> Result<KnowledgeBasePage> {
        self.pages
            .get(title)
            .cloned()
            .ok_or_else(|| PersonaeError::KnowledgeBaseUnavailable(format!("no page {title}")))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

fn default_kb() -> MemoryKb {
    MemoryKb::default()
        .article("Acme", &["Acme"], "Acme", &[COMPANY])
        .article(
            "Apple",
            &["Apple", "Apple (company)"],
            "Apple (company)",
            &[COMPANY],
        )
        .article("Linus Torvalds", &["Linus Torvalds"], "Linus Torvalds", &[PERSON])
        .article("Freedonia", &["Freedonia"], "Freedonia", &[STATE, PERSON])
}

fn driver_for(
    kb: Arc<dyn KnowledgeBaseClient>,
    stop_words: &[&str],
    lookups: usize,
) -> ResolutionDriver {
    let stop_sets = Arc::new(StopSets::new(
        stop_words.iter().copied(),
        DEFAULT_STOP_CATEGORIES.iter().copied(),
    ));
    let resolver = KnowledgeBaseResolver::with_qualifiers(kb, "company", "social network");
    ResolutionDriver::new(stop_sets, resolver, lookups)
}

fn name_span(first: &str, last: &str) -> Span {
    let full = format!("{first} {last}");
    Span::new(full.clone(), full).with_fact(NameFact::new(Some(first), Some(last)))
}

fn org_span(name: &str) -> Span {
    Span::new(name, name)
}

fn corpus(docs: &[(&str, &str, Vec<Span>)]) -> (PreAnnotatedCorpus, Vec<Document>) {
    let mut corpus = PreAnnotatedCorpus::new();
    let documents = docs
        .iter()
        .map(|(name, text, spans)| {
            corpus.insert(*text, spans.clone());
            Document::new(*name, *text)
        })
        .collect();
    (corpus, documents)
}

fn runner(
    kb: Arc<dyn KnowledgeBaseClient>,
    annotator: PreAnnotatedCorpus,
    config: &PipelineConfig,
) -> CorpusRunner {
    let driver = Arc::new(driver_for(kb, &[], config.max_concurrent_lookups));
    CorpusRunner::from_config(driver, Arc::new(annotator), config)
}

// =============================================================================
// Per-document resolution
// =============================================================================

#[tokio::test]
async fn test_end_to_end_single_document() {
    let driver = driver_for(Arc::new(default_kb()), &[], 4);
    let spans = vec![name_span("John", "Smith"), org_span("Acme")];

    let resolution = driver.process_spans(&spans).await;

    let expected: BTreeSet<Personality> = [
        Personality::verified("Acme", "https://kb/Acme", PersonalityType::Company),
        Personality::unverified("John Smith"),
    ]
    .into_iter()
    .collect();
    assert_eq!(resolution.personalities, expected);
}

#[tokio::test]
async fn test_tie_break_prefers_company_article() {
    let driver = driver_for(Arc::new(default_kb()), &[], 4);
    let resolution = driver.process_spans(&[org_span("Apple")]).await;

    let only: Vec<&Personality> = resolution.personalities.iter().collect();
    assert_eq!(only.len(), 1);
    assert_eq!(only[0].fullname(), "Apple (company)");
    assert_eq!(only[0].personality_type(), PersonalityType::Company);
}

#[tokio::test]
async fn test_vetoed_page_emits_nothing() {
    let driver = driver_for(Arc::new(default_kb()), &[], 4);
    let resolution = driver
        .process_spans(&[org_span("Freedonia"), name_span("Linus", "Torvalds")])
        .await;

    assert_eq!(resolution.stats.vetoed, 1);
    assert!(resolution
        .personalities
        .iter()
        .all(|p| !p.fullname().contains("Freedonia")));
    assert_eq!(resolution.personalities.len(), 1);
}

#[tokio::test]
async fn test_stop_words_never_reach_knowledge_base() {
    let kb = Arc::new(default_kb());
    let driver = driver_for(kb.clone(), &["acme"], 4);

    let resolution = driver.process_spans(&[org_span("ACME"), org_span("Acme")]).await;

    assert!(resolution.personalities.is_empty());
    assert_eq!(resolution.stats.candidates, 0);
    assert_eq!(kb.search_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unavailable_candidate_is_dropped_not_unverified() {
    let driver = driver_for(Arc::new(default_kb().down("Globex")), &[], 4);
    let resolution = driver
        .process_spans(&[org_span("Globex"), org_span("Acme")])
        .await;

    assert_eq!(resolution.stats.skipped, 1);
    assert!(!resolution
        .personalities
        .contains(&Personality::unverified("Globex")));
    assert_eq!(resolution.personalities.len(), 1);
}

#[tokio::test]
async fn test_lookups_respect_concurrency_limit() {
    let kb = Arc::new(default_kb().with_delay(Duration::from_millis(20)));
    let driver = driver_for(kb.clone(), &[], 2);
    let spans: Vec<Span> = (0..10).map(|i| org_span(&format!("Name{i}"))).collect();

    let resolution = driver.process_spans(&spans).await;

    assert_eq!(resolution.personalities.len(), 10);
    // Bounded, and the pool really overlaps lookups
    assert_eq!(kb.max_in_flight.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_resolution_is_deterministic() {
    let kb: Arc<dyn KnowledgeBaseClient> = Arc::new(default_kb());
    let spans = vec![
        name_span("John", "Smith"),
        org_span("Acme"),
        org_span("Apple"),
        name_span("Linus", "Torvalds"),
        org_span("Freedonia"),
    ];

    let first = driver_for(kb.clone(), &[], 3).process_spans(&spans).await;
    for _ in 0..5 {
        let again = driver_for(kb.clone(), &[], 3).process_spans(&spans).await;
        assert_eq!(again.personalities, first.personalities);
        let a: Vec<&Personality> = again.personalities.iter().collect();
        let b: Vec<&Personality> = first.personalities.iter().collect();
        assert_eq!(a, b);
    }
}

// =============================================================================
// Corpus runs
// =============================================================================

#[tokio::test]
async fn test_corpus_aggregates_across_documents() {
    let (annotator, documents) = corpus(&[
        ("one", "Acme hires John Smith", vec![org_span("Acme"), name_span("John", "Smith")]),
        ("two", "Acme again", vec![org_span("Acme")]),
        ("three", "Linus", vec![name_span("Linus", "Torvalds")]),
    ]);
    let runner = runner(Arc::new(default_kb()), annotator, &PipelineConfig::default());

    let run = runner.run(documents, CancellationToken::new()).await;

    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.summary.documents_processed, 3);
    assert_eq!(run.documents.len(), 3);
    assert_eq!(run.documents[0].name, "one");

    let acme = Personality::verified("Acme", "https://kb/Acme", PersonalityType::Company);
    assert_eq!(run.aggregator.count(&acme), 2);
    assert_eq!(run.aggregator.top_k(1)[0], (&acme, 2));

    let report = CorpusReport::from_run(&run, 10);
    assert_eq!(report.total_personalities, 4);
    assert!(report.word_cloud_lines().contains(&"Acme;2".to_string()));
}

#[tokio::test]
async fn test_failed_annotation_does_not_abort_batch() {
    let (annotator, mut documents) = corpus(&[("one", "Acme", vec![org_span("Acme")])]);
    documents.insert(0, Document::new("orphan", "text nobody annotated"));
    let runner = runner(Arc::new(default_kb()), annotator, &PipelineConfig::default());

    let run = runner.run(documents, CancellationToken::new()).await;

    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.summary.documents_failed, 1);
    assert_eq!(run.summary.documents_processed, 1);
    assert_eq!(run.aggregator.documents(), 1);
}

#[tokio::test]
async fn test_cancel_before_start() {
    let (annotator, documents) = corpus(&[("one", "Acme", vec![org_span("Acme")])]);
    let runner = runner(Arc::new(default_kb()), annotator, &PipelineConfig::default());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let run = runner.run(documents, cancel).await;

    assert_eq!(run.status, RunStatus::Cancelled);
    assert!(run.aggregator.is_empty());
    assert_eq!(run.summary.documents_total, 1);
}

#[tokio::test]
async fn test_cancel_keeps_finished_documents() {
    let (annotator, documents) = corpus(&[
        ("fast", "Acme", vec![org_span("Acme")]),
        ("stuck", "Initech", vec![org_span("Initech")]),
    ]);
    let config = PipelineConfig {
        document_concurrency: 1,
        ..Default::default()
    };
    let runner = runner(Arc::new(default_kb().slow("Initech")), annotator, &config);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let run = runner.run(documents, cancel).await;

    assert_eq!(run.status, RunStatus::Cancelled);
    assert_eq!(run.summary.documents_processed, 1);
    assert_eq!(run.aggregator.documents(), 1);
    assert_eq!(run.aggregator.len(), 1);
}

#[tokio::test]
async fn test_batch_timeout() {
    let (annotator, documents) = corpus(&[("stuck", "Initech", vec![org_span("Initech")])]);
    let runner = runner(Arc::new(default_kb().slow("Initech")), annotator, &PipelineConfig::default())
        .with_timeout(Duration::from_millis(100));

    let run = runner.run(documents, CancellationToken::new()).await;

    assert_eq!(run.status, RunStatus::TimedOut);
    assert!(run.aggregator.is_empty());
}

#[tokio::test]
async fn test_cache_serves_repeated_candidates() {
    let kb = Arc::new(default_kb());
    let cached: Arc<dyn KnowledgeBaseClient> = Arc::new(CachedKnowledgeBase::new(kb.clone()));
    let (annotator, documents) = corpus(&[
        ("one", "Acme 1", vec![org_span("Acme")]),
        ("two", "Acme 2", vec![org_span("Acme")]),
        ("three", "Acme 3", vec![org_span("Acme")]),
    ]);
    let config = PipelineConfig {
        document_concurrency: 1,
        ..Default::default()
    };
    let runner = runner(cached, annotator, &config);

    let run = runner.run(documents, CancellationToken::new()).await;

    assert_eq!(run.summary.documents_processed, 3);
    assert_eq!(kb.search_calls.load(Ordering::SeqCst), 1);
}
