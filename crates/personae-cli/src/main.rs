//! Personae CLI - Command-line interface
//!
//! Usage:
//!   personae analyse <dir> [--top N] [--timeout S] [--json]
//!   personae resolve <name>
//!
//! Author: hephaex@gmail.com

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

use personae_core::{AppConfig, KnowledgeBaseClient, LoggingConfig};
use personae_extractor::StopSets;
use personae_kb::{CachedKnowledgeBase, KnowledgeBaseResolver, MediaWikiClient};
use personae_pipeline::{
    CancellationToken, CandidateOutcome, CorpusReport, CorpusRunner, PreAnnotatedCorpus,
    ResolutionDriver,
};

#[derive(Parser)]
#[command(name = "personae")]
#[command(about = "Extract and verify personalities mentioned in a text corpus")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file (environment variables override it)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a directory of pre-annotated documents
    Analyse {
        /// Directory of `.json` documents
        dir: PathBuf,
        /// Size of the top-K list
        #[arg(long)]
        top: Option<usize>,
        /// Abort the batch after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Resolve a single name against the knowledge base
    Resolve {
        /// Name to resolve
        name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref())?;
    init_tracing(&config.logging);

    let stop_sets =
        Arc::new(StopSets::from_config(&config.stop_lists).context("loading stop lists")?);
    let (client, cache) = build_knowledge_base(&config)?;
    let resolver = KnowledgeBaseResolver::from_config(client, &config.knowledge_base);
    let driver = Arc::new(ResolutionDriver::new(
        stop_sets,
        resolver,
        config.pipeline.max_concurrent_lookups,
    ));

    match cli.command {
        Commands::Analyse {
            dir,
            top,
            timeout,
            json,
        } => {
            let loaded = PreAnnotatedCorpus::load_dir(&dir)
                .with_context(|| format!("reading corpus from {}", dir.display()))?;
            if !loaded.skipped.is_empty() {
                tracing::warn!(skipped = loaded.skipped.len(), "Some files were skipped");
            }

            let mut runner =
                CorpusRunner::from_config(driver, Arc::new(loaded.corpus), &config.pipeline);
            if let Some(secs) = timeout {
                runner = runner.with_timeout(Duration::from_secs(secs));
            }

            let cancel = CancellationToken::new();
            let on_ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupted, stopping after finished documents");
                    on_ctrl_c.cancel();
                }
            });

            let run = runner.run(loaded.documents, cancel).await;
            let report = CorpusReport::from_run(&run, top.unwrap_or(config.pipeline.top_k));

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report.render_text());
            }

            if let Some(cache) = cache {
                for stats in cache.all_stats() {
                    tracing::info!(
                        cache = %stats.name,
                        hits = stats.hits,
                        misses = stats.misses,
                        hit_rate = stats.hit_rate,
                        "Lookup cache statistics"
                    );
                }
            }
        }
        Commands::Resolve { name } => match driver.resolve_candidate(&name).await {
            CandidateOutcome::Emitted(personality) => println!("{personality}"),
            CandidateOutcome::Vetoed { category } => {
                println!("{name}: vetoed by {category}")
            }
            CandidateOutcome::Skipped { reason } => {
                anyhow::bail!("knowledge base unavailable for {name}: {reason}")
            }
        },
    }

    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path.clone())?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    Ok(config)
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| logging.level.as_str().into());

    // Reports go to stdout, logs to stderr
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn build_knowledge_base(
    config: &AppConfig,
) -> anyhow::Result<(Arc<dyn KnowledgeBaseClient>, Option<Arc<CachedKnowledgeBase>>)> {
    let client: Arc<dyn KnowledgeBaseClient> = Arc::new(
        MediaWikiClient::from_config(&config.knowledge_base)
            .context("building knowledge base client")?,
    );
    tracing::debug!(api_url = %config.knowledge_base.api_url, "Knowledge base client ready");

    if !config.cache.enabled {
        return Ok((client, None));
    }

    let cached = Arc::new(CachedKnowledgeBase::with_config(client, &config.cache));
    let shared: Arc<dyn KnowledgeBaseClient> = cached.clone();
    Ok((shared, Some(cached)))
}
