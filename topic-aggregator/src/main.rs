use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use interfaces::{BaselineSummarizer, EmptySummarizer, JsonArtifactStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use topic_aggregator::{load_config, FetchConfig, RunOrchestrator, SourceSet, Summarizer, TopicAggregator};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "topic-aggregator", about = "Crawl configured topics into daily JSON digests")]
struct Cli {
    /// Topics YAML file
    #[arg(long, env = "TOPICS_CONFIG", default_value = "config/topics.yaml")]
    config: PathBuf,

    /// Root directory for `<date>/<topic>.json` artifacts
    #[arg(long, env = "OUTPUT_DIR", default_value = "data")]
    output_dir: PathBuf,

    /// Only run these topics (repeatable)
    #[arg(long = "topic")]
    topics: Vec<String>,

    /// Run date as YYYY-MM-DD (defaults to today, UTC)
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Override settings.max_articles_per_topic
    #[arg(long)]
    max_articles: Option<usize>,

    /// Per-request HTTP timeout
    #[arg(long, default_value_t = 15)]
    timeout_secs: u64,

    /// Write artifacts without summaries
    #[arg(long)]
    no_summary: bool,

    /// Override settings.summary_language
    #[arg(long)]
    language: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = load_config(&cli.config)
        .with_context(|| format!("failed to load topics from {}", cli.config.display()))?;

    let mut settings = config.settings.clone();
    if let Some(max_articles) = cli.max_articles {
        settings.max_articles_per_topic = max_articles;
    }
    if let Some(language) = &cli.language {
        settings.summary_language = language.clone();
    }

    let topics = config.select(&cli.topics);
    if topics.is_empty() {
        warn!("No topics to run");
        return Ok(());
    }

    let fetch_config = FetchConfig {
        timeout_seconds: cli.timeout_secs,
        ..FetchConfig::default()
    };
    let sources = SourceSet::http(fetch_config).context("failed to build HTTP client")?;
    let aggregator = TopicAggregator::new(sources, settings.aggregator_config());

    let summarizer: Arc<dyn Summarizer> = if cli.no_summary {
        Arc::new(EmptySummarizer)
    } else {
        Arc::new(BaselineSummarizer::new())
    };
    let store = Arc::new(JsonArtifactStore::new(&cli.output_dir));

    let orchestrator = RunOrchestrator::new(aggregator, summarizer, store)
        .with_language(settings.summary_language.clone())
        .with_topic_delay(Duration::from_secs(settings.topic_delay_secs));

    let date = cli.date.unwrap_or_else(|| Utc::now().date_naive());
    info!("Running {} topics for {} into {}", topics.len(), date, cli.output_dir.display());

    let reports = orchestrator.run(&topics, date).await;

    for report in &reports {
        match &report.path {
            Some(path) => info!(
                "  {}: {} articles -> {}{}",
                report.topic_id,
                report.article_count,
                path.display(),
                if report.summarized { " (summarized)" } else { "" }
            ),
            None => error!("  {}: not written ({})", report.topic_id, report.errors.join("; ")),
        }
    }

    let failed = reports.iter().filter(|r| !r.is_written()).count();
    if failed > 0 {
        anyhow::bail!("{} of {} topics could not be written", failed, reports.len());
    }
    Ok(())
}
