use crate::aggregator::TopicAggregator;
use crate::types::{Article, ArtifactStore, Summarizer, SummaryRequest, TopicArtifact, TopicSpec, TopicSummary};
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Outcome of one topic in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicReport {
    pub topic_id: String,
    pub article_count: usize,
    pub path: Option<PathBuf>,
    pub summarized: bool,
    pub errors: Vec<String>,
}

impl TopicReport {
    pub fn is_written(&self) -> bool {
        self.path.is_some()
    }
}

/// Drives aggregate, summarize and persist for each topic in turn.
pub struct RunOrchestrator {
    aggregator: TopicAggregator,
    summarizer: Arc<dyn Summarizer>,
    store: Arc<dyn ArtifactStore>,
    language: String,
    topic_delay: Duration,
}

impl RunOrchestrator {
    pub fn new(aggregator: TopicAggregator, summarizer: Arc<dyn Summarizer>, store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            aggregator,
            summarizer,
            store,
            language: "zh".to_string(),
            topic_delay: Duration::from_secs(3),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_topic_delay(mut self, delay: Duration) -> Self {
        self.topic_delay = delay;
        self
    }

    /// Process every topic. Always yields one report per topic.
    pub async fn run(&self, topics: &[TopicSpec], date: NaiveDate) -> Vec<TopicReport> {
        info!("Starting run for {} with {} topics", date, topics.len());

        let mut reports = Vec::with_capacity(topics.len());
        for (index, topic) in topics.iter().enumerate() {
            if index > 0 && !self.topic_delay.is_zero() {
                tokio::time::sleep(self.topic_delay).await;
            }
            reports.push(self.run_topic(topic, date).await);
        }

        let written = reports.iter().filter(|r| r.is_written()).count();
        info!("Run for {} finished: {}/{} topics written", date, written, reports.len());
        reports
    }

    pub async fn run_topic(&self, topic: &TopicSpec, date: NaiveDate) -> TopicReport {
        let crawled_at = Utc::now();
        let result = self.aggregator.aggregate(topic).await;
        let mut errors = Vec::new();

        let summary = match self.summarize(topic, result.articles()).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!("Summarizer {} failed for topic {}: {:#}", self.summarizer.name(), topic.id, e);
                errors.push(format!("summarize: {:#}", e));
                TopicSummary::default()
            }
        };
        let summarized = summary.summary.is_some();

        let articles = attach_summaries(result.into_articles(), summary.article_summaries);
        let artifact = TopicArtifact {
            topic_id: topic.id.clone(),
            topic_name: topic.name.clone(),
            description: topic.description.clone(),
            date,
            crawled_at,
            article_count: articles.len(),
            articles,
            summary: summary.summary,
            summary_language: summarized.then(|| self.language.clone()),
        };

        let path = match self.store.write(&artifact).await {
            Ok(path) => {
                info!("Saved topic {} ({} articles) to {}", topic.id, artifact.article_count, path.display());
                Some(path)
            }
            Err(e) => {
                warn!("Failed to save topic {}: {:#}", topic.id, e);
                errors.push(format!("write: {:#}", e));
                None
            }
        };

        TopicReport {
            topic_id: topic.id.clone(),
            article_count: artifact.article_count,
            path,
            summarized,
            errors,
        }
    }

    async fn summarize(&self, topic: &TopicSpec, articles: &[Article]) -> anyhow::Result<TopicSummary> {
        if articles.is_empty() {
            return Ok(TopicSummary::default());
        }
        self.summarizer
            .summarize(SummaryRequest {
                topic_id: &topic.id,
                topic_name: &topic.name,
                language: &self.language,
                articles,
            })
            .await
    }
}

fn attach_summaries(articles: Vec<Article>, mut summaries: HashMap<String, String>) -> Vec<Article> {
    articles
        .into_iter()
        .map(|article| match summaries.remove(article.id()) {
            Some(summary) => article.with_summary(summary),
            None => article,
        })
        .collect()
}
