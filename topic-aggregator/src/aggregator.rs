use crate::processing::TitleFilter;
use crate::sources::SourceSet;
use crate::types::{AggregatorConfig, Article, SourceSpec, TopicResult, TopicSpec};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Merges the configured sources of one topic into a capped, deduplicated list.
pub struct TopicAggregator {
    sources: SourceSet,
    config: AggregatorConfig,
}

impl TopicAggregator {
    pub fn new(sources: SourceSet, config: AggregatorConfig) -> Self {
        Self { sources, config }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Never fails: a source that errors contributes nothing.
    pub async fn aggregate(&self, topic: &TopicSpec) -> TopicResult {
        info!("Aggregating topic {} ({} sources)", topic.id, topic.sources.len());

        let mut merged = Vec::new();
        let mut succeeded = 0usize;

        for spec in &topic.sources {
            if let Some(articles) = self.collect_source(&topic.id, spec).await {
                succeeded += 1;
                merged.extend(articles);
            }
        }

        let articles = merge(merged, self.config.max_articles_per_topic);

        info!(
            "Topic {}: {} articles from {}/{} sources",
            topic.id,
            articles.len(),
            succeeded,
            topic.sources.len()
        );
        TopicResult::new(topic.id.clone(), articles)
    }

    async fn collect_source(&self, topic_id: &str, spec: &SourceSpec) -> Option<Vec<Article>> {
        let source = self.sources.adapter(spec.source_type());
        let name = source.source_name(spec);

        let filter = match spec.validate().and_then(|_| TitleFilter::for_spec(spec)) {
            Ok(filter) => filter,
            Err(e) => {
                warn!("Skipping misconfigured source {} in topic {}: {}", name, topic_id, e);
                return None;
            }
        };

        let fetched = match source.fetch(spec).await {
            Ok(articles) => articles,
            Err(e) if e.is_config() => {
                warn!("Skipping misconfigured source {} in topic {}: {}", name, topic_id, e);
                return None;
            }
            Err(e) => {
                warn!("Source {} failed for topic {}: {}", name, topic_id, e);
                return None;
            }
        };

        let mut articles = filter.apply(fetched);
        articles.truncate(spec.limit());

        // Feeds name themselves only once fetched.
        let name = articles.first().map_or(name, |a| a.source().to_string());
        info!("{} contributed {} articles to {}", name, articles.len(), topic_id);
        Some(articles)
    }
}

/// Drop repeated ids (first occurrence wins) and cap the list at `max_articles`.
pub fn merge(articles: Vec<Article>, max_articles: usize) -> Vec<Article> {
    let mut seen = HashSet::new();
    let mut merged: Vec<Article> = articles
        .into_iter()
        .filter(|article| {
            let fresh = seen.insert(article.id().to_string());
            if !fresh {
                debug!("Dropping duplicate article {}", article.id());
            }
            fresh
        })
        .collect();

    merged.truncate(max_articles);
    merged
}
