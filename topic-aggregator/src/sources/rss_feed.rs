use crate::fetcher::Fetcher;
use crate::parser::FeedParser;
use crate::processing::TitleFilter;
use crate::traits::Source;
use crate::types::{AggregatorError, Article, Result, SourceKind, SourceSpec};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

/// Generic RSS/Atom feed adapter.
pub struct RssFeedSource {
    fetcher: Arc<Fetcher>,
}

impl RssFeedSource {
    pub fn new(fetcher: Arc<Fetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl Source for RssFeedSource {
    /// Configured display name, else the feed URL. Articles fall back to the
    /// feed's own title instead, which is only known after fetching.
    fn source_name(&self, spec: &SourceSpec) -> String {
        match &spec.kind {
            SourceKind::Rss {
                display_name: Some(name),
                ..
            } => name.clone(),
            SourceKind::Rss { feed_url, .. } => feed_url.clone(),
            _ => "RSS Feed".to_string(),
        }
    }

    async fn fetch(&self, spec: &SourceSpec) -> Result<Vec<Article>> {
        let SourceKind::Rss { feed_url, display_name } = &spec.kind else {
            return Err(AggregatorError::Config(format!(
                "{} spec given to the RSS adapter",
                spec.source_type()
            )));
        };
        spec.validate()?;

        let filter = TitleFilter::for_spec(spec)?;
        let fetched_at = Utc::now();
        let content = self.fetcher.get_text(feed_url).await?;

        let parsed = FeedParser::new(fetched_at).parse_feed(content.as_bytes(), feed_url, display_name.as_deref())?;

        let mut articles = filter.apply(parsed.articles);
        articles.truncate(spec.limit());

        info!("{}: {} entries from {}", parsed.source_name, articles.len(), feed_url);
        Ok(articles)
    }
}
