pub mod hacker_news;
pub mod reddit;
pub mod rss_feed;

pub use hacker_news::{HackerNewsSource, HnApi, HnItem, HttpHnApi};
pub use reddit::RedditSource;
pub use rss_feed::RssFeedSource;

use crate::fetcher::Fetcher;
use crate::traits::Source;
use crate::types::{FetchConfig, Result, SourceType};
use std::sync::Arc;

/// One adapter per [`SourceType`].
///
/// Adding a source type means adding a variant and a field here; dispatch
/// is the single exhaustive match in [`SourceSet::adapter`].
#[derive(Clone)]
pub struct SourceSet {
    hacker_news: Arc<dyn Source>,
    reddit: Arc<dyn Source>,
    rss: Arc<dyn Source>,
}

impl SourceSet {
    pub fn new(hacker_news: Arc<dyn Source>, reddit: Arc<dyn Source>, rss: Arc<dyn Source>) -> Self {
        Self {
            hacker_news,
            reddit,
            rss,
        }
    }

    /// HTTP-backed adapters sharing one client.
    pub fn http(config: FetchConfig) -> Result<Self> {
        let fetcher = Arc::new(Fetcher::new(config)?);
        Ok(Self::new(
            Arc::new(HackerNewsSource::http(fetcher.clone())),
            Arc::new(RedditSource::new(fetcher.clone())),
            Arc::new(RssFeedSource::new(fetcher)),
        ))
    }

    pub fn with_hacker_news(mut self, source: Arc<dyn Source>) -> Self {
        self.hacker_news = source;
        self
    }

    pub fn with_reddit(mut self, source: Arc<dyn Source>) -> Self {
        self.reddit = source;
        self
    }

    pub fn with_rss(mut self, source: Arc<dyn Source>) -> Self {
        self.rss = source;
        self
    }

    pub fn adapter(&self, source_type: SourceType) -> &dyn Source {
        match source_type {
            SourceType::HackerNews => self.hacker_news.as_ref(),
            SourceType::Reddit => self.reddit.as_ref(),
            SourceType::Rss => self.rss.as_ref(),
        }
    }
}
