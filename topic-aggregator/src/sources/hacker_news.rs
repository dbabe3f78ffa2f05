//! Hacker News adapter over the public Firebase API.
//!
//! The ranked list endpoint returns story ids in popularity order; each
//! story's details come from a separate item request. Item requests run in a
//! bounded pool and every result is written to the slot of its rank, so the
//! output order is the rank order no matter which request finishes first.

use crate::fetcher::Fetcher;
use crate::processing::TitleFilter;
use crate::traits::Source;
use crate::types::{AggregatorError, Article, ArticleDraft, HnEndpoint, PublishedAt, Result, SourceKind, SourceSpec};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const SOURCE_NAME: &str = "Hacker News";

/// Concurrent item requests against the API host.
pub const ITEM_FETCH_CONCURRENCY: usize = 10;

/// Candidates fetched per requested story when title patterns may discard some.
pub const OVERFETCH_FACTOR: usize = 3;

const DISCUSSION_BASE: &str = "https://news.ycombinator.com/item?id=";

/// Item payload as served by `/item/<id>.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HnItem {
    pub id: u64,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub descendants: Option<i64>,
    #[serde(default)]
    pub time: Option<i64>,
    #[serde(default)]
    pub by: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub dead: bool,
    #[serde(default)]
    pub deleted: bool,
}

impl HnItem {
    pub fn is_live_story(&self) -> bool {
        self.kind.as_deref() == Some("story") && !self.dead && !self.deleted
    }

    /// Convert a live story; anything else yields `None`.
    pub fn into_article(self) -> Option<Article> {
        if !self.is_live_story() {
            debug!("Skipping HN item {} ({:?})", self.id, self.kind);
            return None;
        }

        let discussion = discussion_url(self.id);
        // Ask/text posts link to their own discussion page.
        let url = self.url.unwrap_or_else(|| discussion.clone());

        let draft = ArticleDraft {
            id: format!("hn-{}", self.id),
            title: self.title.unwrap_or_default(),
            url: Some(url),
            source: SOURCE_NAME.to_string(),
            score: self.score.unwrap_or(0),
            comments_count: self.descendants.unwrap_or(0),
            comments_url: Some(discussion),
            published_at: self.time.map(PublishedAt::UnixSeconds).unwrap_or(PublishedAt::Missing),
            author: self.by,
            text: self.text,
        };

        match Article::new(draft) {
            Ok(article) => Some(article),
            Err(e) => {
                debug!("Dropping HN item {}: {}", self.id, e);
                None
            }
        }
    }
}

pub fn discussion_url(id: u64) -> String {
    format!("{}{}", DISCUSSION_BASE, id)
}

/// The two endpoints the adapter needs.
#[async_trait]
pub trait HnApi: Send + Sync {
    async fn ranked_ids(&self, endpoint: HnEndpoint) -> Result<Vec<u64>>;

    /// `Ok(None)` when the API answers `null` for the id.
    async fn item(&self, id: u64) -> Result<Option<HnItem>>;
}

/// [`HnApi`] over HTTP.
pub struct HttpHnApi {
    fetcher: Arc<Fetcher>,
    base_url: String,
}

impl HttpHnApi {
    pub fn new(fetcher: Arc<Fetcher>) -> Self {
        let base_url = fetcher.config().hn_api_base.trim_end_matches('/').to_string();
        Self { fetcher, base_url }
    }
}

#[async_trait]
impl HnApi for HttpHnApi {
    async fn ranked_ids(&self, endpoint: HnEndpoint) -> Result<Vec<u64>> {
        let url = format!("{}/{}.json", self.base_url, endpoint.list_name());
        self.fetcher.get_json(&url, &[]).await
    }

    async fn item(&self, id: u64) -> Result<Option<HnItem>> {
        let url = format!("{}/item/{}.json", self.base_url, id);
        self.fetcher.get_json(&url, &[]).await
    }
}

/// Fetch item details for `ids` with at most `concurrency` requests in flight.
///
/// Failed, missing and non-story items are dropped; the rest keep the
/// relative order of `ids`.
pub async fn fetch_ranked_items(api: &dyn HnApi, ids: &[u64], concurrency: usize) -> Vec<Article> {
    let outcomes: Vec<(usize, u64, Result<Option<HnItem>>)> = stream::iter(ids.iter().copied().enumerate())
        .map(|(slot, id)| async move { (slot, id, api.item(id).await) })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut slots: Vec<Option<Article>> = vec![None; ids.len()];
    let mut failed = 0usize;

    for (slot, id, outcome) in outcomes {
        match outcome {
            Ok(Some(item)) => slots[slot] = item.into_article(),
            Ok(None) => debug!("HN item {} does not exist", id),
            Err(e) => {
                failed += 1;
                warn!("Failed to fetch HN story {}: {}", id, e);
            }
        }
    }

    let articles: Vec<Article> = slots.into_iter().flatten().collect();
    debug!("Fetched {}/{} HN items ({} failed)", articles.len(), ids.len(), failed);
    articles
}

pub struct HackerNewsSource {
    api: Arc<dyn HnApi>,
    concurrency: usize,
}

impl HackerNewsSource {
    pub fn new(api: Arc<dyn HnApi>) -> Self {
        Self {
            api,
            concurrency: ITEM_FETCH_CONCURRENCY,
        }
    }

    pub fn http(fetcher: Arc<Fetcher>) -> Self {
        Self::new(Arc::new(HttpHnApi::new(fetcher)))
    }
}

#[async_trait]
impl Source for HackerNewsSource {
    fn source_name(&self, _spec: &SourceSpec) -> String {
        SOURCE_NAME.to_string()
    }

    async fn fetch(&self, spec: &SourceSpec) -> Result<Vec<Article>> {
        let SourceKind::HackerNews { endpoint } = &spec.kind else {
            return Err(AggregatorError::Config(format!(
                "{} spec given to the Hacker News adapter",
                spec.source_type()
            )));
        };

        let count = spec.limit();
        let filter = TitleFilter::for_spec(spec)?;
        let candidates = if spec.has_title_patterns() {
            count.saturating_mul(OVERFETCH_FACTOR)
        } else {
            count
        };

        let mut seen = HashSet::new();
        let ids: Vec<u64> = self
            .api
            .ranked_ids(*endpoint)
            .await?
            .into_iter()
            .filter(|id| seen.insert(*id))
            .take(candidates)
            .collect();

        let stories = fetch_ranked_items(self.api.as_ref(), &ids, self.concurrency).await;

        let mut articles = filter.apply(stories);
        articles.truncate(count);

        info!("Hacker News ({:?}): {} stories from {} candidates", endpoint, articles.len(), ids.len());
        Ok(articles)
    }
}
