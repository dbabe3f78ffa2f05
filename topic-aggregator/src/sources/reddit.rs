use crate::fetcher::Fetcher;
use crate::processing::TitleFilter;
use crate::traits::Source;
use crate::types::{AggregatorError, Article, ArticleDraft, PublishedAt, RedditSort, Result, SourceKind, SourceSpec};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

const WEB_BASE: &str = "https://www.reddit.com";

/// Upper bound the listing endpoint accepts for `limit`.
const MAX_LISTING_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    is_self: bool,
    #[serde(default)]
    permalink: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    num_comments: i64,
    #[serde(default)]
    created_utc: Option<f64>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    selftext: Option<String>,
}

impl Post {
    fn into_article(self, source: &str) -> Option<Article> {
        let permalink_url = format!("{}{}", WEB_BASE, self.permalink);
        let (url, text) = if self.is_self {
            (Some(permalink_url.clone()), self.selftext)
        } else {
            (self.url, None)
        };

        let draft = ArticleDraft {
            id: format!("reddit-{}", self.id),
            title: self.title,
            url,
            source: source.to_string(),
            score: self.score,
            comments_count: self.num_comments,
            comments_url: Some(permalink_url),
            published_at: self
                .created_utc
                .map(|ts| PublishedAt::UnixSeconds(ts as i64))
                .unwrap_or(PublishedAt::Missing),
            author: self.author,
            text,
        };

        match Article::new(draft) {
            Ok(article) => Some(article),
            Err(e) => {
                debug!("Dropping Reddit post: {}", e);
                None
            }
        }
    }
}

/// Strip an optional `r/` prefix and surrounding whitespace.
fn subreddit_name(raw: &str) -> &str {
    raw.trim().trim_start_matches("r/")
}

/// Single-page subreddit listing adapter using the public JSON endpoint.
pub struct RedditSource {
    fetcher: Arc<Fetcher>,
    base_url: String,
}

impl RedditSource {
    pub fn new(fetcher: Arc<Fetcher>) -> Self {
        let base_url = fetcher.config().reddit_api_base.trim_end_matches('/').to_string();
        Self { fetcher, base_url }
    }

    fn parse_listing(listing: Listing, source: &str) -> Vec<Article> {
        let mut seen = HashSet::new();
        listing
            .data
            .children
            .into_iter()
            .filter_map(|child| child.data.into_article(source))
            .filter(|article| seen.insert(article.id().to_string()))
            .collect()
    }
}

#[async_trait]
impl Source for RedditSource {
    fn source_name(&self, spec: &SourceSpec) -> String {
        match &spec.kind {
            SourceKind::Reddit { subreddit, .. } => format!("r/{}", subreddit_name(subreddit)),
            _ => "Reddit".to_string(),
        }
    }

    async fn fetch(&self, spec: &SourceSpec) -> Result<Vec<Article>> {
        let SourceKind::Reddit { subreddit, sort, time } = &spec.kind else {
            return Err(AggregatorError::Config(format!(
                "{} spec given to the Reddit adapter",
                spec.source_type()
            )));
        };
        spec.validate()?;

        let count = spec.limit();
        let filter = TitleFilter::for_spec(spec)?;
        let limit = if spec.has_title_patterns() {
            count.saturating_mul(3)
        } else {
            count
        }
        .min(MAX_LISTING_LIMIT);

        let name = subreddit_name(subreddit);
        let url = format!("{}/r/{}/{}.json", self.base_url, name, sort.as_str());
        let mut query = vec![("limit", limit.to_string()), ("raw_json", "1".to_string())];
        if *sort == RedditSort::Top {
            query.push(("t", time.clone()));
        }

        let listing: Listing = self.fetcher.get_json(&url, &query).await?;
        let source = self.source_name(spec);

        let mut articles = filter.apply(Self::parse_listing(listing, &source));
        articles.truncate(count);

        info!("{}: {} posts", source, articles.len());
        Ok(articles)
    }
}
