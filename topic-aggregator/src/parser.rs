use crate::types::{AggregatorError, Article, ArticleDraft, PublishedAt, Result};
use chrono::{DateTime, Utc};
use feed_rs::model::Entry;
use feed_rs::parser;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use tracing::{debug, info};

const UNTITLED: &str = "Untitled";

#[derive(Debug)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub source_name: String,
    pub articles: Vec<Article>,
}

/// RSS/Atom document parser producing normalized articles.
pub struct FeedParser {
    fetched_at: DateTime<Utc>,
}

impl FeedParser {
    /// `fetched_at` is the publication time given to entries that carry no date at all.
    pub fn new(fetched_at: DateTime<Utc>) -> Self {
        Self { fetched_at }
    }

    pub fn parse_feed(&self, content: &[u8], feed_url: &str, display_name: Option<&str>) -> Result<ParsedFeed> {
        debug!("Parsing feed content ({} bytes)", content.len());

        let feed = parser::Builder::new()
            .timestamp_parser(parse_feed_timestamp)
            .build()
            .parse(content)
            .map_err(|e| AggregatorError::Parse(format!("Failed to parse feed {}: {}", feed_url, e)))?;

        let title = feed
            .title
            .map(|t| t.content.trim().to_string())
            .filter(|t| !t.is_empty());

        let source_name = display_name
            .map(str::to_string)
            .or_else(|| title.clone())
            .unwrap_or_else(|| feed_url.to_string());

        let mut seen_ids = HashSet::new();
        let mut articles = Vec::with_capacity(feed.entries.len());

        for entry in feed.entries {
            let Some(article) = self.parse_entry(entry, &source_name) else {
                continue;
            };
            if !seen_ids.insert(article.id().to_string()) {
                debug!("Skipping duplicate entry with id: {}", article.id());
                continue;
            }
            articles.push(article);
        }

        info!("Parsed feed {} with {} entries", source_name, articles.len());

        Ok(ParsedFeed {
            title,
            source_name,
            articles,
        })
    }

    fn parse_entry(&self, entry: Entry, source_name: &str) -> Option<Article> {
        let title = entry
            .title
            .map(|t| t.content)
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| UNTITLED.to_string());

        let link = entry.links.first().map(|l| l.href.clone());

        // feed-rs derives an id from link and title when the entry has no guid.
        let id = entry_id(&entry.id);

        let published_at = match entry.published.or(entry.updated) {
            Some(dt) => dt,
            None => {
                debug!("Entry {} has no usable date, using fetch time", id);
                self.fetched_at
            }
        };

        let author = entry.authors.first().map(|a| a.name.clone());

        let text = entry
            .summary
            .map(|s| s.content)
            .filter(|s| !s.trim().is_empty())
            .or_else(|| entry.content.and_then(|c| c.body));

        let draft = ArticleDraft {
            id,
            title,
            url: link,
            source: source_name.to_string(),
            score: 0,
            comments_count: 0,
            comments_url: None,
            published_at: PublishedAt::Utc(published_at),
            author,
            text,
        };

        match Article::new(draft) {
            Ok(article) => Some(article),
            Err(e) => {
                debug!("Dropping feed entry: {}", e);
                None
            }
        }
    }
}

/// Namespaced article id: `rss-` plus the first 12 hex digits of SHA-256 over the guid.
pub fn entry_id(guid: &str) -> String {
    let digest = Sha256::digest(guid.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    format!("rss-{}", &hex[..12])
}

// Feed dates without an offset are read as UTC.
fn parse_feed_timestamp(text: &str) -> Option<DateTime<Utc>> {
    interfaces::defs::parse_timestamp(text)
}
