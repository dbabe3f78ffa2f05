use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author recorded when a source does not name one.
pub const UNKNOWN_AUTHOR: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("article id is empty")]
    EmptyId,

    #[error("article {id} has an empty title")]
    EmptyTitle { id: String },

    #[error("article {id} has an unresolvable timestamp: {value}")]
    InvalidTimestamp { id: String, value: String },
}

/// Raw publication time as a source reports it.
#[derive(Debug, Clone, PartialEq)]
pub enum PublishedAt {
    Utc(DateTime<Utc>),
    UnixSeconds(i64),
    Text(String),
    Missing,
}

impl PublishedAt {
    fn resolve(&self, id: &str) -> Result<DateTime<Utc>, ValidationError> {
        let invalid = |value: String| ValidationError::InvalidTimestamp {
            id: id.to_owned(),
            value,
        };
        match self {
            PublishedAt::Utc(dt) => Ok(*dt),
            PublishedAt::UnixSeconds(secs) => {
                DateTime::from_timestamp(*secs, 0).ok_or_else(|| invalid(secs.to_string()))
            }
            PublishedAt::Text(text) => parse_timestamp(text).ok_or_else(|| invalid(text.clone())),
            PublishedAt::Missing => Err(invalid("<missing>".to_owned())),
        }
    }
}

// Offsets without a colon, e.g. `+0000`.
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

// RFC 2822 parsing rejects a trailing `UTC`/`UT` zone name.
fn utc_suffix_as_offset(text: &str) -> String {
    match text.strip_suffix(" UTC").or_else(|| text.strip_suffix(" UT")) {
        Some(rest) => format!("{} +0000", rest),
        None => text.to_owned(),
    }
}

// Formats without an offset. Values in these formats are read as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%a, %d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
];

/// Parse a timestamp string into UTC.
///
/// Accepts RFC 3339 and RFC 2822 with any offset, plus common offset-less
/// layouts and bare dates. Offset-less values are taken to be UTC; this
/// loses the publisher's local time but gives the same instant on every run.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(&utc_suffix_as_offset(text)) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Unvalidated article fields as an adapter extracts them.
#[derive(Debug, Clone)]
pub struct ArticleDraft {
    pub id: String,
    pub title: String,
    pub url: Option<String>,
    pub source: String,
    pub score: i64,
    pub comments_count: i64,
    pub comments_url: Option<String>,
    pub published_at: PublishedAt,
    pub author: Option<String>,
    pub text: Option<String>,
}

/// A news item normalized from any source.
///
/// Construction goes through [`Article::new`], which guarantees a non-empty
/// id and title, non-negative counters and a UTC publication instant. The
/// only field that changes after construction is `summary`, through
/// [`Article::with_summary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ArticleRecord")]
pub struct Article {
    id: String,
    title: String,
    url: Option<String>,
    source: String,
    score: u64,
    comments_count: u64,
    comments_url: Option<String>,
    published_at: DateTime<Utc>,
    author: String,
    text: Option<String>,
    summary: Option<String>,
}

impl Article {
    pub fn new(draft: ArticleDraft) -> Result<Self, ValidationError> {
        let id = draft.id.trim().to_owned();
        if id.is_empty() {
            return Err(ValidationError::EmptyId);
        }

        let title = draft.title.trim().to_owned();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle { id });
        }

        let published_at = draft.published_at.resolve(&id)?;

        let author = draft
            .author
            .map(|a| a.trim().to_owned())
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_owned());

        Ok(Self {
            id,
            title,
            url: non_empty(draft.url),
            source: draft.source,
            score: draft.score.max(0) as u64,
            comments_count: draft.comments_count.max(0) as u64,
            comments_url: non_empty(draft.comments_url),
            published_at,
            author,
            text: non_empty(draft.text),
            summary: None,
        })
    }

    pub fn with_summary(mut self, summary: String) -> Self {
        self.summary = Some(summary);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn comments_count(&self) -> u64 {
        self.comments_count
    }

    pub fn comments_url(&self) -> Option<&str> {
        self.comments_url.as_deref()
    }

    pub fn published_at(&self) -> DateTime<Utc> {
        self.published_at
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// Wire shape of a persisted article. Reading goes back through validation.
#[derive(Deserialize)]
struct ArticleRecord {
    id: String,
    title: String,
    #[serde(default)]
    url: Option<String>,
    source: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    comments_count: i64,
    #[serde(default)]
    comments_url: Option<String>,
    published_at: String,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    summary: Option<String>,
}

impl TryFrom<ArticleRecord> for Article {
    type Error = ValidationError;

    fn try_from(record: ArticleRecord) -> Result<Self, Self::Error> {
        let article = Article::new(ArticleDraft {
            id: record.id,
            title: record.title,
            url: record.url,
            source: record.source,
            score: record.score,
            comments_count: record.comments_count,
            comments_url: record.comments_url,
            published_at: PublishedAt::Text(record.published_at),
            author: record.author,
            text: record.text,
        })?;

        Ok(match record.summary {
            Some(summary) => article.with_summary(summary),
            None => article,
        })
    }
}

/// Aggregated articles for one topic in one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicResult {
    topic_id: String,
    articles: Vec<Article>,
    article_count: usize,
}

impl TopicResult {
    pub fn new(topic_id: impl Into<String>, articles: Vec<Article>) -> Self {
        let article_count = articles.len();
        Self {
            topic_id: topic_id.into(),
            articles,
            article_count,
        }
    }

    pub fn topic_id(&self) -> &str {
        &self.topic_id
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn article_count(&self) -> usize {
        self.article_count
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn into_articles(self) -> Vec<Article> {
        self.articles
    }
}

/// Document persisted per topic per day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicArtifact {
    pub topic_id: String,
    pub topic_name: String,
    #[serde(default)]
    pub description: String,
    pub date: NaiveDate,
    pub crawled_at: DateTime<Utc>,
    pub article_count: usize,
    pub articles: Vec<Article>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub summary_language: Option<String>,
}

/// What a summarizer sees for one topic.
#[derive(Debug, Clone, Copy)]
pub struct SummaryRequest<'a> {
    pub topic_id: &'a str,
    pub topic_name: &'a str,
    pub language: &'a str,
    pub articles: &'a [Article],
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopicSummary {
    pub summary: Option<String>,
    /// Per-article summaries keyed by article id.
    pub article_summaries: HashMap<String, String>,
}

/// Produces free-text summaries for a topic's articles.
#[async_trait]
pub trait Summarizer: Send + Sync {
    fn name(&self) -> &str;

    async fn summarize(&self, request: SummaryRequest<'_>) -> anyhow::Result<TopicSummary>;
}

/// Persists and reloads topic artifacts keyed by run date and topic id.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn write(&self, artifact: &TopicArtifact) -> anyhow::Result<PathBuf>;

    async fn read(&self, date: NaiveDate, topic_id: &str) -> anyhow::Result<TopicArtifact>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn draft(id: &str, title: &str) -> ArticleDraft {
        ArticleDraft {
            id: id.to_owned(),
            title: title.to_owned(),
            url: Some("https://example.com/a".to_owned()),
            source: "Example".to_owned(),
            score: 10,
            comments_count: 2,
            comments_url: None,
            published_at: PublishedAt::UnixSeconds(1_700_000_000),
            author: None,
            text: None,
        }
    }

    #[test]
    fn empty_title_is_rejected() {
        let err = Article::new(draft("hn-1", "   ")).unwrap_err();
        assert_eq!(err, ValidationError::EmptyTitle { id: "hn-1".to_owned() });
    }

    #[test]
    fn empty_id_is_rejected() {
        assert_eq!(Article::new(draft("", "Title")).unwrap_err(), ValidationError::EmptyId);
    }

    #[test]
    fn negative_counters_are_clamped() {
        let mut d = draft("reddit-x", "Downvoted");
        d.score = -12;
        d.comments_count = -1;
        let article = Article::new(d).unwrap();
        assert_eq!(article.score(), 0);
        assert_eq!(article.comments_count(), 0);
    }

    #[test]
    fn missing_author_becomes_unknown() {
        let mut d = draft("rss-1", "Post");
        d.author = Some("  ".to_owned());
        assert_eq!(Article::new(d).unwrap().author(), UNKNOWN_AUTHOR);
    }

    #[test]
    fn missing_timestamp_is_rejected() {
        let mut d = draft("hn-2", "No time");
        d.published_at = PublishedAt::Missing;
        assert!(matches!(
            Article::new(d),
            Err(ValidationError::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn naive_timestamps_are_read_as_utc() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-01T10:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01 10:00:00"), Some(expected));
        assert_eq!(parse_timestamp("Fri, 01 Mar 2024 10:00:00"), Some(expected));
    }

    #[test]
    fn offsets_are_normalized() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-01T10:00:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("Fri, 01 Mar 2024 08:00:00 GMT"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T08:00:00+0000"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T10:00:00.250+0200"), Some(expected + chrono::Duration::milliseconds(250)));
        assert_eq!(parse_timestamp("Fri, 01 Mar 2024 08:00:00 UTC"), Some(expected));
        assert_eq!(parse_timestamp("Fri, 01 Mar 2024 08:00:00 UT"), Some(expected));
        assert_eq!(parse_timestamp("not a date"), None);
    }

    #[test]
    fn persisted_article_is_revalidated() {
        let json = r#"{"id":"rss-1","title":"","source":"Feed","published_at":"2024-03-01"}"#;
        assert!(serde_json::from_str::<Article>(json).is_err());

        let json = r#"{"id":"rss-1","title":"Hi","source":"Feed","published_at":"2024-03-01","summary":"s"}"#;
        let article: Article = serde_json::from_str(json).unwrap();
        assert_eq!(article.summary(), Some("s"));
        assert_eq!(article.author(), UNKNOWN_AUTHOR);
    }

    #[test]
    fn topic_result_counts_articles() {
        let articles = vec![
            Article::new(draft("a", "A")).unwrap(),
            Article::new(draft("b", "B")).unwrap(),
        ];
        let result = TopicResult::new("tech", articles);
        assert_eq!(result.article_count(), 2);
        assert_eq!(result.topic_id(), "tech");
    }
}
