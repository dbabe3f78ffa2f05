use serde::Deserialize;

// Shared data model and collaborator contracts live in the interfaces crate.
pub use interfaces::defs::{Article, ArticleDraft, PublishedAt, TopicResult, ValidationError};
pub use interfaces::defs::{ArtifactStore, Summarizer, SummaryRequest, TopicArtifact, TopicSummary};

pub const DEFAULT_HN_COUNT: usize = 30;
pub const DEFAULT_REDDIT_COUNT: usize = 25;
pub const DEFAULT_RSS_COUNT: usize = 20;

/// Closed set of source adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceType {
    HackerNews,
    Reddit,
    Rss,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::HackerNews => "hn",
            SourceType::Reddit => "reddit",
            SourceType::Rss => "rss",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HnEndpoint {
    #[default]
    Top,
    New,
    Best,
}

impl HnEndpoint {
    pub fn list_name(&self) -> &'static str {
        match self {
            HnEndpoint::Top => "topstories",
            HnEndpoint::New => "newstories",
            HnEndpoint::Best => "beststories",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedditSort {
    #[default]
    Hot,
    New,
    Top,
    Rising,
}

impl RedditSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedditSort::Hot => "hot",
            RedditSort::New => "new",
            RedditSort::Top => "top",
            RedditSort::Rising => "rising",
        }
    }
}

fn default_reddit_time() -> String {
    "day".to_string()
}

/// Type-specific part of a [`SourceSpec`], tagged by the `type` key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceKind {
    #[serde(rename = "hn", alias = "hackernews")]
    HackerNews {
        #[serde(default)]
        endpoint: HnEndpoint,
    },
    Reddit {
        subreddit: String,
        #[serde(default)]
        sort: RedditSort,
        #[serde(default = "default_reddit_time")]
        time: String,
    },
    Rss {
        #[serde(alias = "url")]
        feed_url: String,
        #[serde(default, alias = "name")]
        display_name: Option<String>,
    },
}

/// One configured fetch unit inside a topic.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceSpec {
    #[serde(flatten)]
    pub kind: SourceKind,
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default)]
    pub exclude: Option<String>,
}

impl SourceSpec {
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            count: None,
            filter: None,
            exclude: None,
        }
    }

    pub fn hacker_news() -> Self {
        Self::new(SourceKind::HackerNews {
            endpoint: HnEndpoint::default(),
        })
    }

    pub fn reddit(subreddit: impl Into<String>) -> Self {
        Self::new(SourceKind::Reddit {
            subreddit: subreddit.into(),
            sort: RedditSort::default(),
            time: default_reddit_time(),
        })
    }

    pub fn rss(feed_url: impl Into<String>) -> Self {
        Self::new(SourceKind::Rss {
            feed_url: feed_url.into(),
            display_name: None,
        })
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_filter(mut self, pattern: impl Into<String>) -> Self {
        self.filter = Some(pattern.into());
        self
    }

    pub fn with_exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude = Some(pattern.into());
        self
    }

    pub fn source_type(&self) -> SourceType {
        match self.kind {
            SourceKind::HackerNews { .. } => SourceType::HackerNews,
            SourceKind::Reddit { .. } => SourceType::Reddit,
            SourceKind::Rss { .. } => SourceType::Rss,
        }
    }

    /// Number of articles this source may contribute.
    pub fn limit(&self) -> usize {
        self.count.unwrap_or(match self.source_type() {
            SourceType::HackerNews => DEFAULT_HN_COUNT,
            SourceType::Reddit => DEFAULT_REDDIT_COUNT,
            SourceType::Rss => DEFAULT_RSS_COUNT,
        })
    }

    pub fn has_title_patterns(&self) -> bool {
        self.filter.is_some() || self.exclude.is_some()
    }

    /// Check the fields the config format cannot express as types.
    pub fn validate(&self) -> Result<()> {
        match &self.kind {
            SourceKind::HackerNews { .. } => {}
            SourceKind::Reddit { subreddit, .. } => {
                let name = subreddit.trim().trim_start_matches("r/");
                if name.is_empty() || name.contains('/') {
                    return Err(AggregatorError::Config(format!(
                        "invalid subreddit name: {:?}",
                        subreddit
                    )));
                }
            }
            SourceKind::Rss { feed_url, .. } => {
                let parsed = url::Url::parse(feed_url)?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(AggregatorError::Config(format!(
                        "feed url must be http(s): {}",
                        feed_url
                    )));
                }
            }
        }
        Ok(())
    }
}

/// A topic and its ordered sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSpec {
    pub id: String,
    pub name: String,
    pub description: String,
    pub sources: Vec<SourceSpec>,
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_feed_size_mb: usize,
    pub max_redirects: usize,
    pub hn_api_base: String,
    pub reddit_api_base: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "rust:topic-aggregator:v0.1 (daily digest crawler)".to_string(),
            timeout_seconds: 15,
            max_feed_size_mb: 10,
            max_redirects: 5,
            hn_api_base: "https://hacker-news.firebaseio.com/v0".to_string(),
            reddit_api_base: "https://old.reddit.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorConfig {
    pub max_articles_per_topic: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            max_articles_per_topic: 30,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid title pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Feed size {size_bytes} bytes exceeds the {limit_mb}MB limit")]
    FeedTooLarge { size_bytes: u64, limit_mb: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl AggregatorError {
    /// Whether this failure comes from configuration rather than I/O.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            AggregatorError::Config(_)
                | AggregatorError::InvalidPattern(_)
                | AggregatorError::InvalidUrl(_)
                | AggregatorError::Yaml(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
