pub mod types;
pub mod traits;
pub mod fetcher;
pub mod parser;
pub mod processing;
pub mod sources;
pub mod aggregator;
pub mod config;
pub mod pipeline;

pub use types::*;
pub use traits::Source;
pub use fetcher::Fetcher;
pub use parser::{FeedParser, ParsedFeed};
pub use processing::{filter_articles, TitleFilter};
pub use sources::{HackerNewsSource, HnApi, HnItem, HttpHnApi, RedditSource, RssFeedSource, SourceSet};
pub use aggregator::TopicAggregator;
pub use config::{load_config, parse_config, AppConfig, Settings};
pub use pipeline::{RunOrchestrator, TopicReport};
