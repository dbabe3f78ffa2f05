use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use topic_aggregator::sources::hacker_news::{discussion_url, fetch_ranked_items, ITEM_FETCH_CONCURRENCY};
use topic_aggregator::{
    AggregatorError, HackerNewsSource, HnApi, HnEndpoint, HnItem, Result, Source, SourceKind, SourceSpec,
};
use tracing::info;

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .try_init()
            .ok();
    });
}

fn story(id: u64, title: &str) -> HnItem {
    HnItem {
        id,
        kind: Some("story".to_string()),
        title: Some(title.to_string()),
        url: Some(format!("https://example.com/{}", id)),
        score: Some(100 + id as i64),
        descendants: Some(id as i64),
        time: Some(1_700_000_000 + id as i64),
        by: Some("pg".to_string()),
        ..Default::default()
    }
}

/// In-memory API with per-item latency and forced failures.
#[derive(Default)]
struct StubHnApi {
    ranked: Vec<u64>,
    items: HashMap<u64, HnItem>,
    failing: HashSet<u64>,
    latency_ms: HashMap<u64, u64>,
    fail_ranked: bool,
    requested: Mutex<Vec<u64>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl StubHnApi {
    fn with_stories(stories: Vec<HnItem>) -> Self {
        Self {
            ranked: stories.iter().map(|s| s.id).collect(),
            items: stories.into_iter().map(|s| (s.id, s)).collect(),
            ..Default::default()
        }
    }

    fn requested(&self) -> Vec<u64> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl HnApi for StubHnApi {
    async fn ranked_ids(&self, _endpoint: HnEndpoint) -> Result<Vec<u64>> {
        if self.fail_ranked {
            return Err(AggregatorError::Status {
                status: 503,
                url: "topstories".to_string(),
            });
        }
        Ok(self.ranked.clone())
    }

    async fn item(&self, id: u64) -> Result<Option<HnItem>> {
        self.requested.lock().unwrap().push(id);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(ms) = self.latency_ms.get(&id) {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(&id) {
            return Err(AggregatorError::Parse(format!("item {} timed out", id)));
        }
        Ok(self.items.get(&id).cloned())
    }
}

fn ids(articles: &[topic_aggregator::Article]) -> Vec<&str> {
    articles.iter().map(|a| a.id()).collect()
}

#[tokio::test]
async fn output_follows_rank_order_despite_latency() {
    init_tracing();

    let mut api = StubHnApi::with_stories((1..=10).map(|id| story(id, &format!("Story {}", id))).collect());
    // Earlier ranks answer last.
    api.latency_ms = (1..=10).map(|id| (id, (11 - id) * 15)).collect();

    let source = HackerNewsSource::new(Arc::new(api));
    let articles = source.fetch(&SourceSpec::hacker_news().with_count(10)).await.unwrap();

    let expected: Vec<String> = (1..=10).map(|id| format!("hn-{}", id)).collect();
    assert_eq!(ids(&articles), expected);
    info!("Rank order preserved for {} stories", articles.len());
}

#[tokio::test]
async fn failed_items_are_dropped_without_failing_the_source() {
    init_tracing();

    let mut api = StubHnApi::with_stories((1..=10).map(|id| story(id, "Story")).collect());
    api.failing = [3, 6, 9].into_iter().collect();
    api.latency_ms = (1..=10).map(|id| (id, (id * 7) % 20)).collect();

    let articles = fetch_ranked_items(&api, &api.ranked.clone(), ITEM_FETCH_CONCURRENCY).await;

    assert_eq!(articles.len(), 7);
    assert_eq!(
        ids(&articles),
        vec!["hn-1", "hn-2", "hn-4", "hn-5", "hn-7", "hn-8", "hn-10"]
    );
}

#[tokio::test]
async fn item_requests_are_bounded_by_the_pool_size() {
    let mut api = StubHnApi::with_stories((1..=30).map(|id| story(id, "Story")).collect());
    api.latency_ms = (1..=30).map(|id| (id, 20)).collect();
    let api = Arc::new(api);

    let source = HackerNewsSource::new(api.clone());
    let articles = source.fetch(&SourceSpec::hacker_news().with_count(30)).await.unwrap();

    assert_eq!(articles.len(), 30);
    let peak = api.max_in_flight.load(Ordering::SeqCst);
    assert!(peak <= ITEM_FETCH_CONCURRENCY, "peak concurrency {}", peak);
    assert!(peak > 1, "item requests ran sequentially");
}

#[tokio::test]
async fn title_patterns_widen_the_candidate_window() {
    init_tracing();

    let titles = [
        "Show HN: a parser",
        "Rust 1.80 released",
        "Ask HN: hiring?",
        "Go generics",
        "Writing a kernel in Rust",
        "Databases",
        "Rust GUI roundup",
        "Rust compiler internals",
        "More Rust",
    ];
    let api = Arc::new(StubHnApi::with_stories(
        titles.iter().enumerate().map(|(i, t)| story(i as u64 + 1, t)).collect(),
    ));

    let source = HackerNewsSource::new(api.clone());
    let spec = SourceSpec::hacker_news().with_count(2).with_filter("rust");
    let articles = source.fetch(&spec).await.unwrap();

    // count 2 with a pattern looks at the first 6 ranks.
    let mut requested = api.requested();
    requested.sort_unstable();
    assert_eq!(requested, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(ids(&articles), vec!["hn-2", "hn-5"]);
}

#[tokio::test]
async fn exclude_wins_over_include() {
    let api = StubHnApi::with_stories(vec![
        story(1, "Rust 2.0 announced"),
        story(2, "Rust team is hiring"),
        story(3, "Python news"),
    ]);
    let source = HackerNewsSource::new(Arc::new(api));

    let spec = SourceSpec::hacker_news()
        .with_count(3)
        .with_filter("RUST")
        .with_exclude("hiring");
    let articles = source.fetch(&spec).await.unwrap();

    assert_eq!(ids(&articles), vec!["hn-1"]);
}

#[tokio::test]
async fn text_posts_link_to_their_discussion() {
    let mut ask = story(42, "Ask HN: favourite books?");
    ask.url = None;
    ask.text = Some("Looking for recommendations.".to_string());

    let articles = fetch_ranked_items(&StubHnApi::with_stories(vec![ask]), &[42], 4).await;

    assert_eq!(articles.len(), 1);
    let article = &articles[0];
    assert_eq!(article.url(), Some(discussion_url(42).as_str()));
    assert_eq!(article.comments_url(), Some("https://news.ycombinator.com/item?id=42"));
    assert_eq!(article.text(), Some("Looking for recommendations."));
    assert_eq!(article.source(), "Hacker News");
    assert_eq!(article.author(), "pg");
}

#[tokio::test]
async fn only_live_stories_become_articles() {
    let mut job = story(1, "Acme is hiring");
    job.kind = Some("job".to_string());
    let mut dead = story(2, "Flagged");
    dead.dead = true;
    let mut deleted = story(3, "Gone");
    deleted.deleted = true;
    let mut untitled = story(4, "");
    untitled.title = None;

    let api = StubHnApi::with_stories(vec![job, dead, deleted, untitled, story(5, "Alive")]);
    let articles = fetch_ranked_items(&api, &[1, 2, 3, 4, 5, 6], 3).await;

    assert_eq!(ids(&articles), vec!["hn-5"]);
}

#[tokio::test]
async fn duplicate_ranked_ids_are_fetched_once() {
    let mut api = StubHnApi::with_stories(vec![story(1, "One"), story(2, "Two")]);
    api.ranked = vec![1, 2, 1, 2];
    let api = Arc::new(api);

    let source = HackerNewsSource::new(api.clone());
    let articles = source.fetch(&SourceSpec::hacker_news().with_count(4)).await.unwrap();

    assert_eq!(ids(&articles), vec!["hn-1", "hn-2"]);
    assert_eq!(api.requested().len(), 2);
}

#[tokio::test]
async fn ranked_list_failure_fails_the_source() {
    let api = StubHnApi {
        fail_ranked: true,
        ..Default::default()
    };
    let source = HackerNewsSource::new(Arc::new(api));

    let result = source.fetch(&SourceSpec::hacker_news()).await;
    assert!(matches!(result, Err(AggregatorError::Status { status: 503, .. })));
}

#[tokio::test]
async fn negative_counts_from_the_api_are_clamped() {
    let mut item = story(7, "Controversial");
    item.score = Some(-4);
    item.descendants = Some(-1);

    let articles = fetch_ranked_items(&StubHnApi::with_stories(vec![item]), &[7], 1).await;

    assert_eq!(articles[0].score(), 0);
    assert_eq!(articles[0].comments_count(), 0);
}

#[tokio::test]
async fn wrong_spec_kind_is_a_config_error() {
    let source = HackerNewsSource::new(Arc::new(StubHnApi::default()));
    let spec = SourceSpec::new(SourceKind::Rss {
        feed_url: "https://example.com/feed".to_string(),
        display_name: None,
    });

    let err = source.fetch(&spec).await.unwrap_err();
    assert!(err.is_config());
}
