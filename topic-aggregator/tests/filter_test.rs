use topic_aggregator::{filter_articles, AggregatorError, Article, ArticleDraft, PublishedAt, TitleFilter};

fn titled(titles: &[&str]) -> Vec<Article> {
    titles
        .iter()
        .enumerate()
        .map(|(i, title)| {
            Article::new(ArticleDraft {
                id: format!("t-{}", i),
                title: title.to_string(),
                url: None,
                source: "test".to_string(),
                score: 0,
                comments_count: 0,
                comments_url: None,
                published_at: PublishedAt::UnixSeconds(0),
                author: None,
                text: None,
            })
            .unwrap()
        })
        .collect()
}

fn titles(articles: &[Article]) -> Vec<&str> {
    articles.iter().map(|a| a.title()).collect()
}

const SAMPLE: &[&str] = &[
    "OpenAI ships a new model",
    "LLM inference on a laptop",
    "Anthropic is hiring",
    "Gardening tips",
    "openai api pricing",
];

#[test]
fn no_patterns_keep_everything() {
    let kept = filter_articles(titled(SAMPLE), None, None).unwrap();
    assert_eq!(kept.len(), SAMPLE.len());
    assert!(TitleFilter::new(None, None).unwrap().is_noop());
}

#[test]
fn include_is_case_insensitive_and_unanchored() {
    let kept = filter_articles(titled(SAMPLE), Some("openai|llm"), None).unwrap();
    assert_eq!(
        titles(&kept),
        vec!["OpenAI ships a new model", "LLM inference on a laptop", "openai api pricing"]
    );
}

#[test]
fn exclude_alone_drops_matches() {
    let kept = filter_articles(titled(SAMPLE), None, Some("HIRING|gardening")).unwrap();
    assert_eq!(kept.len(), 3);
    assert!(titles(&kept).iter().all(|t| !t.contains("hiring") && !t.contains("Gardening")));
}

#[test]
fn exclude_has_priority_over_include() {
    let filter = TitleFilter::new(Some("openai|anthropic"), Some("hiring|pricing")).unwrap();
    assert!(filter.matches("OpenAI ships a new model"));
    assert!(!filter.matches("Anthropic is hiring"));
    assert!(!filter.matches("openai api pricing"));
    assert!(!filter.matches("Gardening tips"));
}

#[test]
fn filtering_is_idempotent() {
    let filter = TitleFilter::new(Some("open|llm|hiring"), Some("pricing")).unwrap();

    let once = filter.apply(titled(SAMPLE));
    let twice = filter.apply(once.clone());

    assert_eq!(once, twice);
}

#[test]
fn invalid_pattern_is_a_config_error() {
    let err = TitleFilter::new(Some("[unclosed"), None).unwrap_err();
    assert!(matches!(err, AggregatorError::InvalidPattern(_)));
    assert!(err.is_config());
}
