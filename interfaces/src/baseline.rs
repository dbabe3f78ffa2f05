use std::collections::HashMap;

use async_trait::async_trait;

use crate::defs::Article;
use crate::defs::Summarizer;
use crate::defs::SummaryRequest;
use crate::defs::TopicSummary;

const DEFAULT_HIGHLIGHTS: usize = 10;
const DEFAULT_EXCERPT_CHARS: usize = 200;

/// Offline extractive summarizer.
///
/// The topic summary lists the leading articles in aggregation order; each
/// article with body text gets its first sentence as a summary. Output is a
/// pure function of the input, which makes it usable without an LLM and as
/// a reference in tests.
pub struct BaselineSummarizer {
    max_highlights: usize,
    excerpt_chars: usize,
}

impl BaselineSummarizer {
    pub fn new() -> Self {
        Self {
            max_highlights: DEFAULT_HIGHLIGHTS,
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
        }
    }

    pub fn with_max_highlights(mut self, max_highlights: usize) -> Self {
        self.max_highlights = max_highlights;
        self
    }

    fn compose_digest(&self, request: &SummaryRequest<'_>) -> Option<String> {
        if request.articles.is_empty() {
            return None;
        }

        let heading = match request.language {
            "zh" => format!("{} 今日要点", request.topic_name),
            _ => format!("{} highlights", request.topic_name),
        };

        let lines = request
            .articles
            .iter()
            .take(self.max_highlights)
            .enumerate()
            .map(|(index, article)| highlight_line(index + 1, article))
            .collect::<Vec<String>>();

        Some(format!("{}\n\n{}", heading, lines.join("\n")))
    }

    fn summarize_article(&self, article: &Article) -> Option<String> {
        let text = strip_tags(article.text()?);
        let sentence = first_sentence(&text);
        if sentence.is_empty() {
            return None;
        }
        Some(truncate_chars(sentence, self.excerpt_chars))
    }
}

impl Default for BaselineSummarizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Summarizer for BaselineSummarizer {
    fn name(&self) -> &str {
        "baseline"
    }

    async fn summarize(&self, request: SummaryRequest<'_>) -> anyhow::Result<TopicSummary> {
        let article_summaries = request
            .articles
            .iter()
            .filter_map(|article| {
                self.summarize_article(article)
                    .map(|summary| (article.id().to_owned(), summary))
            })
            .collect::<HashMap<String, String>>();

        Ok(TopicSummary {
            summary: self.compose_digest(&request),
            article_summaries,
        })
    }
}

fn highlight_line(rank: usize, article: &Article) -> String {
    if article.score() > 0 {
        format!(
            "{}. {} ({}, {} points, {} comments)",
            rank,
            article.title(),
            article.source(),
            article.score(),
            article.comments_count()
        )
    } else {
        format!("{}. {} ({})", rank, article.title(), article.source())
    }
}

fn strip_tags(html: &str) -> String {
    html.chars()
        .fold((String::new(), false), |(mut text, in_tag), c| match c {
            '<' => (text, true),
            '>' => (text, false),
            _ if !in_tag => {
                text.push(c);
                (text, in_tag)
            }
            _ => (text, in_tag),
        })
        .0
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn first_sentence(text: &str) -> &str {
    match text.find(". ") {
        Some(end) => &text[..end + 1],
        None => text,
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }
    let cut = text.chars().take(max_chars).collect::<String>();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::{ArticleDraft, PublishedAt};

    fn article(id: &str, title: &str, text: Option<&str>) -> Article {
        Article::new(ArticleDraft {
            id: id.to_owned(),
            title: title.to_owned(),
            url: None,
            source: "Hacker News".to_owned(),
            score: 42,
            comments_count: 7,
            comments_url: None,
            published_at: PublishedAt::UnixSeconds(0),
            author: None,
            text: text.map(str::to_owned),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn digest_lists_articles_in_order() {
        let articles = vec![
            article("hn-1", "First", Some("<p>Body one. More text.</p>")),
            article("hn-2", "Second", None),
        ];
        let summary = BaselineSummarizer::new()
            .summarize(SummaryRequest {
                topic_id: "tech",
                topic_name: "Tech",
                language: "en",
                articles: &articles,
            })
            .await
            .unwrap();

        let digest = summary.summary.unwrap();
        assert!(digest.starts_with("Tech highlights"));
        assert!(digest.find("1. First").unwrap() < digest.find("2. Second").unwrap());
        assert_eq!(summary.article_summaries.get("hn-1").map(String::as_str), Some("Body one."));
        assert!(!summary.article_summaries.contains_key("hn-2"));
    }

    #[tokio::test]
    async fn empty_topic_has_no_digest() {
        let summary = BaselineSummarizer::new()
            .summarize(SummaryRequest {
                topic_id: "tech",
                topic_name: "Tech",
                language: "zh",
                articles: &[],
            })
            .await
            .unwrap();
        assert_eq!(summary, TopicSummary::default());
    }

    #[test]
    fn long_sentences_are_truncated() {
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
        assert_eq!(truncate_chars("abc", 3), "abc");
    }
}
