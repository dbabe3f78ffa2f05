use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::info;

use crate::defs::ArtifactStore;
use crate::defs::TopicArtifact;

/// Stores one pretty-printed JSON document per topic under `<root>/<date>/<topic_id>.json`.
pub struct JsonArtifactStore {
    root: PathBuf,
}

impl JsonArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn artifact_path(&self, date: NaiveDate, topic_id: &str) -> PathBuf {
        self.root
            .join(date.format("%Y-%m-%d").to_string())
            .join(format!("{}.json", topic_id))
    }
}

#[async_trait]
impl ArtifactStore for JsonArtifactStore {
    async fn write(&self, artifact: &TopicArtifact) -> anyhow::Result<PathBuf> {
        let path = self.artifact_path(artifact.date, &artifact.topic_id);
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("creating {}", dir.display()))?;
        }

        let body = serde_json::to_vec_pretty(artifact).context("serializing topic artifact")?;
        tokio::fs::write(&path, body)
            .await
            .with_context(|| format!("writing {}", path.display()))?;

        info!("Saved {} ({} articles) to {}", artifact.topic_id, artifact.article_count, path.display());
        Ok(path)
    }

    async fn read(&self, date: NaiveDate, topic_id: &str) -> anyhow::Result<TopicArtifact> {
        let path = self.artifact_path(date, topic_id);
        let body = tokio::fs::read(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_slice(&body).with_context(|| format!("parsing {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::{Article, ArticleDraft, PublishedAt};
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn written_artifact_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonArtifactStore::new(dir.path());
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();

        let article = Article::new(ArticleDraft {
            id: "hn-100".to_owned(),
            title: "Show HN: a thing".to_owned(),
            url: None,
            source: "Hacker News".to_owned(),
            score: 120,
            comments_count: 33,
            comments_url: Some("https://news.ycombinator.com/item?id=100".to_owned()),
            published_at: PublishedAt::UnixSeconds(1_760_000_000),
            author: Some("pg".to_owned()),
            text: None,
        })
        .unwrap()
        .with_summary("A thing was shown.".to_owned());

        let artifact = TopicArtifact {
            topic_id: "tech".to_owned(),
            topic_name: "Tech".to_owned(),
            description: String::new(),
            date,
            crawled_at: Utc.with_ymd_and_hms(2026, 10, 16, 6, 0, 0).unwrap(),
            article_count: 1,
            articles: vec![article],
            summary: Some("digest".to_owned()),
            summary_language: Some("en".to_owned()),
        };

        let path = store.write(&artifact).await.unwrap();
        assert_eq!(path, dir.path().join("2026-10-16").join("tech.json"));

        let loaded = store.read(date, "tech").await.unwrap();
        assert_eq!(loaded, artifact);
    }

    #[tokio::test]
    async fn missing_artifact_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonArtifactStore::new(dir.path());
        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert!(store.read(date, "nope").await.is_err());
    }
}
