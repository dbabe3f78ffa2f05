use crate::types::{Article, Result, SourceSpec};
use regex::{Regex, RegexBuilder};
use tracing::debug;

/// Include/exclude title patterns, matched case-insensitively anywhere in the title.
///
/// A missing pattern places no constraint. An article matching both the
/// include and the exclude pattern is dropped.
#[derive(Debug, Clone, Default)]
pub struct TitleFilter {
    include: Option<Regex>,
    exclude: Option<Regex>,
}

impl TitleFilter {
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Result<Self> {
        Ok(Self {
            include: include.map(compile).transpose()?,
            exclude: exclude.map(compile).transpose()?,
        })
    }

    pub fn for_spec(spec: &SourceSpec) -> Result<Self> {
        Self::new(spec.filter.as_deref(), spec.exclude.as_deref())
    }

    pub fn is_noop(&self) -> bool {
        self.include.is_none() && self.exclude.is_none()
    }

    pub fn matches(&self, title: &str) -> bool {
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(title) {
                return false;
            }
        }
        match &self.include {
            Some(include) => include.is_match(title),
            None => true,
        }
    }

    pub fn apply(&self, articles: Vec<Article>) -> Vec<Article> {
        if self.is_noop() {
            return articles;
        }

        let before = articles.len();
        let kept: Vec<Article> = articles
            .into_iter()
            .filter(|article| self.matches(article.title()))
            .collect();

        debug!("Title filter kept {}/{} articles", kept.len(), before);
        kept
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Ok(RegexBuilder::new(pattern).case_insensitive(true).build()?)
}

/// Keep articles whose title matches `include` (if given) and not `exclude` (if given).
pub fn filter_articles(
    articles: Vec<Article>,
    include: Option<&str>,
    exclude: Option<&str>,
) -> Result<Vec<Article>> {
    Ok(TitleFilter::new(include, exclude)?.apply(articles))
}
