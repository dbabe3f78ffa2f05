use crate::types::{Article, Result, SourceSpec};
use async_trait::async_trait;

/// A source adapter: turns one external API or feed into articles.
///
/// Implementations hold no per-call state, so one instance serves every
/// [`SourceSpec`] of its type and may be shared across topics.
#[async_trait]
pub trait Source: Send + Sync {
    /// Display name articles from `spec` are attributed to.
    fn source_name(&self, spec: &SourceSpec) -> String;

    /// Fetch at most `spec.limit()` articles.
    ///
    /// Errors mean the source as a whole contributed nothing; failures of
    /// individual items are dropped inside the adapter.
    async fn fetch(&self, spec: &SourceSpec) -> Result<Vec<Article>>;
}
