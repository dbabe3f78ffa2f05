use async_trait::async_trait;

use crate::defs::Summarizer;
use crate::defs::SummaryRequest;
use crate::defs::TopicSummary;

/// Summarizer used when summarization is switched off.
pub struct EmptySummarizer;

#[async_trait]
impl Summarizer for EmptySummarizer {
    fn name(&self) -> &str {
        "empty"
    }

    async fn summarize(&self, _request: SummaryRequest<'_>) -> anyhow::Result<TopicSummary> {
        // Nothing to say, the topic keeps its raw articles only.
        Ok(TopicSummary::default())
    }
}
