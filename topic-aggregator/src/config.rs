use crate::types::{AggregatorConfig, AggregatorError, Result, SourceSpec, TopicSpec};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::path::Path;
use tracing::{debug, info, warn};

/// Run-wide settings from the `settings:` block.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub max_articles_per_topic: usize,
    pub summary_language: String,
    pub topic_delay_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_articles_per_topic: 30,
            summary_language: "zh".to_string(),
            topic_delay_secs: 3,
        }
    }
}

impl Settings {
    pub fn aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig {
            max_articles_per_topic: self.max_articles_per_topic,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub settings: Settings,
    pub topics: Vec<TopicSpec>,
}

impl AppConfig {
    pub fn topic(&self, id: &str) -> Option<&TopicSpec> {
        self.topics.iter().find(|topic| topic.id == id)
    }

    /// Topics whose id is in `ids`, in file order. An empty `ids` selects everything.
    pub fn select(&self, ids: &[String]) -> Vec<TopicSpec> {
        if ids.is_empty() {
            return self.topics.clone();
        }
        for id in ids {
            if self.topic(id).is_none() {
                warn!("Requested topic {} is not configured", id);
            }
        }
        self.topics
            .iter()
            .filter(|topic| ids.contains(&topic.id))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    settings: Settings,
    #[serde(default)]
    topics: Mapping,
}

#[derive(Debug, Deserialize)]
struct RawTopic {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    sources: Vec<Value>,
}

pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let config = parse_config(&text)?;
    info!("Loaded {} topics from {}", config.topics.len(), path.display());
    Ok(config)
}

/// Parse a topics document.
///
/// Only a malformed document as a whole is an error. A topic or source entry
/// that does not decode is logged and left out.
pub fn parse_config(text: &str) -> Result<AppConfig> {
    let raw: RawConfig = serde_yaml::from_str(text)?;

    let mut topics = Vec::with_capacity(raw.topics.len());
    for (key, value) in raw.topics {
        let Some(id) = key.as_str().map(str::to_string) else {
            warn!("Skipping topic with non-string key: {:?}", key);
            continue;
        };

        let topic: RawTopic = match serde_yaml::from_value(value) {
            Ok(topic) => topic,
            Err(e) => {
                warn!("Skipping topic {}: {}", id, e);
                continue;
            }
        };

        let sources = topic
            .sources
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match parse_source(value) {
                Ok(spec) => Some(spec),
                Err(e) => {
                    warn!("Skipping source #{} of topic {}: {}", index + 1, id, e);
                    None
                }
            })
            .collect::<Vec<_>>();

        debug!("Topic {} has {} sources", id, sources.len());
        topics.push(TopicSpec {
            name: topic.name.unwrap_or_else(|| id.clone()),
            id,
            description: topic.description,
            sources,
        });
    }

    Ok(AppConfig {
        settings: raw.settings,
        topics,
    })
}

fn parse_source(value: Value) -> Result<SourceSpec> {
    let spec: SourceSpec = serde_yaml::from_value(value).map_err(|e| AggregatorError::Config(e.to_string()))?;
    spec.validate()?;
    Ok(spec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_default_when_block_is_missing() {
        let config = parse_config("topics: {}").unwrap();
        assert_eq!(config.settings, Settings::default());
        assert!(config.topics.is_empty());
    }

    #[test]
    fn topic_name_defaults_to_id() {
        let config = parse_config("topics:\n  ai:\n    sources: []\n").unwrap();
        assert_eq!(config.topics[0].name, "ai");
    }
}
