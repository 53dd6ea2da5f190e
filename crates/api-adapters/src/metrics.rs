//! # Metrics
//!
//! Prometheus counters for ingestion outcomes and like toggles, rendered in
//! the OpenMetrics text format.

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

pub const CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct OutcomeLabels {
    pub outcome: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct LikeLabels {
    pub target: String,
    pub action: String,
}

#[derive(Debug)]
pub struct Metrics {
    registry: Registry,
    ingestions: Family<OutcomeLabels, Counter>,
    like_toggles: Family<LikeLabels, Counter>,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix("gallery");
        let ingestions = Family::<OutcomeLabels, Counter>::default();
        let like_toggles = Family::<LikeLabels, Counter>::default();

        registry.register(
            "post_ingestions",
            "Post submissions by terminal outcome",
            ingestions.clone(),
        );
        registry.register(
            "like_toggles",
            "Like toggles on posts, comments and replies",
            like_toggles.clone(),
        );

        Self {
            registry,
            ingestions,
            like_toggles,
        }
    }

    /// `outcome` is `persisted` or one of the `*_failed` kinds.
    pub fn record_ingestion(&self, outcome: &str) {
        self.ingestions
            .get_or_create(&OutcomeLabels {
                outcome: outcome.to_string(),
            })
            .inc();
    }

    pub fn record_like(&self, target: &str, liked: bool) {
        self.like_toggles
            .get_or_create(&LikeLabels {
                target: target.to_string(),
                action: if liked { "like" } else { "unlike" }.to_string(),
            })
            .inc();
    }

    pub fn encode(&self) -> Result<String, std::fmt::Error> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry)?;
        Ok(buffer)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_by_outcome() {
        let metrics = Metrics::new();
        metrics.record_ingestion("persisted");
        metrics.record_ingestion("persisted");
        metrics.record_ingestion("fetch_failed");
        metrics.record_like("post", true);

        let text = metrics.encode().unwrap();
        assert!(text.contains("gallery_post_ingestions_total{outcome=\"persisted\"} 2"));
        assert!(text.contains("gallery_post_ingestions_total{outcome=\"fetch_failed\"} 1"));
        assert!(text.contains("gallery_like_toggles_total{target=\"post\",action=\"like\"} 1"));
        assert!(text.ends_with("# EOF\n"));
    }
}
