use serde::{Deserialize, Serialize};

use crate::dedup::DEFAULT_KEEP_THRESHOLD;
use crate::segments::PriorityWeights;
use crate::types::ConfigError;

// Key point:
// Serializable
// Comparable
// Explicit defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Identical re-reads within this many messages are dropped.
    pub dedup_keep_threshold: usize,
    /// Fraction of the original size deduplication must reclaim to be
    /// accepted without truncation.
    pub significance_ratio: f64,
    /// Replaces the profile's caching threshold when set.
    pub cache_threshold_override: Option<usize>,
    /// A user message must cost more than this to carry a cache boundary.
    pub cache_min_message_tokens: usize,
    pub priority: PriorityWeights,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            dedup_keep_threshold: DEFAULT_KEEP_THRESHOLD,
            significance_ratio: 0.30,
            cache_threshold_override: None,
            cache_min_message_tokens: 32,
            priority: PriorityWeights::default(),
        }
    }
}

impl OptimizerConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_keep_threshold(mut self, messages: usize) -> Self {
        self.dedup_keep_threshold = messages;
        self
    }

    pub fn with_significance_ratio(mut self, ratio: f64) -> Self {
        self.significance_ratio = ratio;
        self
    }

    pub fn with_cache_threshold(mut self, tokens: usize) -> Self {
        self.cache_threshold_override = Some(tokens);
        self
    }

    pub fn with_priority(mut self, weights: PriorityWeights) -> Self {
        self.priority = weights;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ratio = self.significance_ratio;
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(ConfigError::InvalidSignificanceRatio(ratio));
        }
        if self.cache_threshold_override == Some(0) {
            return Err(ConfigError::ZeroCacheThreshold);
        }
        for (name, value) in self.priority.named_values() {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteWeight { name, value });
            }
        }
        Ok(())
    }
}
