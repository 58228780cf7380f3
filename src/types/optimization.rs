use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::conversation::{Malformed, Message};
use crate::types::profile::ProfileError;

/// A pipeline stage that changed the transcript, in application order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    Dedup,
    Truncate,
    CacheBoundaries,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Dedup => "dedup",
            Strategy::Truncate => "truncate",
            Strategy::CacheBoundaries => "cache-boundaries",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A piece of input the engine excluded instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    /// Index into the caller's input list.
    pub message_index: usize,
    /// `None` when the whole message was excluded.
    pub block_index: Option<usize>,
    pub reason: Malformed,
}

/// Per-component breakdown of a segment's priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentScore {
    pub segment_index: usize,
    pub tokens: usize,
    pub recency: f64,
    pub tool_bonus: f64,
    pub error_bonus: f64,
    pub tool_call_bonus: f64,
    pub oversize_penalty: f64,
    pub total: f64,
    pub kept: bool,
}

/// Numbers describing what each stage did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationMetrics {
    pub dedup_blocks_removed: usize,
    pub dedup_tokens_reclaimed: usize,
    pub empty_messages_dropped: usize,
    pub segments_total: usize,
    pub segments_kept: usize,
    pub segments_dropped: usize,
    pub tokenizer_fallbacks: usize,
    pub cache_boundary_count: usize,
    /// Informational only; excluded from any equality a caller cares about.
    pub computed_at: DateTime<Utc>,
}

impl OptimizationMetrics {
    pub(crate) fn new() -> Self {
        Self {
            dedup_blocks_removed: 0,
            dedup_tokens_reclaimed: 0,
            empty_messages_dropped: 0,
            segments_total: 0,
            segments_kept: 0,
            segments_dropped: 0,
            tokenizer_fallbacks: 0,
            cache_boundary_count: 0,
            computed_at: Utc::now(),
        }
    }
}

/// Output of one optimization call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub messages: Vec<Message>,
    pub original_tokens: usize,
    pub optimized_tokens: usize,
    /// `optimized_tokens / original_tokens`; `1.0` for an empty transcript.
    pub compression_ratio: f64,
    pub strategies: Vec<Strategy>,
    /// Indices into `messages` marked as prompt-cache boundaries, ascending.
    pub cache_boundaries: Vec<usize>,
    /// Set when the first segment alone exceeds the allowed size.
    pub irreducible_oversize: bool,
    pub warnings: Vec<Warning>,
    /// Present only when truncation ran, ordered by segment index.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub segment_scores: Vec<SegmentScore>,
    pub metrics: OptimizationMetrics,
}

impl OptimizationResult {
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(Strategy::as_str).collect()
    }

    /// Format as a short log-friendly string.
    pub fn to_log_string(&self) -> String {
        let strategies = if self.strategies.is_empty() {
            "none".to_string()
        } else {
            self.strategy_names().join(",")
        };
        format!(
            "context: {} -> {} tokens ({:.0}%), strategies: {}{}",
            self.original_tokens,
            self.optimized_tokens,
            self.compression_ratio * 100.0,
            strategies,
            if self.irreducible_oversize {
                ", irreducible oversize"
            } else {
                ""
            },
        )
    }
}

pub(crate) fn compression_ratio(original: usize, optimized: usize) -> f64 {
    if original == 0 {
        1.0
    } else {
        optimized as f64 / original as f64
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Significance ratio must be in (0, 1], got {0}")]
    InvalidSignificanceRatio(f64),

    #[error("Cache threshold override must be greater than zero")]
    ZeroCacheThreshold,

    #[error("Priority weight {name} must be finite, got {value}")]
    NonFiniteWeight { name: &'static str, value: f64 },
}

/// The only errors an optimization call returns: caller misuse detected
/// before any transcript content is examined.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OptimizeError {
    #[error("Invalid context window profile: {0}")]
    InvalidProfile(#[from] ProfileError),

    #[error("Invalid optimizer configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}
