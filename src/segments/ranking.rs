use serde::{Deserialize, Serialize};

use crate::types::{ContentBlock, Message, SegmentScore};

/// Tunable weights of the segment priority score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityWeights {
    /// Score of the latest segment; earlier ones scale linearly down to zero.
    pub recency: f64,
    /// Flat bonus when the segment calls tools or carries tool results.
    pub tool_bonus: f64,
    /// Flat bonus when the segment carries error output.
    pub error_bonus: f64,
    /// Bonus per tool call ...
    pub tool_call_bonus: f64,
    /// ... capped here.
    pub tool_call_bonus_cap: f64,
    /// Segments costing more than this many tokens are penalized.
    pub oversize_threshold: usize,
    pub oversize_penalty: f64,
    /// Case-insensitive substrings that mark text as error output.
    pub error_markers: Vec<String>,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            recency: 10.0,
            tool_bonus: 2.0,
            error_bonus: 3.0,
            tool_call_bonus: 0.5,
            tool_call_bonus_cap: 2.0,
            oversize_threshold: 20_000,
            oversize_penalty: 5.0,
            error_markers: ["error", "exception", "failed", "panic", "traceback"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl PriorityWeights {
    /// Only recency counts; everything else is zeroed.
    pub fn recency_only() -> Self {
        Self {
            recency: 1.0,
            tool_bonus: 0.0,
            error_bonus: 0.0,
            tool_call_bonus: 0.0,
            tool_call_bonus_cap: 0.0,
            oversize_threshold: usize::MAX,
            oversize_penalty: 0.0,
            error_markers: Vec::new(),
        }
    }

    pub(crate) fn named_values(&self) -> [(&'static str, f64); 6] {
        [
            ("recency", self.recency),
            ("tool_bonus", self.tool_bonus),
            ("error_bonus", self.error_bonus),
            ("tool_call_bonus", self.tool_call_bonus),
            ("tool_call_bonus_cap", self.tool_call_bonus_cap),
            ("oversize_penalty", self.oversize_penalty),
        ]
    }
}

/// Observable facts about one segment, the input to scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentFeatures {
    pub index: usize,
    pub segment_count: usize,
    pub tokens: usize,
    pub has_tool_ops: bool,
    pub has_error: bool,
    pub tool_calls: usize,
}

impl SegmentFeatures {
    pub fn extract<'a>(
        index: usize,
        segment_count: usize,
        tokens: usize,
        messages: impl IntoIterator<Item = &'a Message>,
        error_markers: &[String],
    ) -> Self {
        let mut has_tool_ops = false;
        let mut has_error = false;
        let mut tool_calls = 0;

        for block in messages.into_iter().flat_map(|m| m.content.iter()) {
            has_tool_ops |= block.is_tool();
            match block {
                ContentBlock::ToolUse { .. } => tool_calls += 1,
                ContentBlock::ToolResult { is_error: true, .. } => has_error = true,
                ContentBlock::ToolResult { content: text, .. } | ContentBlock::Text { text } => {
                    if !has_error && mentions_error(text, error_markers) {
                        has_error = true;
                    }
                }
                ContentBlock::Image { .. } => {}
            }
        }

        Self {
            index,
            segment_count,
            tokens,
            has_tool_ops,
            has_error,
            tool_calls,
        }
    }
}

fn mentions_error(text: &str, markers: &[String]) -> bool {
    if markers.is_empty() {
        return false;
    }
    let lower = text.to_lowercase();
    markers.iter().any(|marker| lower.contains(&marker.to_lowercase()))
}

pub trait Scorer {
    fn score(&self, features: &SegmentFeatures) -> SegmentScore;

    /// Markers [`SegmentFeatures::extract`] should look for.
    fn error_markers(&self) -> &[String] {
        &[]
    }
}

/// Linear combination of [`PriorityWeights`].
#[derive(Debug, Clone, Default)]
pub struct WeightedScorer {
    pub weights: PriorityWeights,
}

impl WeightedScorer {
    pub fn new(weights: PriorityWeights) -> Self {
        Self { weights }
    }
}

impl Scorer for WeightedScorer {
    fn score(&self, features: &SegmentFeatures) -> SegmentScore {
        let w = &self.weights;

        let recency = if features.segment_count > 1 {
            w.recency * features.index as f64 / (features.segment_count - 1) as f64
        } else {
            w.recency
        };
        let tool_bonus = if features.has_tool_ops { w.tool_bonus } else { 0.0 };
        let error_bonus = if features.has_error { w.error_bonus } else { 0.0 };
        let tool_call_bonus = (w.tool_call_bonus * features.tool_calls as f64).min(w.tool_call_bonus_cap);
        let oversize_penalty = if features.tokens > w.oversize_threshold {
            w.oversize_penalty
        } else {
            0.0
        };

        SegmentScore {
            segment_index: features.index,
            tokens: features.tokens,
            recency,
            tool_bonus,
            error_bonus,
            tool_call_bonus,
            oversize_penalty,
            total: recency + tool_bonus + error_bonus + tool_call_bonus - oversize_penalty,
            kept: false,
        }
    }

    fn error_markers(&self) -> &[String] {
        &self.weights.error_markers
    }
}
