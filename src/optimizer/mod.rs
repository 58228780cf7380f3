//! The optimization pipeline.
//!
//! ```text
//! messages ─► sanitize ─► cost ─┬─ within budget ─────────────────────────┐
//!                               └─ dedup ─┬─ within budget and significant ┤
//!                                         └─ partition ─► truncate ───────┤
//!                                                                         ▼
//!                                               cache boundaries (if supported)
//! ```
//!
//! Stages run strictly in sequence; each one consumes the previous stage's
//! output and produces a new list. The caller's messages are never touched.

pub mod config;
mod sanitize;

use crate::cache::{plan_cache_boundaries, BoundaryPolicy};
use crate::dedup::deduplicate;
use crate::segments::{SegmentSelector, WeightedScorer};
use crate::tokens::{ApproxTokenCounter, TokenAccountant, TokenCounter};
use crate::types::optimization::compression_ratio;
use crate::types::{
    ContextWindowProfile, Message, OptimizationMetrics, OptimizationResult, OptimizeError, Strategy,
};

pub use config::OptimizerConfig;

pub struct ContextOptimizer<T = ApproxTokenCounter> {
    config: OptimizerConfig,
    tokenizer: T,
}

impl Default for ContextOptimizer<ApproxTokenCounter> {
    fn default() -> Self {
        Self {
            config: OptimizerConfig::default(),
            tokenizer: ApproxTokenCounter,
        }
    }
}

impl ContextOptimizer<ApproxTokenCounter> {
    pub fn with_config(config: OptimizerConfig) -> Self {
        Self::new(config, ApproxTokenCounter)
    }
}

impl<T> ContextOptimizer<T>
where
    T: TokenCounter,
{
    pub fn new(config: OptimizerConfig, tokenizer: T) -> Self {
        Self { config, tokenizer }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Fit `messages` into `profile.max_allowed_size`.
    ///
    /// Only an invalid profile or configuration is an error. Every transcript,
    /// however malformed or oversized, yields a result.
    pub fn optimize(
        &self,
        messages: &[Message],
        profile: &ContextWindowProfile,
    ) -> Result<OptimizationResult, OptimizeError> {
        let mut accountant = TokenAccountant::new(&self.tokenizer);
        self.optimize_with(messages, profile, &mut accountant)
    }

    /// Like [`optimize`](Self::optimize), costing through a caller-owned
    /// accountant so its memo can outlive the call.
    pub fn optimize_with<C: TokenCounter>(
        &self,
        messages: &[Message],
        profile: &ContextWindowProfile,
        accountant: &mut TokenAccountant<C>,
    ) -> Result<OptimizationResult, OptimizeError> {
        profile.validate()?;
        self.config.validate()?;

        let budget = profile.max_allowed_size;
        let fallbacks_before = accountant.fallbacks();
        let mut metrics = OptimizationMetrics::new();
        let mut strategies = Vec::new();
        let mut segment_scores = Vec::new();
        let mut irreducible_oversize = false;

        let original_tokens = accountant.messages_cost(messages);

        // 0. Malformed input is excluded, never fatal
        let (mut current, warnings) = match sanitize::sanitize(messages) {
            Some(sanitized) => (sanitized.messages, sanitized.warnings),
            None => (messages.to_vec(), Vec::new()),
        };
        let mut current_tokens = if warnings.is_empty() {
            original_tokens
        } else {
            accountant.messages_cost(&current)
        };

        tracing::debug!(original_tokens, current_tokens, budget, "context optimization started");

        if current_tokens > budget {
            // 1. Deduplication
            let dedup = deduplicate(&current, self.config.dedup_keep_threshold, accountant);
            strategies.push(Strategy::Dedup);
            metrics.dedup_blocks_removed = dedup.blocks_removed;
            metrics.dedup_tokens_reclaimed = dedup.tokens_reclaimed;
            metrics.empty_messages_dropped = dedup.empty_messages_dropped;

            let deduped_tokens = accountant.messages_cost(&dedup.messages);
            let reduction = 1.0 - compression_ratio(current_tokens, deduped_tokens);
            tracing::debug!(
                before = current_tokens,
                after = deduped_tokens,
                blocks_removed = dedup.blocks_removed,
                reduction,
                "deduplication finished"
            );
            current = dedup.messages;
            current_tokens = deduped_tokens;

            // 2. Truncation, unless dedup alone was enough
            if current_tokens > budget || reduction < self.config.significance_ratio {
                let selector = SegmentSelector::new(WeightedScorer::new(self.config.priority.clone()));
                let outcome = selector.truncate(&current, budget, accountant);
                strategies.push(Strategy::Truncate);

                metrics.segments_total = outcome.scores.len();
                metrics.segments_kept = outcome.segments_kept;
                metrics.segments_dropped = outcome.segments_dropped;
                irreducible_oversize = outcome.irreducible_oversize;
                segment_scores = outcome.scores;

                current = outcome.messages;
                current_tokens = accountant.messages_cost(&current);

                if irreducible_oversize {
                    tracing::warn!(
                        first_segment_tokens = outcome.first_segment_tokens,
                        budget,
                        "first segment alone exceeds the allowed context size"
                    );
                }
            }
        }

        // 3. Cache boundaries
        let mut cache_boundaries = Vec::new();
        if profile.supports_prompt_caching {
            let policy = BoundaryPolicy {
                threshold: self
                    .config
                    .cache_threshold_override
                    .unwrap_or(profile.caching_threshold),
                min_message_tokens: self.config.cache_min_message_tokens,
            };
            cache_boundaries = plan_cache_boundaries(&current, policy, accountant);
            strategies.push(Strategy::CacheBoundaries);
        }

        debug_assert!(current_tokens <= original_tokens);
        debug_assert!(current_tokens <= budget || irreducible_oversize);

        metrics.cache_boundary_count = cache_boundaries.len();
        metrics.tokenizer_fallbacks = accountant.fallbacks() - fallbacks_before;

        let result = OptimizationResult {
            messages: current,
            original_tokens,
            optimized_tokens: current_tokens,
            compression_ratio: compression_ratio(original_tokens, current_tokens),
            strategies,
            cache_boundaries,
            irreducible_oversize,
            warnings,
            segment_scores,
            metrics,
        };

        tracing::info!(
            original_tokens = result.original_tokens,
            optimized_tokens = result.optimized_tokens,
            compression_ratio = result.compression_ratio,
            strategies = ?result.strategy_names(),
            warnings = result.warnings.len(),
            "{}",
            result.to_log_string()
        );

        Ok(result)
    }
}
