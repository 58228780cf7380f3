pub mod budgeting;
pub mod ranking;

use std::cmp::Ordering;

use crate::tokens::{TokenAccountant, TokenCounter};
use crate::types::{Malformed, Message, SegmentScore};
pub use budgeting::{apply_budget, BudgetResult};
pub use ranking::{PriorityWeights, Scorer, SegmentFeatures, WeightedScorer};

/// One user-initiated exchange: a user message and the assistant messages
/// that follow it. Leading assistant messages form segment 0 on their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSegment {
	pub index: usize,
	/// Positions in the partitioned list, ascending and contiguous apart from skipped messages.
	pub message_indices: Vec<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct Partition {
	pub segments: Vec<ConversationSegment>,
	/// Messages left out for an unrecognized role.
	pub skipped: Vec<usize>,
}

/// Group `messages` into segments. No gaps, no overlaps, original order.
pub fn partition(messages: &[Message]) -> Partition {
	let mut result = Partition::default();

	for (i, message) in messages.iter().enumerate() {
		if !message.role.is_known() {
			let reason = Malformed::UnknownRole {
				role: message.role.to_string(),
			};
			tracing::warn!(message = i, %reason, "skipping message during segmentation");
			result.skipped.push(i);
			continue;
		}

		match result.segments.last_mut() {
			Some(segment) if !message.is_user() => segment.message_indices.push(i),
			_ => {
				let index = result.segments.len();
				result.segments.push(ConversationSegment {
					index,
					message_indices: vec![i],
				});
			}
		}
	}

	result
}

#[derive(Debug, Clone)]
pub struct TruncationOutcome {
	pub messages: Vec<Message>,
	/// One entry per segment, ordered by segment index.
	pub scores: Vec<SegmentScore>,
	pub first_segment_tokens: usize,
	pub tokens_used: usize,
	pub segments_kept: usize,
	pub segments_dropped: usize,
	/// Segment 0 alone does not fit the budget.
	pub irreducible_oversize: bool,
}

pub struct SegmentSelector<S> {
	scorer: S,
}

impl Default for SegmentSelector<WeightedScorer> {
	fn default() -> Self {
		Self {
			scorer: WeightedScorer::default(),
		}
	}
}

impl<S> SegmentSelector<S>
where
	S: Scorer,
{
	pub fn new(scorer: S) -> Self {
		Self { scorer }
	}

	/// Keep segment 0 plus the highest-priority segments that fit `budget`,
	/// reassembled in chronological order.
	pub fn truncate<T: TokenCounter>(
		&self,
		messages: &[Message],
		budget: usize,
		accountant: &mut TokenAccountant<T>,
	) -> TruncationOutcome {
		let partition = partition(messages);
		let segment_count = partition.segments.len();

		// 1. Scoring Phase
		let mut scores: Vec<SegmentScore> = partition
			.segments
			.iter()
			.map(|segment| {
				let members: Vec<&Message> = segment.message_indices.iter().map(|&i| &messages[i]).collect();
				let tokens: usize = members.iter().map(|m| accountant.message_cost(m)).sum();
				let features = SegmentFeatures::extract(
					segment.index,
					segment_count,
					tokens,
					members,
					self.scorer.error_markers(),
				);
				self.scorer.score(&features)
			})
			.collect();

		let Some(first) = scores.first_mut() else {
			return TruncationOutcome {
				messages: Vec::new(),
				scores: Vec::new(),
				first_segment_tokens: 0,
				tokens_used: 0,
				segments_kept: 0,
				segments_dropped: 0,
				irreducible_oversize: false,
			};
		};

		// 2. Segment 0 is retained unconditionally
		first.kept = true;
		let first_segment_tokens = first.tokens;
		let irreducible_oversize = first_segment_tokens > budget;
		let remaining = budget.saturating_sub(first_segment_tokens);

		// 3. Ordering Phase
		// Sort by (total desc, index asc)
		let mut ranked = scores.split_off(1);
		ranked.sort_by(|a, b| {
			let score_cmp = b.total.partial_cmp(&a.total).unwrap_or(Ordering::Equal);
			if score_cmp != Ordering::Equal {
				score_cmp
			} else {
				a.segment_index.cmp(&b.segment_index)
			}
		});

		debug_assert!(ranked.windows(2).all(|w| {
			let a = &w[0];
			let b = &w[1];
			a.total > b.total || (a.total == b.total && a.segment_index <= b.segment_index) || a.total.is_nan() || b.total.is_nan()
		}));

		// 4. Budgeting Phase
		let BudgetResult {
			scored,
			tokens_used,
			segments_selected,
			segments_excluded_by_budget,
		} = apply_budget(ranked, remaining);

		// 5. Chronological reassembly
		scores.extend(scored);
		scores.sort_by_key(|score| score.segment_index);

		let kept_messages: Vec<Message> = partition
			.segments
			.iter()
			.zip(&scores)
			.filter(|(_, score)| score.kept)
			.flat_map(|(segment, _)| segment.message_indices.iter().map(move |&i| messages[i].clone()))
			.collect();

		tracing::debug!(
			segments = segment_count,
			kept = segments_selected + 1,
			dropped = segments_excluded_by_budget,
			first_segment_tokens,
			budget,
			"segments truncated"
		);

		TruncationOutcome {
			messages: kept_messages,
			scores,
			first_segment_tokens,
			tokens_used: first_segment_tokens + tokens_used,
			segments_kept: segments_selected + 1,
			segments_dropped: segments_excluded_by_budget,
			irreducible_oversize,
		}
	}
}
