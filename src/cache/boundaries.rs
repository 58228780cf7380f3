use crate::tokens::{TokenAccountant, TokenCounter};
use crate::types::Message;

/// When to place a prompt-cache boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryPolicy {
    /// Tokens accumulated since the previous boundary before a new one is due.
    pub threshold: usize,
    /// A user message must cost more than this to carry a boundary.
    pub min_message_tokens: usize,
}

/// Walk `messages` once and return the indices that end a cacheable prefix.
///
/// The running counter includes the message under consideration. A boundary
/// lands only on a user message with content, once the counter exceeds the
/// threshold; the counter then restarts. Indices come out ascending.
pub fn plan_cache_boundaries<T: TokenCounter>(
    messages: &[Message],
    policy: BoundaryPolicy,
    accountant: &mut TokenAccountant<T>,
) -> Vec<usize> {
    let mut boundaries = Vec::new();
    let mut since_boundary: usize = 0;

    for (index, message) in messages.iter().enumerate() {
        let cost = accountant.message_cost(message);
        since_boundary = since_boundary.saturating_add(cost);

        if since_boundary > policy.threshold
            && message.is_user()
            && !message.content.is_empty()
            && cost > policy.min_message_tokens
        {
            boundaries.push(index);
            since_boundary = 0;
        }
    }

    debug_assert!(boundaries.windows(2).all(|w| w[0] < w[1]));
    boundaries
}
