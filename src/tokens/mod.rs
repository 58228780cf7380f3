//! Token accounting for message content.
//!
//! Every other stage asks the [`TokenAccountant`] what a block costs. Costs
//! are memoized by content hash, so the same block seen twice (or a clone of
//! it in a later stage's output) is counted once per accountant.

pub mod counter;

use std::collections::HashMap;

use crate::types::{ContentBlock, ContentHash, Message};

pub use counter::{approx_tokens, is_non_latin, ApproxTokenCounter, TokenCounter, TokenizationError};

/// Fixed cost of any image before its resolution term.
pub const IMAGE_BASE_TOKENS: usize = 85;
/// Pixels per additional image token.
pub const IMAGE_PIXELS_PER_TOKEN: u64 = 750;
/// Role and field framing of a tool-use or tool-result block.
pub const TOOL_FRAMING_TOKENS: usize = 8;

/// Estimates token costs, owning its memo.
///
/// One accountant lives for one optimization call unless the caller injects
/// its own; nothing here is shared between calls.
pub struct TokenAccountant<T> {
    counter: T,
    memo: HashMap<ContentHash, usize>,
    fallbacks: usize,
}

impl Default for TokenAccountant<ApproxTokenCounter> {
    fn default() -> Self {
        Self::new(ApproxTokenCounter)
    }
}

impl<T> TokenAccountant<T>
where
    T: TokenCounter,
{
    pub fn new(counter: T) -> Self {
        Self {
            counter,
            memo: HashMap::new(),
            fallbacks: 0,
        }
    }

    pub fn block_cost(&mut self, block: &ContentBlock) -> usize {
        let key = match serde_json::to_vec(block) {
            Ok(bytes) => ContentHash::from_content(&bytes),
            Err(_) => return self.estimate(block),
        };

        if let Some(&cost) = self.memo.get(&key) {
            return cost;
        }

        let cost = self.estimate(block);
        self.memo.insert(key, cost);
        cost
    }

    pub fn message_cost(&mut self, message: &Message) -> usize {
        message.content.iter().map(|block| self.block_cost(block)).sum()
    }

    pub fn messages_cost(&mut self, messages: &[Message]) -> usize {
        messages.iter().map(|message| self.message_cost(message)).sum()
    }

    /// Number of distinct blocks costed so far.
    pub fn cache_len(&self) -> usize {
        self.memo.len()
    }

    /// How many times the tokenizer failed and the heuristic stood in.
    pub fn fallbacks(&self) -> usize {
        self.fallbacks
    }

    fn estimate(&mut self, block: &ContentBlock) -> usize {
        match block {
            ContentBlock::Text { text } => self.count_text(text),
            ContentBlock::Image { width, height, .. } => image_tokens(*width, *height),
            ContentBlock::ToolUse { name, input, .. } => {
                let serialized = input.to_string();
                self.count_text(name) + self.count_text(&serialized) + TOOL_FRAMING_TOKENS
            }
            ContentBlock::ToolResult { content, .. } => self.count_text(content) + TOOL_FRAMING_TOKENS,
        }
    }

    fn count_text(&mut self, text: &str) -> usize {
        match self.counter.count_tokens(text) {
            Ok(tokens) => tokens,
            Err(err) => {
                self.fallbacks += 1;
                tracing::warn!(error = %err, "tokenizer failed, using character heuristic");
                approx_tokens(text)
            }
        }
    }
}

/// `IMAGE_BASE_TOKENS + ceil(width * height / IMAGE_PIXELS_PER_TOKEN)`
pub fn image_tokens(width: u32, height: u32) -> usize {
    let pixels = u64::from(width) * u64::from(height);
    let resolution = (pixels + IMAGE_PIXELS_PER_TOKEN - 1) / IMAGE_PIXELS_PER_TOKEN;
    IMAGE_BASE_TOKENS.saturating_add(usize::try_from(resolution).unwrap_or(usize::MAX))
}
