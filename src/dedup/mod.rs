//! Removal of repeated file-read results.
//!
//! A long session re-reads the same files over and over; each read ships the
//! whole file again. This pass keeps the first copy of each unchanged file
//! and drops re-reads that arrive within `keep_threshold` messages of the
//! previous observation. Reads further apart are treated as deliberate
//! refreshes and kept.

pub mod record;

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::tokens::{TokenAccountant, TokenCounter};
use crate::types::{ContentHash, FilePath, Message};

pub use record::{FileReadRecord, Observation};

/// Default number of messages within which an identical re-read is dropped.
pub const DEFAULT_KEEP_THRESHOLD: usize = 5;

#[derive(Debug, Clone)]
pub struct DedupOutcome {
    pub messages: Vec<Message>,
    pub blocks_removed: usize,
    pub tokens_reclaimed: usize,
    /// Messages whose every block was a dropped duplicate.
    pub empty_messages_dropped: usize,
    /// Final state of every path seen, sorted by path.
    pub records: Vec<FileReadRecord>,
}

/// Single sweep over `messages`, O(blocks).
///
/// Block order inside a message is preserved, and a message whose blocks were
/// all dropped disappears rather than remaining as an empty shell.
pub fn deduplicate<T: TokenCounter>(
    messages: &[Message],
    keep_threshold: usize,
    accountant: &mut TokenAccountant<T>,
) -> DedupOutcome {
    let mut records: BTreeMap<FilePath, FileReadRecord> = BTreeMap::new();
    let mut output = Vec::with_capacity(messages.len());
    let mut blocks_removed = 0;
    let mut tokens_reclaimed = 0;
    let mut empty_messages_dropped = 0;

    for (index, message) in messages.iter().enumerate() {
        let mut kept = Vec::with_capacity(message.content.len());
        let mut removed_here = 0;

        for block in &message.content {
            let Some((path, content)) = block.as_file_read() else {
                kept.push(block.clone());
                continue;
            };

            let hash = ContentHash::from_content(content.as_bytes());
            let observation = match records.entry(path.clone()) {
                Entry::Occupied(mut entry) => entry.get_mut().observe(hash, index, keep_threshold),
                Entry::Vacant(entry) => {
                    entry.insert(FileReadRecord::new(path.clone(), hash, index));
                    Observation::New
                }
            };

            if observation.keeps() {
                kept.push(block.clone());
            } else {
                removed_here += 1;
                tokens_reclaimed += accountant.block_cost(block);
                tracing::debug!(path = path.as_str(), message = index, "dropping duplicate file read");
            }
        }

        blocks_removed += removed_here;

        if kept.is_empty() && removed_here > 0 {
            empty_messages_dropped += 1;
            continue;
        }

        output.push(Message::new(message.role.clone(), kept));
    }

    DedupOutcome {
        messages: output,
        blocks_removed,
        tokens_reclaimed,
        empty_messages_dropped,
        records: records.into_values().collect(),
    }
}
