use serde::Serialize;

use crate::types::{ContentHash, FilePath};

/// What one deduplication pass knows about a path.
///
/// Lives for a single pass; nothing carries over between calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReadRecord {
    pub path: FilePath,
    /// Hash of the most recently kept content.
    pub hash: ContentHash,
    pub first_seen: usize,
    pub last_seen: usize,
    pub observations: usize,
}

/// Decision for one file-read block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// First read of this path in the pass.
    New,
    /// Content differs from the record.
    Changed,
    /// Same content, but far enough back that the read counts as a refresh.
    Refresh,
    /// Same content within the keep threshold.
    Duplicate,
}

impl Observation {
    pub fn keeps(self) -> bool {
        !matches!(self, Observation::Duplicate)
    }
}

impl FileReadRecord {
    pub fn new(path: FilePath, hash: ContentHash, index: usize) -> Self {
        Self {
            path,
            hash,
            first_seen: index,
            last_seen: index,
            observations: 1,
        }
    }

    /// Fold another read of this path, seen at message `index`, into the record.
    pub fn observe(&mut self, hash: ContentHash, index: usize, keep_threshold: usize) -> Observation {
        self.observations += 1;

        if hash != self.hash {
            self.hash = hash;
            self.last_seen = index;
            return Observation::Changed;
        }

        let gap = index.saturating_sub(self.last_seen);
        self.last_seen = index;

        if gap > keep_threshold {
            Observation::Refresh
        } else {
            Observation::Duplicate
        }
    }
}
