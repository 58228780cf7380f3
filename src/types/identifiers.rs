use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Normalized path of a file whose contents a tool result carries.
///
/// Used as the partition key of the deduplicator: two reads only interact
/// when their normalized paths are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct FilePath(String);

impl FilePath {
    pub fn new(raw: &str) -> Self {
        FilePath(normalize_path(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for FilePath {
    fn from(raw: String) -> Self {
        FilePath::new(&raw)
    }
}

impl From<FilePath> for String {
    fn from(path: FilePath) -> Self {
        path.0
    }
}

/// Normalization rules:
/// - `\` becomes `/`
/// - leading `./` segments are dropped
/// - runs of `/` collapse to one
///
/// Case is preserved, file systems disagree on it.
fn normalize_path(raw: &str) -> String {
    let forward = raw.trim().replace('\\', "/");

    let mut trimmed = forward.as_str();
    while let Some(rest) = trimmed.strip_prefix("./") {
        trimmed = rest.trim_start_matches('/');
    }

    let mut normalized = String::with_capacity(trimmed.len());
    let mut prev_slash = false;
    for c in trimmed.chars() {
        if c == '/' {
            if prev_slash {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        normalized.push(c);
    }

    normalized
}

/// Content hash, `sha256:<hex>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn from_content(content: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content);

        let hash = hasher.finalize();
        let hex = hex::encode(hash);

        ContentHash(format!("sha256:{hex}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
