use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::identifiers::FilePath;

/// Author of a message.
///
/// Transcripts arrive from outside the engine, so any role string is
/// accepted on deserialization; unrecognized ones are kept as
/// [`Role::Other`] and excluded by the optimizer with a warning.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    User,
    Assistant,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Other(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Role::Other(_))
    }
}

impl From<String> for Role {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "user" => Role::User,
            "assistant" => Role::Assistant,
            _ => Role::Other(raw),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribution supplied by the caller: this tool result renders the
/// contents of the file at `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRead {
    pub path: FilePath,
}

/// One unit of message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Image {
        media_type: String,
        data: String,
        width: u32,
        height: u32,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default)]
        is_error: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_read: Option<FileRead>,
    },
}

/// Reasons a block or message cannot be forwarded to a model.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Malformed {
    #[error("unknown message role: {role}")]
    UnknownRole { role: String },
    #[error("tool use has an empty id")]
    EmptyToolUseId,
    #[error("tool use has an empty name")]
    EmptyToolName,
    #[error("tool result has an empty tool_use_id")]
    EmptyToolResultId,
    #[error("file read has an empty path")]
    EmptyFileReadPath,
    #[error("image has no data")]
    EmptyImageData,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    pub fn image(media_type: impl Into<String>, data: impl Into<String>, width: u32, height: u32) -> Self {
        ContentBlock::Image {
            media_type: media_type.into(),
            data: data.into(),
            width,
            height,
        }
    }

    pub fn tool_use(id: impl Into<String>, name: impl Into<String>, input: serde_json::Value) -> Self {
        ContentBlock::ToolUse {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    pub fn tool_result(tool_use_id: impl Into<String>, content: impl Into<String>) -> Self {
        ContentBlock::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
            is_error: false,
            file_read: None,
        }
    }

    pub fn tool_error(tool_use_id: impl Into<String>, content: impl Into<String>) -> Self {
        ContentBlock::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
            is_error: true,
            file_read: None,
        }
    }

    /// A tool result the caller attributes to reading `path`.
    pub fn file_read(tool_use_id: impl Into<String>, path: &str, content: impl Into<String>) -> Self {
        ContentBlock::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
            is_error: false,
            file_read: Some(FileRead {
                path: FilePath::new(path),
            }),
        }
    }

    /// Path and content of a file-read result, if this block is one.
    pub fn as_file_read(&self) -> Option<(&FilePath, &str)> {
        match self {
            ContentBlock::ToolResult {
                content,
                file_read: Some(read),
                ..
            } => Some((&read.path, content.as_str())),
            _ => None,
        }
    }

    pub fn is_tool(&self) -> bool {
        matches!(self, ContentBlock::ToolUse { .. } | ContentBlock::ToolResult { .. })
    }

    pub fn validate(&self) -> Result<(), Malformed> {
        match self {
            ContentBlock::Text { .. } => Ok(()),
            ContentBlock::Image { data, .. } => {
                if data.is_empty() {
                    Err(Malformed::EmptyImageData)
                } else {
                    Ok(())
                }
            }
            ContentBlock::ToolUse { id, name, .. } => {
                if id.is_empty() {
                    Err(Malformed::EmptyToolUseId)
                } else if name.is_empty() {
                    Err(Malformed::EmptyToolName)
                } else {
                    Ok(())
                }
            }
            ContentBlock::ToolResult {
                tool_use_id,
                file_read,
                ..
            } => {
                if tool_use_id.is_empty() {
                    return Err(Malformed::EmptyToolResultId);
                }
                match file_read {
                    Some(read) if read.path.is_empty() => Err(Malformed::EmptyFileReadPath),
                    _ => Ok(()),
                }
            }
        }
    }
}

/// A single conversation turn.
///
/// The engine never mutates a caller's messages; every stage produces a new list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Message {
    pub fn new(role: Role, content: Vec<ContentBlock>) -> Self {
        Self { role, content }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![ContentBlock::text(text)])
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, vec![ContentBlock::text(text)])
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}
