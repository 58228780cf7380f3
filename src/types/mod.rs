pub mod conversation;
pub mod identifiers;
pub mod optimization;
pub mod profile;

pub use conversation::{ContentBlock, FileRead, Malformed, Message, Role};
pub use identifiers::{ContentHash, FilePath};
pub use optimization::{
    ConfigError, OptimizationMetrics, OptimizationResult, OptimizeError, SegmentScore, Strategy,
    Warning,
};
pub use profile::{ContextWindowProfile, ProfileError};
