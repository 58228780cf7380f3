//! Deterministic context-window optimization for AI conversation transcripts.
//!
//! `context-optimizer` keeps a growing conversation within a model's input
//! budget by removal only: repeated file reads are deduplicated, and whole
//! exchanges are dropped by priority when that is not enough. Prompt-cache
//! boundaries are planned for providers that support them. All operations
//! are deterministic and synchronous. Identical inputs always produce
//! identical outputs, and the engine performs no I/O.
//!
//! ```ignore
//! let optimizer = ContextOptimizer::default();
//! let profile = ContextWindowProfile::from_context_window(200_000);
//! let result = optimizer.optimize(&messages, &profile)?;
//! println!("{}", result.to_log_string());
//! ```

pub mod cache;
pub mod dedup;
pub mod optimizer;
pub mod segments;
pub mod tokens;
pub mod types;

pub use optimizer::{ContextOptimizer, OptimizerConfig};
pub use types::{ContentBlock, ContextWindowProfile, Message, OptimizationResult, OptimizeError, Role};
