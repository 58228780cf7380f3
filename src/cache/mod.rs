//! Prompt-cache boundary planning.
//!
//! Providers that cache prompt prefixes need to know where a stable prefix
//! ends. This module only decides positions; applying them to a wire format
//! is the request builder's job.

pub mod boundaries;

pub use boundaries::{plan_cache_boundaries, BoundaryPolicy};
