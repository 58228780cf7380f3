use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    #[error("Allowed context size must be greater than zero")]
    ZeroAllowedSize,
    #[error("Allowed context size {allowed} exceeds maximum {max}")]
    AllowedExceedsMaximum { allowed: usize, max: usize },
    #[error("Caching threshold must be greater than zero when prompt caching is enabled")]
    ZeroCachingThreshold,
}

/// Per-model context window limits, supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextWindowProfile {
    /// Hard input limit of the model, in tokens.
    pub max_context_size: usize,
    /// Budget the optimizer targets; the difference is response headroom.
    pub max_allowed_size: usize,
    #[serde(default)]
    pub supports_prompt_caching: bool,
    /// Tokens accumulated since the previous cache boundary before a new one is placed.
    #[serde(default = "default_caching_threshold")]
    pub caching_threshold: usize,
}

fn default_caching_threshold() -> usize {
    ContextWindowProfile::DEFAULT_CACHING_THRESHOLD
}

impl ContextWindowProfile {
    pub const DEFAULT_CACHING_THRESHOLD: usize = 4_096;

    pub fn new(max_context_size: usize, max_allowed_size: usize) -> Self {
        Self {
            max_context_size,
            max_allowed_size,
            supports_prompt_caching: false,
            caching_threshold: Self::DEFAULT_CACHING_THRESHOLD,
        }
    }

    /// Derive the allowed size from a raw context window, reserving response
    /// headroom that grows with the window:
    ///
    /// | window | allowed |
    /// |--------|---------|
    /// | 64k    | window - 27k |
    /// | 128k   | window - 30k |
    /// | 200k   | window - 40k |
    /// | other  | max(window - 40k, 80% of window) |
    pub fn from_context_window(max_context_size: usize) -> Self {
        let allowed = match max_context_size {
            64_000 => max_context_size - 27_000,
            128_000 => max_context_size - 30_000,
            200_000 => max_context_size - 40_000,
            other => {
                let fractional = other / 5 * 4;
                other.saturating_sub(40_000).max(fractional)
            }
        };
        Self::new(max_context_size, allowed)
    }

    pub fn with_prompt_caching(mut self, caching_threshold: usize) -> Self {
        self.supports_prompt_caching = true;
        self.caching_threshold = caching_threshold;
        self
    }

    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.max_allowed_size == 0 {
            return Err(ProfileError::ZeroAllowedSize);
        }
        if self.max_allowed_size > self.max_context_size {
            return Err(ProfileError::AllowedExceedsMaximum {
                allowed: self.max_allowed_size,
                max: self.max_context_size,
            });
        }
        if self.supports_prompt_caching && self.caching_threshold == 0 {
            return Err(ProfileError::ZeroCachingThreshold);
        }
        Ok(())
    }
}
