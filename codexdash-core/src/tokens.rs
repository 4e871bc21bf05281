//! Token accounting with two precision tiers.
//!
//! Every token category (prompt, completion, total) can carry an exact count
//! reported by the model and an estimate computed by the server. Resolution
//! priority per category is fixed:
//!
//! 1. exact, when present (even when it is `0`)
//! 2. estimate, when present
//! 3. `0`
//!
//! The two tiers are never summed for the same record.

use serde::{Deserialize, Serialize};

/// Resolve one token category: exact, then estimate, then zero.
pub fn resolve_tokens(exact: Option<i64>, estimate: Option<i64>) -> i64 {
    exact.or(estimate).unwrap_or(0)
}

/// Token counts as they appear on jobs and events.
///
/// Flattened into the parent record on the wire, so the field names match the
/// server's JSON columns directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCounts {
    #[serde(default)]
    pub prompt_tokens_exact: Option<i64>,
    #[serde(default)]
    pub completion_tokens_exact: Option<i64>,
    #[serde(default)]
    pub total_tokens_exact: Option<i64>,
    #[serde(default)]
    pub prompt_tokens_est: Option<i64>,
    #[serde(default)]
    pub completion_tokens_est: Option<i64>,
    #[serde(default)]
    pub total_tokens_est: Option<i64>,
}

impl TokenCounts {
    /// Exact counts only.
    pub fn exact(prompt: Option<i64>, completion: Option<i64>, total: Option<i64>) -> Self {
        Self {
            prompt_tokens_exact: prompt,
            completion_tokens_exact: completion,
            total_tokens_exact: total,
            ..Self::default()
        }
    }

    /// Estimated counts only.
    pub fn estimated(prompt: Option<i64>, completion: Option<i64>, total: Option<i64>) -> Self {
        Self {
            prompt_tokens_est: prompt,
            completion_tokens_est: completion,
            total_tokens_est: total,
            ..Self::default()
        }
    }

    pub fn prompt(&self) -> i64 {
        resolve_tokens(self.prompt_tokens_exact, self.prompt_tokens_est)
    }

    pub fn completion(&self) -> i64 {
        resolve_tokens(self.completion_tokens_exact, self.completion_tokens_est)
    }

    pub fn total(&self) -> i64 {
        resolve_tokens(self.total_tokens_exact, self.total_tokens_est)
    }

    /// True when no category carries any count.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
