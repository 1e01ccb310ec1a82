//! Inference usage reports.

use serde::{Deserialize, Serialize};

/// Token counts reported by the upstream AI endpoint for one call.
///
/// The core never routes or retries the inference call itself; it only
/// meters the reported result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UsageReport {
    /// Tokens sent to the model.
    pub input_tokens: u64,

    /// Tokens produced by the model.
    pub output_tokens: u64,

    /// Total as reported upstream.
    pub total_tokens: u64,
}

impl UsageReport {
    /// Build a report from input/output counts.
    #[must_use]
    pub const fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    }
}
