//! Inference provider trait — the seam between reply-coach and the model.
//!
//! The reply service only depends on `InferenceClient`. Gemini is the
//! production implementation; tests substitute a scripted fake.

use super::types::ComposedPrompt;
use std::future::Future;

/// Errors from the inference collaborator. Passed through to callers unchanged.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("No API key configured — set GEMINI_API_KEY or run `reply-coach set-key`")]
    MissingApiKey,
    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),
    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Model returned an empty response")]
    EmptyResponse,
    #[error("Unsupported image #{index}: {reason}")]
    UnsupportedImage { index: usize, reason: String },
    #[error("Response blocked by the model: {0}")]
    Blocked(String),
}

impl From<reqwest::Error> for InferenceError {
    /// Drops the request URL so credentials never reach error text or logs.
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.without_url())
    }
}

/// A model that can read screenshots and write a reply.
pub trait InferenceClient: Send + Sync {
    /// Generate a reply for a composed prompt.
    fn generate(
        &self,
        prompt: &ComposedPrompt,
    ) -> impl Future<Output = Result<String, InferenceError>> + Send;

    /// Continue the conversation: original prompt, the model's previous
    /// reply, then a follow-up instruction from the user.
    fn refine(
        &self,
        prompt: &ComposedPrompt,
        previous_reply: &str,
        instruction: &str,
    ) -> impl Future<Output = Result<String, InferenceError>> + Send;

    /// Text-only call used for style analysis.
    fn analyze_text(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<String, InferenceError>> + Send;
}

/// Provider metadata shown by `reply-coach status`.
#[derive(Debug, Clone)]
pub struct ProviderInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub env_key: &'static str,
    pub input_cost_per_million: f64,
    pub output_cost_per_million: f64,
}

pub const GEMINI: ProviderInfo = ProviderInfo {
    id: "gemini",
    name: "Gemini Flash",
    env_key: "GEMINI_API_KEY",
    input_cost_per_million: 0.10,
    output_cost_per_million: 0.40,
};

impl ProviderInfo {
    /// Estimated USD cost of one call.
    pub fn estimate_cost(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        (input_tokens as f64 * self.input_cost_per_million
            + output_tokens as f64 * self.output_cost_per_million)
            / 1_000_000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_estimate() {
        let cost = GEMINI.estimate_cost(1_000_000, 1_000_000);
        assert!((cost - 0.50).abs() < 1e-9);
        assert_eq!(GEMINI.estimate_cost(0, 0), 0.0);
    }
}
