//! Gemini Flash client — screenshots + prompt → reply text.
//!
//! Uses the non-streaming `generateContent` endpoint:
//! - API key in the `x-goog-api-key` header, never in the URL
//! - Screenshots sent as base64 `inlineData` parts ahead of the prompt text
//! - Reply text in `candidates[0].content.parts[*].text`
//! - Token usage in `usageMetadata`

use super::provider::{InferenceClient, InferenceError, GEMINI};
use super::prompts::REFINE_PREAMBLE;
use super::types::ComposedPrompt;
use base64::Engine;
use serde_json::{json, Value};

pub const GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const GEMINI_MAX_TOKENS: u32 = 256;
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiClient {
    api_key: Option<String>,
    model: String,
    base_url: String,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.is_empty()),
            model: model.into(),
            base_url: GEMINI_BASE_URL.to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Point at a different API root (proxy or local mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    async fn call(&self, contents: Value, temperature: f64) -> Result<String, InferenceError> {
        let api_key = self.api_key.as_deref().ok_or(InferenceError::MissingApiKey)?;
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        log::info!("[LLM] Provider: gemini");
        log::info!("[LLM] Model: {}", self.model);
        let start = std::time::Instant::now();

        let response = self
            .http
            .post(&url)
            .header("content-type", "application/json")
            .header("x-goog-api-key", api_key)
            .json(&json!({
                "contents": contents,
                "generationConfig": {
                    "maxOutputTokens": GEMINI_MAX_TOKENS,
                    "temperature": temperature
                }
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let preview: String = body.chars().take(200).collect();
            log::error!("[LLM] Gemini API returned {}: {}", status, preview);
            return Err(InferenceError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await?;
        log::info!("[LLM] API latency: {}ms", start.elapsed().as_millis());
        log_usage(&body);

        extract_reply(&body)
    }
}

impl InferenceClient for GeminiClient {
    async fn generate(&self, prompt: &ComposedPrompt) -> Result<String, InferenceError> {
        let contents = json!([user_turn(prompt)?]);
        let temperature = if prompt.variant.is_styled() { 0.9 } else { 0.7 };
        self.call(contents, temperature).await
    }

    async fn refine(
        &self,
        prompt: &ComposedPrompt,
        previous_reply: &str,
        instruction: &str,
    ) -> Result<String, InferenceError> {
        let follow_up = format!("{}\n\n{}", REFINE_PREAMBLE, instruction.trim());
        let contents = json!([
            user_turn(prompt)?,
            { "role": "model", "parts": [{ "text": previous_reply }] },
            { "role": "user", "parts": [{ "text": follow_up }] }
        ]);
        self.call(contents, 0.7).await
    }

    async fn analyze_text(&self, prompt: &str) -> Result<String, InferenceError> {
        let contents = json!([{ "role": "user", "parts": [{ "text": prompt }] }]);
        self.call(contents, 0.2).await
    }
}

/// First user turn: every screenshot as inline data, then the prompt text.
fn user_turn(prompt: &ComposedPrompt) -> Result<Value, InferenceError> {
    let mut parts = Vec::with_capacity(prompt.images.len() + 1);
    for (i, bytes) in prompt.images.iter().enumerate() {
        let mime = image_mime_type(bytes).map_err(|reason| InferenceError::UnsupportedImage {
            index: i + 1,
            reason,
        })?;
        parts.push(json!({
            "inlineData": {
                "mimeType": mime,
                "data": base64::engine::general_purpose::STANDARD.encode(bytes)
            }
        }));
    }
    parts.push(json!({ "text": prompt.prompt_text }));
    Ok(json!({ "role": "user", "parts": parts }))
}

/// MIME type of a screenshot, sniffed from its magic bytes.
pub fn image_mime_type(bytes: &[u8]) -> Result<&'static str, String> {
    let format = image::guess_format(bytes).map_err(|e| e.to_string())?;
    match format {
        image::ImageFormat::Png
        | image::ImageFormat::Jpeg
        | image::ImageFormat::WebP
        | image::ImageFormat::Gif => Ok(format.to_mime_type()),
        other => Err(format!("{:?} screenshots are not supported", other)),
    }
}

/// Pull the reply text out of a `generateContent` response body.
pub fn extract_reply(body: &Value) -> Result<String, InferenceError> {
    if let Some(reason) = body["promptFeedback"]["blockReason"].as_str() {
        log::warn!("[LLM] Prompt blocked: {}", reason);
        return Err(InferenceError::Blocked(reason.to_string()));
    }

    let candidate = &body["candidates"][0];
    if candidate["finishReason"].as_str() == Some("SAFETY") {
        return Err(InferenceError::Blocked("SAFETY".to_string()));
    }

    let text: String = candidate["content"]["parts"]
        .as_array()
        .map(|parts| parts.iter().filter_map(|p| p["text"].as_str()).collect())
        .unwrap_or_default();

    let reply = clean_reply(&text);
    if reply.is_empty() {
        log::warn!("[LLM] Empty reply from model");
        return Err(InferenceError::EmptyResponse);
    }
    Ok(reply)
}

/// Trim whitespace and a single pair of wrapping quotes.
fn clean_reply(text: &str) -> String {
    let trimmed = text.trim();
    for (open, close) in [('"', '"'), ('\u{201C}', '\u{201D}')] {
        if let Some(inner) = trimmed
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
        {
            if !inner.contains(open) && !inner.contains(close) {
                return inner.trim().to_string();
            }
        }
    }
    trimmed.to_string()
}

fn log_usage(body: &Value) {
    let usage = &body["usageMetadata"];
    let input_tokens = usage["promptTokenCount"].as_u64().unwrap_or(0);
    let output_tokens = usage["candidatesTokenCount"].as_u64().unwrap_or(0);
    if input_tokens > 0 || output_tokens > 0 {
        log::info!("[LLM] Input tokens: {}", input_tokens);
        log::info!("[LLM] Output tokens: {}", output_tokens);
        log::info!(
            "[LLM] Estimated cost: ${:.6}",
            GEMINI.estimate_cost(input_tokens, output_tokens)
        );
    }
}
