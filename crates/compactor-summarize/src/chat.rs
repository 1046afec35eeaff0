//! Summarization through an OpenAI-compatible chat completions endpoint

use crate::templates::build_prompt;
use compactor_core::{CompactPolicy, Message, SummarizationError, Summarizer};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on completion tokens regardless of the requested budget
pub const MAX_COMPLETION_TOKENS: usize = 2000;

/// LLM-backed summarizer; one blocking request per call, no retries
pub struct ChatSummarizer {
    model: String,
    api_key: String,
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl ChatSummarizer {
    pub fn new(
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, SummarizationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SummarizationError::Unavailable(e.to_string()))?;
        Ok(Self::with_client(model, api_key, client))
    }

    /// Read the API key from `OPENAI_API_KEY`
    pub fn from_env(model: impl Into<String>) -> Result<Self, SummarizationError> {
        match std::env::var(API_KEY_VAR) {
            Ok(key) if !key.trim().is_empty() => Self::new(model, key),
            _ => Err(SummarizationError::Unavailable(format!("{API_KEY_VAR} not set"))),
        }
    }

    pub fn with_client(
        model: impl Into<String>,
        api_key: impl Into<String>,
        client: reqwest::blocking::Client,
    ) -> Self {
        Self {
            model: model.into(),
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            client,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body(&self, prompt: &str, max_tokens: usize) -> Value {
        json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": 0.0,
            "max_tokens": max_tokens.min(MAX_COMPLETION_TOKENS),
        })
    }
}

/// Pull the first choice's text out of a chat completions response
fn extract_content(body: &Value) -> Result<String, SummarizationError> {
    let text = body["choices"][0]["message"]["content"]
        .as_str()
        .map(str::trim)
        .unwrap_or_default();
    if text.is_empty() {
        return Err(SummarizationError::EmptyResponse);
    }
    Ok(text.to_string())
}

impl Summarizer for ChatSummarizer {
    fn summarize(
        &self,
        messages: &[Message],
        max_tokens: usize,
        policy: &CompactPolicy,
    ) -> Result<String, SummarizationError> {
        let prompt = build_prompt(policy.strategy(), messages, max_tokens);
        debug!(
            model = %self.model,
            strategy = %policy.strategy(),
            messages = messages.len(),
            max_tokens,
            "requesting summary"
        );

        let request_failed = |e: reqwest::Error| SummarizationError::Request(e.to_string());
        let body: Value = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(&prompt, max_tokens))
            .send()
            .map_err(request_failed)?
            .error_for_status()
            .map_err(request_failed)?
            .json()
            .map_err(request_failed)?;

        extract_content(&body)
    }
}
