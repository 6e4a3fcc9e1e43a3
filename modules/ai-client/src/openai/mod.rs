mod client;
pub(crate) mod types;

use std::time::Duration;

use anyhow::{anyhow, Result};

use crate::util::proxied_url;
use client::OpenAiClient;

const OPENAI_API_URL: &str = "https://api.openai.com/v1";

// =============================================================================
// OpenAi Agent
// =============================================================================

/// Client for any OpenAI-compatible `/chat/completions` endpoint
/// (OpenAI itself, Perplexity, OpenRouter, local gateways).
#[derive(Clone)]
pub struct OpenAi {
    api_key: String,
    pub(crate) model: String,
    base_url: Option<String>,
    max_tokens: u32,
    http: reqwest::Client,
}

impl OpenAi {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
            max_tokens: 4096,
            http: reqwest::Client::new(),
        }
    }

    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow!("OPENAI_API_KEY environment variable not set"))?;
        Ok(Self::new(api_key, model))
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into().trim_end_matches('/').to_string());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Get the model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Direct endpoint URL for chat completions.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.base_url.as_deref().unwrap_or(OPENAI_API_URL)
        )
    }

    fn client(&self) -> OpenAiClient {
        OpenAiClient::new(&self.api_key, self.http.clone())
    }

    /// Simple chat completion against the direct endpoint.
    pub async fn chat_completion(
        &self,
        system: impl Into<String>,
        user: impl Into<String>,
    ) -> Result<String> {
        self.chat_completion_via(None, system, user, None).await
    }

    /// Chat completion routed through an optional proxy prefix, with an
    /// optional transport-level timeout.
    pub async fn chat_completion_via(
        &self,
        proxy_prefix: Option<&str>,
        system: impl Into<String>,
        user: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<String> {
        let endpoint = self.endpoint();
        let url = match proxy_prefix {
            Some(prefix) => proxied_url(prefix, &endpoint),
            None => endpoint,
        };

        let request = types::ChatRequest::new(&self.model)
            .message(types::WireMessage::system(system))
            .message(types::WireMessage::user(user))
            .max_tokens(self.max_tokens)
            .temperature(0.0);

        let response = self.client().chat(&url, &request, timeout).await?;

        response
            .text()
            .ok_or_else(|| anyhow!("No content in chat completion response"))
    }
}
