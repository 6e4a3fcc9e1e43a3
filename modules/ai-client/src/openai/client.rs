use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use tracing::debug;

use super::types::*;
use crate::util::truncate_to_char_boundary;

/// Error bodies from proxies are often whole HTML pages.
const MAX_ERROR_BODY_BYTES: usize = 500;

pub(crate) struct OpenAiClient {
    api_key: String,
    http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(api_key: &str, http: reqwest::Client) -> Self {
        Self {
            api_key: api_key.to_string(),
            http,
        }
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// POST a chat request to `url` (the full endpoint, possibly proxied).
    pub async fn chat(
        &self,
        url: &str,
        request: &ChatRequest,
        timeout: Option<Duration>,
    ) -> Result<ChatResponse> {
        debug!(model = %request.model, url, "Chat completion request");

        let mut builder = self.http.post(url).headers(self.headers()?).json(request);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "Chat API error ({}): {}",
                status,
                truncate_to_char_boundary(&error_text, MAX_ERROR_BODY_BYTES)
            ));
        }

        Ok(response.json().await?)
    }
}
