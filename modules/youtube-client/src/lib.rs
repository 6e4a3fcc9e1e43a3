pub mod error;
pub mod types;

use std::time::Duration;

pub use error::{Result, YoutubeError};
pub use types::{SearchListResponse, SearchOptions, SearchResult, VideoRecord};

const BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

pub struct YoutubeClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl YoutubeClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Search for videos matching `query`. Returns records in the API's
    /// relevance order; non-video hits are skipped.
    pub async fn search_videos(
        &self,
        query: &str,
        options: &SearchOptions,
        timeout: Option<Duration>,
    ) -> Result<Vec<VideoRecord>> {
        let url = format!("{}/search", self.base_url);
        let max_results = options.max_results.to_string();

        let mut request = self.client.get(&url).query(&[
            ("part", "snippet"),
            ("type", "video"),
            ("q", query),
            ("maxResults", max_results.as_str()),
            ("regionCode", options.region_code.as_str()),
            ("relevanceLanguage", options.relevance_language.as_str()),
            ("safeSearch", options.safe_search.as_str()),
            ("order", options.order.as_str()),
            ("videoEmbeddable", "true"),
            ("key", self.api_key.as_str()),
        ]);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        tracing::debug!(query, max_results = options.max_results, "YouTube search request");

        let resp = request.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(YoutubeError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.text().await?;
        let list: SearchListResponse = serde_json::from_str(&body)?;
        let records: Vec<VideoRecord> = list
            .items
            .into_iter()
            .filter_map(SearchResult::into_record)
            .collect();

        tracing::info!(query, count = records.len(), "Fetched YouTube search results");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_base_url_trims_trailing_slash() {
        let client = YoutubeClient::new("key".into()).with_base_url("http://localhost:8080/");
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[tokio::test]
    async fn unreachable_host_is_a_network_error() {
        let client = YoutubeClient::new("key".into()).with_base_url("http://127.0.0.1:9");
        let err = client
            .search_videos("토론", &SearchOptions::default(), Some(Duration::from_millis(500)))
            .await
            .unwrap_err();
        assert!(matches!(err, YoutubeError::Network(_) | YoutubeError::Timeout));
    }
}
