// Trait abstractions for the two upstream engines.
//
// TextEngine wraps the chat-completions client, VideoSearcher wraps the
// YouTube client. Retrieval only ever sees these traits, so the mocks in
// testing.rs can drive every fallback and timeout path without a network.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use ai_client::OpenAi;
use youtube_client::{SearchOptions, VideoRecord, YoutubeClient};

use crate::retrieval::NetworkPath;

// ---------------------------------------------------------------------------
// TextEngine
// ---------------------------------------------------------------------------

#[async_trait]
pub trait TextEngine: Send + Sync {
    /// Send `prompt` with the fixed `system` block over `path`. Returns the
    /// raw reply text. `timeout` is a transport hint; the caller enforces
    /// its own deadline as well.
    async fn answer(
        &self,
        path: &NetworkPath,
        system: &str,
        prompt: &str,
        timeout: Duration,
    ) -> Result<String>;
}

#[async_trait]
impl TextEngine for OpenAi {
    async fn answer(
        &self,
        path: &NetworkPath,
        system: &str,
        prompt: &str,
        timeout: Duration,
    ) -> Result<String> {
        let proxy = match path {
            NetworkPath::Direct => None,
            NetworkPath::Proxy(prefix) => Some(prefix.as_str()),
        };
        self.chat_completion_via(proxy, system, prompt, Some(timeout))
            .await
    }
}

// ---------------------------------------------------------------------------
// VideoSearcher
// ---------------------------------------------------------------------------

#[async_trait]
pub trait VideoSearcher: Send + Sync {
    /// Video hits for `query` in upstream relevance order.
    async fn search(&self, query: &str, timeout: Duration) -> Result<Vec<VideoRecord>>;
}

#[async_trait]
impl VideoSearcher for YoutubeClient {
    async fn search(&self, query: &str, timeout: Duration) -> Result<Vec<VideoRecord>> {
        Ok(self
            .search_videos(query, &SearchOptions::default(), Some(timeout))
            .await?)
    }
}
