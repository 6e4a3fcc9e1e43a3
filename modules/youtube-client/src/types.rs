use chrono::{DateTime, Utc};
use serde::Deserialize;

// --- Normalized output ---

/// A video search hit with the fields the evidence pipeline consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoRecord {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub channel_title: String,
    pub published_at: Option<DateTime<Utc>>,
}

impl VideoRecord {
    /// Canonical watch link for this video.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.video_id)
    }
}

// --- search.list wire types ---

/// Response envelope of `GET /youtube/v3/search`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchListResponse {
    #[serde(default)]
    pub items: Vec<SearchResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    pub id: ResourceId,
    pub snippet: Option<Snippet>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceId {
    pub kind: Option<String>,
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Snippet {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "channelTitle")]
    pub channel_title: Option<String>,
    #[serde(rename = "publishedAt")]
    pub published_at: Option<DateTime<Utc>>,
}

impl SearchResult {
    /// Convert to a `VideoRecord`. Channels and playlists (no `videoId`) and
    /// hits without a snippet yield `None`.
    pub fn into_record(self) -> Option<VideoRecord> {
        let video_id = self.id.video_id.filter(|id| !id.is_empty())?;
        let snippet = self.snippet?;
        Some(VideoRecord {
            video_id,
            title: unescape_html(snippet.title.as_deref().unwrap_or_default()),
            description: unescape_html(snippet.description.as_deref().unwrap_or_default()),
            channel_title: unescape_html(snippet.channel_title.as_deref().unwrap_or_default()),
            published_at: snippet.published_at,
        })
    }
}

/// search.list returns titles with HTML entities escaped.
fn unescape_html(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

// --- Request options ---

/// Fixed parameters sent with every search.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub max_results: u32,
    pub region_code: String,
    pub relevance_language: String,
    pub safe_search: String,
    pub order: String,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_results: 10,
            region_code: "KR".to_string(),
            relevance_language: "ko".to_string(),
            safe_search: "strict".to_string(),
            order: "relevance".to_string(),
        }
    }
}
