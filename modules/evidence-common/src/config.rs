use std::env;
use std::time::Duration;

use crate::error::EvidenceError;

/// Alternate network paths tried after the primary text-engine call fails.
/// Each entry is a URL prefix; the target endpoint URL is appended to it
/// (percent-encoded when the prefix ends in `=`).
pub const DEFAULT_FALLBACK_PROXIES: &[&str] = &[
    "https://corsproxy.io/?url=",
    "https://api.allorigins.win/raw?url=",
    "https://cors-anywhere.herokuapp.com/",
    "https://thingproxy.freeboard.io/fetch/",
];

/// At most this many alternate paths are attempted.
pub const MAX_FALLBACK_PATHS: usize = 4;

pub const DEFAULT_TEXT_MODEL: &str = "sonar";
pub const DEFAULT_TEXT_BASE_URL: &str = "https://api.perplexity.ai";

/// Application configuration loaded from environment variables.
/// A missing API key disables the corresponding retrieval branch rather than
/// failing startup.
#[derive(Debug, Clone)]
pub struct Config {
    // Text-answer engine
    pub perplexity_api_key: Option<String>,
    pub perplexity_model: String,
    pub perplexity_base_url: String,
    pub fallback_proxies: Vec<String>,

    // Video-search engine
    pub youtube_api_key: Option<String>,

    // Timeouts
    pub primary_timeout: Duration,
    pub fallback_timeout: Duration,
    pub video_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            perplexity_api_key: None,
            perplexity_model: DEFAULT_TEXT_MODEL.to_string(),
            perplexity_base_url: DEFAULT_TEXT_BASE_URL.to_string(),
            fallback_proxies: DEFAULT_FALLBACK_PROXIES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            youtube_api_key: None,
            primary_timeout: Duration::from_secs(25),
            fallback_timeout: Duration::from_secs(10),
            video_timeout: Duration::from_secs(15),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, EvidenceError> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let config = Self {
            perplexity_api_key: non_empty_env("PERPLEXITY_API_KEY"),
            perplexity_model: non_empty_env("PERPLEXITY_MODEL").unwrap_or(defaults.perplexity_model),
            perplexity_base_url: non_empty_env("PERPLEXITY_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.perplexity_base_url),
            fallback_proxies: match non_empty_env("EVIDENCE_FALLBACK_PROXIES") {
                Some(list) => parse_proxy_list(&list),
                None => defaults.fallback_proxies,
            },
            youtube_api_key: non_empty_env("YOUTUBE_API_KEY"),
            primary_timeout: secs_env("EVIDENCE_PRIMARY_TIMEOUT_SECS", defaults.primary_timeout)?,
            fallback_timeout: secs_env("EVIDENCE_FALLBACK_TIMEOUT_SECS", defaults.fallback_timeout)?,
            video_timeout: secs_env("EVIDENCE_VIDEO_TIMEOUT_SECS", defaults.video_timeout)?,
        };

        config.log_keys();
        Ok(config)
    }

    /// True when at least one retrieval branch has credentials.
    pub fn any_source_configured(&self) -> bool {
        self.perplexity_api_key.is_some() || self.youtube_api_key.is_some()
    }

    fn log_keys(&self) {
        fn preview_opt(val: &Option<String>) -> String {
            match val {
                Some(v) if !v.is_empty() => {
                    let n = v.char_indices().nth(5).map(|(i, _)| i).unwrap_or(v.len());
                    format!("{}...({} chars)", &v[..n], v.len())
                }
                _ => "<not set>".to_string(),
            }
        }

        tracing::info!("Config loaded:");
        tracing::info!("  PERPLEXITY_API_KEY: {}", preview_opt(&self.perplexity_api_key));
        tracing::info!("  PERPLEXITY_MODEL: {}", self.perplexity_model);
        tracing::info!("  YOUTUBE_API_KEY: {}", preview_opt(&self.youtube_api_key));
        tracing::info!("  fallback paths: {}", self.fallback_proxies.len());
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn secs_env(key: &str, default: Duration) -> Result<Duration, EvidenceError> {
    match non_empty_env(key) {
        Some(raw) => raw
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| EvidenceError::Config(format!("{key} must be a whole number of seconds"))),
        None => Ok(default),
    }
}

/// Split a comma-separated proxy list, keeping order and at most
/// `MAX_FALLBACK_PATHS` entries.
pub fn parse_proxy_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(MAX_FALLBACK_PATHS)
        .map(str::to_string)
        .collect()
}
