use thiserror::Error;

pub type Result<T> = std::result::Result<T, YoutubeError>;

#[derive(Debug, Error)]
pub enum YoutubeError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for YoutubeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            YoutubeError::Timeout
        } else if err.is_decode() {
            YoutubeError::Parse(err.to_string())
        } else {
            YoutubeError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for YoutubeError {
    fn from(err: serde_json::Error) -> Self {
        YoutubeError::Parse(err.to_string())
    }
}
