use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvidenceError {
    #[error("Invalid search request: {0}")]
    Validation(String),

    /// No source needed by the request is configured. Distinct from an empty
    /// result: the caller should show "service unavailable", not "no results".
    #[error("Evidence service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
