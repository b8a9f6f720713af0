pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid session state: {0}")]
    InvalidState(String),

    #[error("Submission failed: {0}")]
    Submission(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Whether the caller can meaningfully retry the failed operation
    /// with the same inputs.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Network(_) | Error::Submission(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.status() == Some(reqwest::StatusCode::NOT_FOUND) {
            Error::NotFound("Resource not found".to_string())
        } else {
            Error::Network(err.to_string())
        }
    }
}
