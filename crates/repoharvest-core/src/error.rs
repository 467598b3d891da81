use repoharvest_api::GitHubError;
use thiserror::Error;

/// All the ways a harvest can go wrong
///
/// Transient API trouble never gets this far; the client retries it or turns
/// it into an empty result. What reaches here stops the run.
#[derive(Error, Debug)]
pub enum Error {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Export failed: {0}")]
    ExportError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<GitHubError> for Error {
    fn from(err: GitHubError) -> Self {
        if err.is_fatal() {
            Error::AuthError(err.to_string())
        } else {
            Error::ApiError(err.to_string())
        }
    }
}

impl Error {
    pub fn is_auth(&self) -> bool {
        matches!(self, Error::AuthError(_))
    }
}
