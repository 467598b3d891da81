use thiserror::Error;

/// Errors the GitHub transport lets escape.
///
/// Most failures never show up here: timeouts, rate limits, 404s and
/// forbidden resources are absorbed by the client and turned into either a
/// retry or an empty result. What's left is the stuff no retry can fix.
#[derive(Error, Debug)]
pub enum GitHubError {
    #[error("Invalid or missing authentication. Check bearer token.")]
    AuthRequired,

    #[error("Invalid header value for {0}")]
    InvalidHeader(&'static str),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    ParseError(#[from] serde_json::Error),
}

impl GitHubError {
    /// Fatal errors abort the whole run instead of being treated as missing data
    pub fn is_fatal(&self) -> bool {
        matches!(self, GitHubError::AuthRequired)
    }
}

pub type Result<T> = std::result::Result<T, GitHubError>;
