// HTTP plumbing underneath the GitHub client
//
// The retry/rate-limit policy lives in `client.rs`; this file only knows how
// to put one request on the wire and hand back what came back.
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, AUTHORIZATION, USER_AGENT};
use thiserror::Error;

use crate::error::{GitHubError, Result};

pub const GITHUB_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_USER_AGENT: &str = "github-topic-suggester-dataset-retriever";

/// Everything the transport needs to talk to GitHub
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub token: String,
    pub user_agent: String,
    pub accept_language: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            base_url: GITHUB_API_BASE.to_string(),
            token: token.into(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: "en-US".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// For GitHub Enterprise or a local test server
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// The two kinds of calls we ever make
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiRequest {
    /// Plain REST read, e.g. `repos/rust-lang/rust/readme`
    Get { path: String },
    /// GraphQL query POSTed to the `graphql` endpoint
    Graphql { query: String },
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        ApiRequest::Get { path: path.into() }
    }

    pub fn graphql(query: impl Into<String>) -> Self {
        ApiRequest::Graphql {
            query: query.into(),
        }
    }

    /// Path relative to the API base URL
    pub fn path(&self) -> &str {
        match self {
            ApiRequest::Get { path } => path,
            ApiRequest::Graphql { .. } => "graphql",
        }
    }
}

impl fmt::Display for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiRequest::Get { path } => write!(f, "GET {}", path),
            ApiRequest::Graphql { .. } => write!(f, "POST graphql"),
        }
    }
}

/// What came back from the server, before any interpretation
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    pub status: u16,
    pub url: String,
    /// Header names are stored lowercased
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn is_error(&self) -> bool {
        self.status >= 400
    }
}

/// Low-level failures that never produced an HTTP status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    Timeout,
    Connect,
    Other,
}

#[derive(Error, Debug, Clone)]
#[error("{kind:?}: {message}")]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            BackendErrorKind::Timeout
        } else if err.is_connect() {
            BackendErrorKind::Connect
        } else {
            BackendErrorKind::Other
        };
        BackendError::new(kind, err.to_string())
    }
}

/// Sends exactly one request and reports exactly what happened
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpBackend: Send + Sync {
    async fn execute(&self, request: &ApiRequest) -> std::result::Result<RawResponse, BackendError>;
}

/// reqwest-backed implementation used outside of tests
pub struct ReqwestBackend {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestBackend {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|_| GitHubError::InvalidHeader("User-Agent"))?,
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&config.accept_language)
                .map_err(|_| GitHubError::InvalidHeader("Accept-Language"))?,
        );
        let mut auth = HeaderValue::from_str(&format!("bearer {}", config.token))
            .map_err(|_| GitHubError::InvalidHeader("Authorization"))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        // No keep-alive: fresh connection per call
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .pool_max_idle_per_host(0)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn execute(&self, request: &ApiRequest) -> std::result::Result<RawResponse, BackendError> {
        let url = format!("{}/{}", self.base_url, request.path());

        let builder = match request {
            ApiRequest::Get { .. } => self.client.get(&url),
            ApiRequest::Graphql { query } => self
                .client
                .post(&url)
                .json(&serde_json::json!({ "query": query })),
        };

        let response = builder.send().await?;

        let status = response.status().as_u16();
        let url = response.url().to_string();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.text().await?;

        Ok(RawResponse {
            status,
            url,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_paths() {
        assert_eq!(
            ApiRequest::get("repos/rust-lang/rust/readme").path(),
            "repos/rust-lang/rust/readme"
        );
        assert_eq!(ApiRequest::graphql("query { viewer { login } }").path(), "graphql");
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let response = RawResponse::new(403, "").with_header("X-RateLimit-Remaining", "0");
        assert_eq!(response.header("x-ratelimit-remaining"), Some("0"));
        assert_eq!(response.header("X-RATELIMIT-REMAINING"), Some("0"));
        assert!(response.is_error());
    }

    #[test]
    fn test_backend_builds_with_default_config() {
        let config = ClientConfig::new("ghp_test");
        assert!(ReqwestBackend::new(&config).is_ok());
    }

    #[test]
    fn test_backend_rejects_token_with_newline() {
        let config = ClientConfig::new("ghp_bad\ntoken");
        assert!(matches!(
            ReqwestBackend::new(&config),
            Err(GitHubError::InvalidHeader("Authorization"))
        ));
    }
}
