// GitHub client: the one gate every request goes through
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::error::{GitHubError, Result};
use crate::http::{ApiRequest, ClientConfig, HttpBackend, RawResponse, ReqwestBackend};
use crate::retry::{
    is_rate_limited, rate_limit_wait, sleep_in_increments, RetryConfig, RATE_LIMIT_REMAINING,
    RATE_LIMIT_RESET,
};

/// What to do about a response with status >= 400
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    /// Wait this long, then try again
    Retry(Duration),
    /// Stop now and report "no result" to the caller
    GiveUp,
    /// Nothing will ever work with these credentials
    Fatal,
}

/// Decide how to react to a failed response
pub fn classify_error(response: &RawResponse, config: &RetryConfig, now: DateTime<Utc>) -> ErrorAction {
    match response.status {
        404 => {
            error!("Requested resource was not found under: {}", response.url);
            ErrorAction::GiveUp
        }
        401 => {
            error!("Invalid or missing authentication. Check bearer token.");
            ErrorAction::Fatal
        }
        403 if is_rate_limited(response) => {
            warn!("Request to {} reached rate limit threshold", response.url);
            ErrorAction::Retry(rate_limit_wait(response, now, config.retry_delay))
        }
        403 => {
            warn!("Access to {} is forbidden", response.url);
            ErrorAction::GiveUp
        }
        status => {
            warn!("Request failed with status code: {}", status);
            ErrorAction::Retry(config.retry_delay)
        }
    }
}

/// Rate-limit aware GitHub client
///
/// Every call either returns parsed JSON, returns `None` ("no result"), or
/// fails with [`GitHubError::AuthRequired`]. Timeouts, 5xx responses and
/// exhausted quotas are retried here, at most `max_attempts` times per call.
/// Callers treat `None` like an empty page or a missing README.
pub struct GitHubClient {
    backend: Arc<dyn HttpBackend>,
    retry_config: RetryConfig,
}

impl GitHubClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let backend = ReqwestBackend::new(&config)?;
        Ok(Self::with_backend(Arc::new(backend), RetryConfig::default()))
    }

    /// Build a client over any backend (tests plug in fakes here)
    pub fn with_backend(backend: Arc<dyn HttpBackend>, retry_config: RetryConfig) -> Self {
        Self {
            backend,
            retry_config,
        }
    }

    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry_config
    }

    /// Send one logical request, retrying as the failure kind allows
    pub async fn send(&self, request: &ApiRequest) -> Result<Option<Value>> {
        let max_attempts = self.retry_config.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            let wait = match self.backend.execute(request).await {
                Ok(response) if !response.is_error() => {
                    log_quota(&response);
                    return Ok(decode_body(request, &response));
                }
                Ok(response) => match classify_error(&response, &self.retry_config, Utc::now()) {
                    ErrorAction::GiveUp => return Ok(None),
                    ErrorAction::Fatal => return Err(GitHubError::AuthRequired),
                    ErrorAction::Retry(wait) => wait,
                },
                Err(err) => {
                    warn!(
                        "{} failed ({}). Waiting {}s before continuing.",
                        request,
                        err,
                        self.retry_config.retry_delay.as_secs()
                    );
                    self.retry_config.retry_delay
                }
            };

            if attempt == max_attempts {
                break;
            }

            warn!(
                "Waiting {}s for retry (attempt {}/{})",
                wait.as_secs(),
                attempt,
                max_attempts
            );
            sleep_in_increments(wait, self.retry_config.max_sleep_increment).await;
        }

        warn!("Giving up on {} after {} attempts", request, max_attempts);
        Ok(None)
    }

    pub async fn get(&self, path: &str) -> Result<Option<Value>> {
        self.send(&ApiRequest::get(path)).await
    }

    /// Run a GraphQL query; GraphQL-level errors are logged, not raised
    pub async fn graphql(&self, query: &str) -> Result<Option<Value>> {
        let result = self.send(&ApiRequest::graphql(query)).await?;

        if let Some(errors) = result
            .as_ref()
            .and_then(|v| v.get("errors"))
            .and_then(Value::as_array)
        {
            for err in errors {
                let message = err
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error");
                warn!("GraphQL error: {}", message);
            }
        }

        Ok(result)
    }

    /// Fetch and decode a repository README
    ///
    /// Many repositories simply don't have one, so every kind of absence
    /// (404, forbidden, empty content, undecodable content) is `Ok(None)`.
    pub async fn get_readme(&self, name_with_owner: &str) -> Result<Option<String>> {
        let data = self
            .get(&format!("repos/{}/readme", name_with_owner))
            .await?;

        let content = data
            .as_ref()
            .and_then(|d| d.get("content"))
            .and_then(Value::as_str);

        Ok(content.and_then(|c| decode_readme(name_with_owner, c)))
    }

    /// Check the token works before starting a long run; returns the login
    pub async fn verify(&self) -> Result<Option<String>> {
        let user = self.get("user").await?;
        let login = user
            .as_ref()
            .and_then(|u| u.get("login"))
            .and_then(Value::as_str)
            .map(str::to_string);

        if let Some(ref login) = login {
            info!("Authenticated as {}", login);
        }
        Ok(login)
    }
}

fn decode_body(request: &ApiRequest, response: &RawResponse) -> Option<Value> {
    match serde_json::from_str(&response.body) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Response to {} was not valid JSON: {}", request, e);
            None
        }
    }
}

fn log_quota(response: &RawResponse) {
    if let Some(remaining) = response.header(RATE_LIMIT_REMAINING) {
        debug!(
            remaining = remaining,
            reset = response.header(RATE_LIMIT_RESET).unwrap_or("?"),
            "Rate limit quota"
        );
    }
}

/// GitHub wraps base64 content at 60 columns, so whitespace goes first
pub fn decode_readme(name_with_owner: &str, content: &str) -> Option<String> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }

    let bytes = match base64::engine::general_purpose::STANDARD.decode(compact.as_bytes()) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("README of {} is not valid base64: {}", name_with_owner, e);
            return None;
        }
    };

    match String::from_utf8(bytes) {
        Ok(text) => Some(text),
        Err(_) => {
            warn!("README of {} is not valid UTF-8", name_with_owner);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{BackendError, BackendErrorKind, MockHttpBackend};
    use tokio::time::Instant;

    fn client(mock: MockHttpBackend) -> GitHubClient {
        GitHubClient::with_backend(Arc::new(mock), RetryConfig::default())
    }

    #[tokio::test]
    async fn test_success_returns_json() {
        let mut mock = MockHttpBackend::new();
        mock.expect_execute()
            .times(1)
            .returning(|_| Ok(RawResponse::new(200, r#"{"login": "octocat"}"#)));

        let login = client(mock).verify().await.unwrap();
        assert_eq!(login.as_deref(), Some("octocat"));
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let mut mock = MockHttpBackend::new();
        mock.expect_execute()
            .times(1)
            .returning(|_| Ok(RawResponse::new(404, r#"{"message": "Not Found"}"#)));

        let result = client(mock).get("repos/nobody/nothing/readme").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_unauthorized_is_fatal() {
        let mut mock = MockHttpBackend::new();
        mock.expect_execute()
            .times(1)
            .returning(|_| Ok(RawResponse::new(401, r#"{"message": "Bad credentials"}"#)));

        let result = client(mock).graphql("query { viewer { login } }").await;
        assert!(matches!(result, Err(GitHubError::AuthRequired)));
    }

    #[tokio::test]
    async fn test_forbidden_without_quota_signal_is_not_retried() {
        let mut mock = MockHttpBackend::new();
        mock.expect_execute().times(1).returning(|_| {
            Ok(RawResponse::new(403, "{}").with_header("X-RateLimit-Remaining", "4000"))
        });

        let result = client(mock).get("repos/secret/repo/readme").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_error_is_retried_after_fixed_delay() {
        let mut mock = MockHttpBackend::new();
        let mut calls = 0;
        mock.expect_execute().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Ok(RawResponse::new(502, "Bad Gateway"))
            } else {
                Ok(RawResponse::new(200, r#"{"ok": true}"#))
            }
        });

        let started = Instant::now();
        let result = client(mock).get("rate_limit").await.unwrap();
        assert_eq!(result, Some(serde_json::json!({"ok": true})));
        assert!(started.elapsed() >= Duration::from_secs(10));
        assert!(started.elapsed() < Duration::from_secs(11));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_budget_caps_attempts() {
        let mut mock = MockHttpBackend::new();
        mock.expect_execute()
            .times(5)
            .returning(|_| Ok(RawResponse::new(500, "oops")));

        let result = client(mock).graphql("query { viewer { login } }").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_connection_errors_are_retried() {
        let mut mock = MockHttpBackend::new();
        let mut calls = 0;
        mock.expect_execute().times(3).returning(move |_| {
            calls += 1;
            match calls {
                1 => Err(BackendError::new(BackendErrorKind::Timeout, "timed out")),
                2 => Err(BackendError::new(BackendErrorKind::Connect, "connection reset")),
                _ => Ok(RawResponse::new(200, "{}")),
            }
        });

        let result = client(mock).get("user").await.unwrap();
        assert!(result.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_waits_until_reset() {
        let reset = (Utc::now().timestamp() + 5).to_string();
        let mut mock = MockHttpBackend::new();
        let mut calls = 0;
        mock.expect_execute().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Ok(RawResponse::new(403, "{}")
                    .with_header("X-RateLimit-Remaining", "0")
                    .with_header("X-RateLimit-Reset", reset.clone()))
            } else {
                Ok(RawResponse::new(200, "{}"))
            }
        });

        let started = Instant::now();
        let result = client(mock).get("user").await.unwrap();
        let waited = started.elapsed();

        assert!(result.is_some());
        assert!(waited >= Duration::from_secs(4), "waited {:?}", waited);
        assert!(waited <= Duration::from_secs(6), "waited {:?}", waited);
    }

    #[tokio::test]
    async fn test_invalid_json_body_is_no_result() {
        let mut mock = MockHttpBackend::new();
        mock.expect_execute()
            .times(1)
            .returning(|_| Ok(RawResponse::new(200, "<html>oops</html>")));

        assert!(client(mock).get("user").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_readme_is_fetched_from_repo_path_and_decoded() {
        let mut mock = MockHttpBackend::new();
        mock.expect_execute()
            .withf(|req| req == &ApiRequest::get("repos/rust-lang/rust/readme"))
            .times(1)
            .returning(|_| {
                Ok(RawResponse::new(
                    200,
                    r#"{"content": "SGVsbG8g\nV29ybGQ=\n", "encoding": "base64"}"#,
                ))
            });

        let readme = client(mock).get_readme("rust-lang/rust").await.unwrap();
        assert_eq!(readme.as_deref(), Some("Hello World"));
    }

    #[tokio::test]
    async fn test_missing_readme_is_absent() {
        let mut mock = MockHttpBackend::new();
        mock.expect_execute()
            .times(1)
            .returning(|_| Ok(RawResponse::new(404, "{}")));

        assert!(client(mock).get_readme("a/b").await.unwrap().is_none());
    }

    #[test]
    fn test_decode_readme_edge_cases() {
        assert_eq!(decode_readme("a/b", ""), None);
        assert_eq!(decode_readme("a/b", "\n"), None);
        assert_eq!(decode_readme("a/b", "not base64!!"), None);
        // 0xff 0xfe is not UTF-8
        assert_eq!(decode_readme("a/b", "//4="), None);
        assert_eq!(decode_readme("a/b", "IyBUaXRsZQ=="), Some("# Title".to_string()));
    }
}
