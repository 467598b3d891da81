// GitHub API plumbing: transport, retry policy, search query and wire types
pub mod client;
pub mod error;
pub mod graphql;
pub mod http;
pub mod retry;
pub mod types;

// Re-export common types
pub use client::GitHubClient;
pub use error::{GitHubError, Result};
pub use graphql::{search_query, Cursor, PAGE_SIZE};
pub use http::{ApiRequest, BackendError, BackendErrorKind, ClientConfig, HttpBackend, RawResponse};
pub use retry::RetryConfig;
pub use types::{RepositoryNode, SearchResponse};
