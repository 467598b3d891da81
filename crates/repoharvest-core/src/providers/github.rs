// GitHub provider implementation - bridges API client with SearchProvider trait
use async_trait::async_trait;
use repoharvest_api::{search_query, ClientConfig, Cursor, GitHubClient};
use tracing::debug;

use crate::{
    parser::{parse_search_page, SearchPage},
    search::SearchProvider,
    Result,
};

/// Wrapper around GitHubClient that implements SearchProvider
pub struct GitHubProvider {
    client: GitHubClient,
}

impl GitHubProvider {
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self {
            client: GitHubClient::new(config)?,
        })
    }

    pub fn from_client(client: GitHubClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &GitHubClient {
        &self.client
    }
}

#[async_trait]
impl SearchProvider for GitHubProvider {
    async fn search_page(&self, min_stars: u64, cursor: &Cursor) -> Result<SearchPage> {
        let query = search_query(min_stars, cursor);
        debug!("Searching stars:>{} after {}", min_stars, cursor);

        let response = self.client.graphql(&query).await?;
        Ok(parse_search_page(response.as_ref()))
    }

    async fn readme(&self, name_with_owner: &str) -> Result<Option<String>> {
        Ok(self.client.get_readme(name_with_owner).await?)
    }
}
