use repoharvest_api::Cursor;

use crate::{parser::SearchPage, Result};

/// Where search pages and READMEs come from
///
/// The pagination controller only talks to this trait, so it doesn't care
/// whether pages come from GitHub or from a test fixture.
#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    /// Fetch and parse one page of repositories with more than `min_stars` stars
    async fn search_page(&self, min_stars: u64, cursor: &Cursor) -> Result<SearchPage>;

    /// README text for `owner/name`, or `None` if there isn't a usable one
    async fn readme(&self, name_with_owner: &str) -> Result<Option<String>>;
}
