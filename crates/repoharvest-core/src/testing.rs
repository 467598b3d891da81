// In-memory SearchProvider for unit tests
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use repoharvest_api::Cursor;

use crate::{models::RepositoryRecord, parser::SearchPage, search::SearchProvider, Result};

/// Serves queued pages in order, then empty pages forever
pub(crate) struct FakeProvider {
    pages: Mutex<VecDeque<SearchPage>>,
    search_calls: Mutex<Vec<(u64, Cursor)>>,
    readme_calls: Mutex<Vec<String>>,
    missing_readmes: HashSet<String>,
}

impl FakeProvider {
    pub(crate) fn new(pages: Vec<SearchPage>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
            search_calls: Mutex::new(Vec::new()),
            readme_calls: Mutex::new(Vec::new()),
            missing_readmes: HashSet::new(),
        }
    }

    pub(crate) fn without_readme(mut self, name_with_owner: &str) -> Self {
        self.missing_readmes.insert(name_with_owner.to_string());
        self
    }

    pub(crate) fn search_calls(&self) -> Vec<(u64, Cursor)> {
        self.search_calls.lock().unwrap().clone()
    }

    pub(crate) fn readme_calls(&self) -> Vec<String> {
        self.readme_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for FakeProvider {
    async fn search_page(&self, min_stars: u64, cursor: &Cursor) -> Result<SearchPage> {
        self.search_calls
            .lock()
            .unwrap()
            .push((min_stars, cursor.clone()));
        Ok(self.pages.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn readme(&self, name_with_owner: &str) -> Result<Option<String>> {
        self.readme_calls
            .lock()
            .unwrap()
            .push(name_with_owner.to_string());

        if self.missing_readmes.contains(name_with_owner) {
            return Ok(None);
        }
        let name = name_with_owner.rsplit('/').next().unwrap_or(name_with_owner);
        Ok(Some(format!("# {}", name)))
    }
}

/// A record with one topic, owned by `owner`
pub(crate) fn record(id: &str, stars: u64) -> RepositoryRecord {
    RepositoryRecord {
        id: id.to_string(),
        name: id.to_string(),
        name_with_owner: format!("owner/{}", id),
        stars,
        forks: 1,
        primary_language: Some("Rust".to_string()),
        languages: vec!["Rust".to_string()],
        url: format!("https://github.com/owner/{}", id),
        description: Some(format!("{} does things", id)),
        topics: vec!["cli".to_string()],
        readme: None,
    }
}

pub(crate) fn page(records: Vec<RepositoryRecord>, next_cursor: Option<&str>) -> SearchPage {
    SearchPage {
        records,
        next_cursor: next_cursor.map(str::to_string),
    }
}
