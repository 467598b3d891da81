use repoharvest_api::Cursor;
use serde::{Deserialize, Serialize};

/// One discovered repository, as handed to the chunk sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    /// GitHub node id, unique per platform
    pub id: String,
    pub name: String,
    /// `owner/name`
    pub name_with_owner: String,
    pub stars: u64,
    pub forks: u64,
    pub primary_language: Option<String>,
    /// In the order GitHub returned them
    pub languages: Vec<String>,
    pub url: String,
    pub description: Option<String>,
    /// Topic names only
    pub topics: Vec<String>,
    /// Filled in by the README enricher
    pub readme: Option<String>,
}

impl RepositoryRecord {
    pub fn has_topics(&self) -> bool {
        !self.topics.is_empty()
    }
}

/// One batch of enriched records plus where to pick up next
#[derive(Debug, Clone)]
pub struct Chunk {
    pub records: Vec<RepositoryRecord>,
    /// `None` means GitHub has nothing more for us
    pub next_cursor: Option<Cursor>,
    /// Threshold the continuation cursor belongs to
    pub next_min_stars: u64,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_exhausted(&self) -> bool {
        self.next_cursor.is_none()
    }
}
