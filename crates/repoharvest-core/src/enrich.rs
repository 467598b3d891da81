// README enrichment: one extra request per record
use tracing::debug;

use crate::{models::RepositoryRecord, search::SearchProvider, Result};

/// Attaches README text to records
///
/// This is the expensive step of a harvest (one request per repository), so
/// the controller only hands over records it intends to keep.
pub struct ReadmeEnricher<'a, P: SearchProvider + ?Sized> {
    provider: &'a P,
    fetched: usize,
}

impl<'a, P: SearchProvider + ?Sized> ReadmeEnricher<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self {
            provider,
            fetched: 0,
        }
    }

    /// Fill in `readme`; a repository without one gets `None`, not an error
    pub async fn enrich(&mut self, mut record: RepositoryRecord) -> Result<RepositoryRecord> {
        self.fetched += 1;
        record.readme = self.provider.readme(&record.name_with_owner).await?;

        if record.readme.is_none() {
            debug!("No README for {}", record.name_with_owner);
        }
        Ok(record)
    }

    /// README requests issued so far
    pub fn fetched(&self) -> usize {
        self.fetched
    }
}
