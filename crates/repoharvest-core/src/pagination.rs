//! Pagination controller: the loop that walks GitHub search page by page.
//!
//! GitHub's `after` cursor stops being trustworthy roughly 1000 results into
//! one search. We sort ascending by stars and search `stars:>N`, so once a
//! window of 1000 raw results has been read we can raise `N` to the highest
//! star count seen and start a fresh cursor. Overlap between windows is
//! absorbed by the seen-id set, which lives for the whole run.

use std::collections::HashSet;

use repoharvest_api::Cursor;
use tracing::{debug, info};

use crate::{
    enrich::ReadmeEnricher,
    models::{Chunk, RepositoryRecord},
    search::SearchProvider,
    Result,
};

/// Raw results read under one threshold before the cursor is abandoned
pub const WINDOW_SIZE: usize = 1000;

/// Running state of the retrieval loop (in memory only)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalState {
    /// Current `stars:>` threshold
    pub min_stars: u64,
    /// Cursor valid for `min_stars`
    pub cursor: Cursor,
    /// Raw results left before the current window expires
    pub window_remaining: usize,
    /// Raw results read since the controller was created
    pub total_read: usize,
    /// Search pages requested since the controller was created
    pub pages: usize,
}

impl RetrievalState {
    fn new(min_stars: u64) -> Self {
        Self {
            min_stars,
            cursor: Cursor::Start,
            window_remaining: WINDOW_SIZE,
            total_read: 0,
            pages: 0,
        }
    }

    /// Leave the current window: raise the threshold and start a new cursor
    ///
    /// If the page's top star count doesn't exceed the threshold we still
    /// move up by one, otherwise a plateau of equal star counts would be
    /// queried forever.
    fn advance_window(&mut self, page_max_stars: u64) {
        let next = if page_max_stars > self.min_stars {
            page_max_stars
        } else {
            self.min_stars + 1
        };

        info!(
            "Read {} results under stars:>{}; restarting search from stars:>{}",
            WINDOW_SIZE, self.min_stars, next
        );

        self.min_stars = next;
        self.cursor = Cursor::Start;
        self.window_remaining = WINDOW_SIZE;
    }
}

#[derive(Debug, Default)]
struct PageStats {
    duplicates: usize,
    without_topics: usize,
    without_readme: usize,
    kept: usize,
}

/// Drives search → dedup → topic filter → README enrichment across pages
pub struct PaginationController<P: SearchProvider> {
    provider: P,
    seen: HashSet<String>,
    state: RetrievalState,
}

impl<P: SearchProvider> PaginationController<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            seen: HashSet::new(),
            state: RetrievalState::new(0),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn state(&self) -> &RetrievalState {
        &self.state
    }

    /// Number of distinct repository ids seen this run
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    pub fn has_seen(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// Read one chunk of at most `chunk_size` enriched records
    ///
    /// Starts at `start_cursor` under the `min_stars` threshold and returns
    /// the records together with the continuation to pass to the next call.
    /// A `None` continuation cursor means there's nothing more to read.
    ///
    /// When the chunk fills up part-way through a page, the rest of that page
    /// is left untouched and the continuation points at the same page again;
    /// the already-taken rows are then skipped as duplicates.
    pub async fn read_chunk(
        &mut self,
        chunk_size: usize,
        min_stars: u64,
        start_cursor: Cursor,
    ) -> Result<Chunk> {
        if start_cursor.is_start() || min_stars != self.state.min_stars {
            self.state.window_remaining = WINDOW_SIZE;
        }
        self.state.min_stars = min_stars;
        self.state.cursor = start_cursor;

        info!(
            "Reading up to {} repositories with more than {} stars",
            chunk_size, min_stars
        );

        let mut records = Vec::with_capacity(chunk_size.min(WINDOW_SIZE));

        while records.len() < chunk_size {
            let cursor = self.state.cursor.clone();
            let threshold = self.state.min_stars;
            self.state.pages += 1;
            info!(
                "Reading page {} (stars:>{}, cursor {})",
                self.state.pages, threshold, cursor
            );

            let page = self.provider.search_page(threshold, &cursor).await?;
            if page.is_empty() {
                info!("No more data available in GitHub. Time to stop querying.");
                return Ok(self.finish(records, None));
            }

            let raw_count = page.raw_count();
            let page_max_stars = page.max_stars().unwrap_or(threshold);
            let page_cursor = page.next_cursor;

            let consumed = self.absorb_page(page.records, chunk_size, &mut records).await?;
            if !consumed {
                info!("Chunk filled part-way through the page; it will be read again next time");
                return Ok(self.finish(records, Some(cursor)));
            }

            self.state.total_read += raw_count;
            self.state.window_remaining = self.state.window_remaining.saturating_sub(raw_count);

            if self.state.window_remaining == 0 {
                self.state.advance_window(page_max_stars);
            } else {
                match page_cursor {
                    Some(next) => {
                        info!("next cursor: {}", next);
                        self.state.cursor = Cursor::After(next);
                    }
                    None => {
                        info!("Next cursor is null, so no more data to read. Time to stop querying.");
                        return Ok(self.finish(records, None));
                    }
                }
            }
        }

        let cursor = self.state.cursor.clone();
        Ok(self.finish(records, Some(cursor)))
    }

    /// Dedup, filter and enrich one page into `out`
    ///
    /// Returns `false` if the chunk filled before the page was fully
    /// processed. Rows after that point are not marked as seen.
    async fn absorb_page(
        &mut self,
        page: Vec<RepositoryRecord>,
        chunk_size: usize,
        out: &mut Vec<RepositoryRecord>,
    ) -> Result<bool> {
        let mut enricher = ReadmeEnricher::new(&self.provider);
        let mut stats = PageStats::default();
        let mut consumed = true;

        for record in page {
            if out.len() >= chunk_size {
                consumed = false;
                break;
            }

            if !self.seen.insert(record.id.clone()) {
                stats.duplicates += 1;
                continue;
            }

            // No topics means no use downstream; don't pay for the README
            if !record.has_topics() {
                stats.without_topics += 1;
                continue;
            }

            let record = enricher.enrich(record).await?;
            if record.readme.is_none() {
                stats.without_readme += 1;
                continue;
            }

            stats.kept += 1;
            out.push(record);
        }

        debug!(
            duplicates = stats.duplicates,
            without_topics = stats.without_topics,
            without_readme = stats.without_readme,
            readme_requests = enricher.fetched(),
            "Page processed"
        );
        info!("Kept {} repositories from page ({} in chunk)", stats.kept, out.len());

        Ok(consumed)
    }

    fn finish(&self, records: Vec<RepositoryRecord>, next_cursor: Option<Cursor>) -> Chunk {
        info!(
            "Chunk done: {} repositories, {} results read in total",
            records.len(),
            self.state.total_read
        );
        Chunk {
            records,
            next_cursor,
            next_min_stars: self.state.min_stars,
        }
    }
}
