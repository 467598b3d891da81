//! Run driver: reads chunk after chunk and hands each one to a sink.

use std::path::PathBuf;
use std::time::Instant;

use chrono::NaiveDate;
use repoharvest_api::Cursor;
use tracing::info;

use crate::{
    models::RepositoryRecord, pagination::PaginationController, search::SearchProvider, Result,
};

/// Persists finished chunks
#[cfg_attr(test, mockall::automock)]
pub trait ChunkSink {
    /// Write one chunk and return where it ended up
    fn write_chunk(
        &mut self,
        records: &[RepositoryRecord],
        index: usize,
        date: NaiveDate,
    ) -> Result<PathBuf>;
}

/// Knobs for one harvest run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestParams {
    /// Upper bound on records persisted over the whole run
    pub total_items: usize,
    /// Records per persisted chunk
    pub chunk_size: usize,
    /// Initial `stars:>` threshold
    pub start_from_stars: u64,
}

impl Default for HarvestParams {
    fn default() -> Self {
        Self {
            total_items: 200_000,
            chunk_size: 3_000,
            start_from_stars: 100,
        }
    }
}

impl HarvestParams {
    /// How many chunks the budget allows at most
    pub fn max_chunks(&self) -> usize {
        if self.chunk_size == 0 {
            return 0;
        }
        (self.total_items + self.chunk_size - 1) / self.chunk_size
    }
}

/// What a run produced
#[derive(Debug, Clone, Default)]
pub struct HarvestSummary {
    pub chunks_written: usize,
    pub records_written: usize,
    pub results_read: usize,
    pub final_min_stars: u64,
    /// True when GitHub ran out before the budget did
    pub exhausted: bool,
    pub files: Vec<PathBuf>,
}

/// Outer chunk loop around the pagination controller
pub struct Harvester<P: SearchProvider> {
    controller: PaginationController<P>,
    params: HarvestParams,
}

impl<P: SearchProvider> Harvester<P> {
    pub fn new(provider: P, params: HarvestParams) -> Self {
        Self {
            controller: PaginationController::new(provider),
            params,
        }
    }

    pub fn controller(&self) -> &PaginationController<P> {
        &self.controller
    }

    /// Harvest until the budget is spent or GitHub has nothing more
    ///
    /// Each chunk's continuation (cursor and threshold) feeds the next one.
    /// `date` stamps every chunk written in this run.
    pub async fn run<S>(&mut self, sink: &mut S, date: NaiveDate) -> Result<HarvestSummary>
    where
        S: ChunkSink + ?Sized,
    {
        info!(
            "Reading repos data with maximum of {} projects in chunks of {}, starting from those with {} stars",
            self.params.total_items, self.params.chunk_size, self.params.start_from_stars
        );

        let started = Instant::now();
        let mut summary = HarvestSummary {
            final_min_stars: self.params.start_from_stars,
            ..Default::default()
        };
        let mut cursor = Cursor::Start;
        let mut min_stars = self.params.start_from_stars;
        let max_chunks = self.params.max_chunks();

        for index in 0..max_chunks {
            let remaining = self.params.total_items - summary.records_written;
            let size = self.params.chunk_size.min(remaining);
            if size == 0 {
                break;
            }

            info!("Reading data chunk {}", index);
            let chunk = self.controller.read_chunk(size, min_stars, cursor).await?;
            summary.results_read = self.controller.state().total_read;
            summary.final_min_stars = chunk.next_min_stars;

            if chunk.is_empty() {
                info!("Data fetching has ended because GitHub returned no more data.");
                summary.exhausted = true;
                break;
            }

            let path = sink.write_chunk(&chunk.records, index, date)?;
            info!("Saved chunk {} ({} repositories) to {}", index, chunk.len(), path.display());
            summary.chunks_written += 1;
            summary.records_written += chunk.len();
            summary.files.push(path);

            match chunk.next_cursor {
                Some(next) => {
                    cursor = next;
                    min_stars = chunk.next_min_stars;
                }
                None => {
                    info!("Cursor exhausted, stopping after chunk {}", index);
                    summary.exhausted = true;
                    break;
                }
            }
        }

        info!(
            "Data read successfully! {} repositories in {} chunks ({} search results read) in {:.1?}",
            summary.records_written,
            summary.chunks_written,
            summary.results_read,
            started.elapsed()
        );
        Ok(summary)
    }
}
