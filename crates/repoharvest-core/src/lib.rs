// Harvesting logic: pagination, enrichment, persistence
pub mod config;
pub mod enrich;
pub mod error;
pub mod export;
pub mod harvest;
pub mod models;
pub mod pagination;
pub mod parser;
pub mod providers;
pub mod search;

#[cfg(test)]
pub(crate) mod testing;

pub use config::Config;
pub use error::Error;
pub use export::{ExportFormat, Exporter, FileSink};
pub use harvest::{ChunkSink, HarvestParams, HarvestSummary, Harvester};
pub use models::{Chunk, RepositoryRecord};
pub use pagination::{PaginationController, RetrievalState, WINDOW_SIZE};
pub use parser::{parse_search_page, SearchPage};
pub use providers::GitHubProvider;
pub use search::SearchProvider;

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
