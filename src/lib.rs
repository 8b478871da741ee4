// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod dedup;
pub mod freshness;
pub mod ingest;
pub mod orchestrator;
pub mod scoring;
pub mod select;
pub mod storage;

// ---- Re-exports for stable public API ----
pub use crate::dedup::SeenSet;
pub use crate::ingest::types::{Engagement, NewsItem, RawRecord, SourceProvider};
pub use crate::ingest::{CollectOptions, CollectOutcome};
pub use crate::orchestrator::{CycleOutcome, CycleStats, Orchestrator, OrchestratorConfig};
pub use crate::scoring::{ScoredItem, ScoringConfig};
pub use crate::storage::OutputStore;
