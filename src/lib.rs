// src/lib.rs
// Library surface shared by the binaries and the integration tests.

pub mod change_detector;
pub mod config;
pub mod enrich;
pub mod events;
pub mod indicators;
pub mod ingest;
pub mod logging;
pub mod pipeline;
pub mod state;

// ---- Re-exports for stable public API ----
pub use crate::config::{ConfigError, Settings};
pub use crate::enrich::{ArticleRecord, EnrichPolicy, Enricher};
pub use crate::events::{EventSink, SharedSink, StatusEvent};
pub use crate::ingest::{Headline, HeadlineProvider};
pub use crate::pipeline::{Pipeline, RunOutcome, RunResult};
pub use crate::state::{NewsRecord, StateStore};
