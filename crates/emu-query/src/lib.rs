//! EMU Query - Orchestration of feature queries, parsing, aggregation and caches
//!
//! `QueryOrchestrator` is the single service object callers construct and
//! share. Every operation is an `async fn` returning `Result`; the
//! `callbacks` module adds spawned completion-callback forms.

pub mod callbacks;
pub mod models;
pub mod orchestrator;

pub use models::{GeocodeMatch, OrchestratorSettings};
pub use orchestrator::QueryOrchestrator;
