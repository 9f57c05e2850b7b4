//! Completion-callback forms of the orchestrator operations.
//!
//! Each wrapper spawns the operation on the current tokio runtime and hands
//! its `Result` to the callback on the task that completed it. The calling
//! thread never blocks. Failures reach the callback as `Err`; nothing is
//! retried.

use emu_core::error::Result;
use emu_core::models::{DepthProfile, Envelope, Location, WaterColumn};
use emu_store::{DepthLayer, LoadOutcome};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::models::GeocodeMatch;
use crate::orchestrator::QueryOrchestrator;

impl QueryOrchestrator {
    pub fn spawn_query_for_location<F>(
        self: &Arc<Self>,
        envelope: Envelope,
        on_complete: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(Result<Option<Arc<WaterColumn>>>) + Send + 'static,
    {
        let this = Arc::clone(self);
        tokio::spawn(async move { on_complete(this.query_for_location(&envelope).await) })
    }

    pub fn spawn_query_for_column_profile<F>(
        self: &Arc<Self>,
        point: Location,
        on_complete: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(Result<DepthProfile>) + Send + 'static,
    {
        let this = Arc::clone(self);
        tokio::spawn(async move { on_complete(this.query_for_column_profile(point).await) })
    }

    pub fn spawn_query_statistics<F>(self: &Arc<Self>, on_complete: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<LoadOutcome>) + Send + 'static,
    {
        let this = Arc::clone(self);
        tokio::spawn(async move { on_complete(this.query_statistics().await) })
    }

    pub fn spawn_query_depth_layer<F>(self: &Arc<Self>, raw: i32, on_complete: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<DepthLayer>) + Send + 'static,
    {
        let this = Arc::clone(self);
        tokio::spawn(async move { on_complete(this.query_depth_layer(raw).await) })
    }

    pub fn spawn_geocode_and_query<F>(
        self: &Arc<Self>,
        address: impl Into<String>,
        on_complete: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(Result<Option<GeocodeMatch>>) + Send + 'static,
    {
        let this = Arc::clone(self);
        let address = address.into();
        tokio::spawn(async move { on_complete(this.geocode_and_query(&address).await) })
    }
}
