use emu_core::error::Result;
use emu_core::models::{
    ClusterId, DepthBucket, DepthProfile, Envelope, LayerHandle, Location, Observation,
    WaterColumn,
};
use emu_core::parser::RecordParser;
use emu_core::ports::FeatureQueryProvider;
use emu_geo::{aggregate, buffer_envelope, select_nearest};
use emu_store::{DepthLayer, DepthLayerCache, LoadOutcome, StatisticsCache};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use crate::models::{GeocodeMatch, OrchestratorSettings};

/// Service object composing the record parser, aggregation, nearest
/// selection and the two process-lifetime caches around one provider.
pub struct QueryOrchestrator {
    provider: Arc<dyn FeatureQueryProvider>,
    parser: RecordParser,
    settings: OrchestratorSettings,
    statistics: StatisticsCache,
    depth_layers: DepthLayerCache,

    /// Serializes statistics loads so concurrent callers query once
    stats_gate: tokio::sync::Mutex<()>,

    /// Most recent location result; owned by the caller
    current: Mutex<Weak<WaterColumn>>,
}

impl QueryOrchestrator {
    /// Create an orchestrator with default settings
    pub fn new(provider: Arc<dyn FeatureQueryProvider>) -> Self {
        Self::with_settings(provider, OrchestratorSettings::default())
    }

    pub fn with_settings(
        provider: Arc<dyn FeatureQueryProvider>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            provider,
            parser: RecordParser::new(settings.fields.clone()),
            settings,
            statistics: StatisticsCache::new(),
            depth_layers: DepthLayerCache::new(),
            stats_gate: tokio::sync::Mutex::new(()),
            current: Mutex::new(Weak::new()),
        }
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    pub fn statistics(&self) -> &StatisticsCache {
        &self.statistics
    }

    pub fn depth_layers(&self) -> &DepthLayerCache {
        &self.depth_layers
    }

    /// Nearest water column to the center of an envelope.
    ///
    /// Returns `Ok(None)` when the envelope holds no parseable observations.
    pub async fn query_for_location(
        &self,
        envelope: &Envelope,
    ) -> Result<Option<Arc<WaterColumn>>> {
        tracing::debug!(envelope = %envelope.to_bbox_string(), "Location query: querying");
        let records = self.provider.query_by_envelope(envelope).await.map_err(|e| {
            tracing::error!(error = %e, "Location query failed");
            e
        })?;

        tracing::debug!(records = records.len(), "Location query: aggregating");
        let batch = self.parser.parse_observations(&records);
        let columns = aggregate(batch.items);

        tracing::debug!(candidates = columns.len(), "Location query: selecting");
        let nearest = select_nearest(envelope.center(), columns).map(Arc::new);

        *self.current.lock().unwrap_or_else(PoisonError::into_inner) =
            nearest.as_ref().map(Arc::downgrade).unwrap_or_default();

        match &nearest {
            Some(column) => tracing::info!(
                location = %column.location(),
                observations = column.len(),
                "Location query completed"
            ),
            None => tracing::info!("Location query completed: no water column found"),
        }
        Ok(nearest)
    }

    /// Nearest water column within the configured buffer around a point
    pub async fn query_for_point(&self, point: Location) -> Result<Option<Arc<WaterColumn>>> {
        let envelope = buffer_envelope(point, self.settings.buffer_meters);
        self.query_for_location(&envelope).await
    }

    /// Depth profile of the mesh point at an exact location
    pub async fn query_for_column_profile(&self, point: Location) -> Result<DepthProfile> {
        tracing::debug!(%point, "Profile query: querying");
        let records = self.provider.query_by_point(&point).await.map_err(|e| {
            tracing::error!(error = %e, "Profile query failed");
            e
        })?;

        let batch = self.parser.parse_profile_measurements(&records);
        let mut profile = DepthProfile::new(point);
        for measurement in batch.items {
            profile.add_measurement(measurement);
        }

        tracing::info!(
            %point,
            measurements = profile.measurement_count(),
            "Profile query completed"
        );
        Ok(profile)
    }

    /// Load the summary statistics once per orchestrator lifetime.
    ///
    /// When the cache is already populated this returns
    /// [`LoadOutcome::AlreadyLoaded`] without calling the provider.
    pub async fn query_statistics(&self) -> Result<LoadOutcome> {
        if self.statistics.is_loaded() {
            tracing::debug!("Statistics query: already loaded");
            return Ok(LoadOutcome::AlreadyLoaded);
        }

        let _gate = self.stats_gate.lock().await;
        if self.statistics.is_loaded() {
            tracing::debug!("Statistics query: loaded by a concurrent caller");
            return Ok(LoadOutcome::AlreadyLoaded);
        }

        let where_clause = &self.settings.stats_where_clause;
        tracing::debug!(%where_clause, "Statistics query: querying");
        let rows = self.provider.query_bulk(where_clause).await.map_err(|e| {
            tracing::error!(error = %e, "Statistics query failed");
            e
        })?;

        tracing::debug!(rows = rows.len(), "Statistics query: loading");
        Ok(self.statistics.load_once(&self.parser, &rows))
    }

    /// Resolve a slider value to its depth layer, fetching it on first use
    pub async fn query_depth_layer(&self, raw: i32) -> Result<DepthLayer> {
        let bucket = DepthLayerCache::bucket(raw);
        tracing::debug!(raw, %bucket, "Depth query: bucketing");

        let provider = Arc::clone(&self.provider);
        self.depth_layers
            .ensure_cached(bucket, move || async move {
                provider.query_by_depth_predicate(bucket).await
            })
            .await
    }

    /// Fetch a depth bucket ahead of use, leaving visibility unchanged
    pub async fn prefetch_depth_layer(&self, bucket: DepthBucket) -> Result<LayerHandle> {
        tracing::debug!(%bucket, "Prefetching depth layer");

        let provider = Arc::clone(&self.provider);
        self.depth_layers
            .prefetch(bucket, move || async move {
                provider.query_by_depth_predicate(bucket).await
            })
            .await
    }

    /// Geocode free text and run a location query around the best candidate.
    ///
    /// Returns `Ok(None)` when the locator finds nothing.
    pub async fn geocode_and_query(&self, address: &str) -> Result<Option<GeocodeMatch>> {
        tracing::debug!(address, "Geocoding");
        let candidates = self
            .provider
            .geocode(address, self.settings.geocode_max_results)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Geocoding failed");
                e
            })?;

        let Some(candidate) = candidates.into_iter().next() else {
            tracing::info!(address, "No geocoding candidates");
            return Ok(None);
        };

        let column = self.query_for_point(candidate.location).await?;
        Ok(Some(GeocodeMatch { candidate, column }))
    }

    /// The last location result, if the caller still holds it
    pub fn current_water_column(&self) -> Option<Arc<WaterColumn>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner).upgrade()
    }

    /// Observations of one cluster in the current water column
    pub fn current_observations_for_cluster(&self, id: ClusterId) -> Vec<Observation> {
        self.current_water_column()
            .map(|column| column.observations_for_cluster(id).into_iter().cloned().collect())
            .unwrap_or_default()
    }
}
