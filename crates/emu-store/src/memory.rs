//! In-memory feature-query provider for development and testing.
//!
//! Tables are held behind `Arc<RwLock<..>>` so clones of the provider share
//! state. Every operation is counted, and failures can be injected per
//! operation to exercise the error paths of the orchestrator.

use async_trait::async_trait;
use emu_core::config::FieldNames;
use emu_core::error::{EmuError, Result};
use emu_core::models::{
    DepthBucket, Envelope, GeocodeCandidate, LayerHandle, Location, RawRecord,
};
use emu_core::ports::FeatureQueryProvider;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// Operations of the feature-query provider port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderOperation {
    QueryByEnvelope,
    QueryByPoint,
    QueryBulk,
    QueryByDepthPredicate,
    Geocode,
}

impl ProviderOperation {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderOperation::QueryByEnvelope => "query_by_envelope",
            ProviderOperation::QueryByPoint => "query_by_point",
            ProviderOperation::QueryBulk => "query_bulk",
            ProviderOperation::QueryByDepthPredicate => "query_by_depth_predicate",
            ProviderOperation::Geocode => "geocode",
        }
    }
}

/// Serialized contents of an in-memory provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryFixture {
    /// Mesh-cluster records returned by envelope queries
    pub mesh_clusters: Vec<RawRecord>,

    /// Mesh-point records returned by point queries
    pub mesh_points: Vec<RawRecord>,

    /// Summary statistics rows returned by bulk queries
    pub summary: Vec<RawRecord>,

    /// Depth polygons, each carrying a `Depth` attribute
    pub depth_polygons: Vec<RawRecord>,

    pub gazetteer: Vec<GeocodeCandidate>,
}

#[derive(Debug, Default)]
struct CallCounters {
    envelope: AtomicUsize,
    point: AtomicUsize,
    bulk: AtomicUsize,
    depth: AtomicUsize,
    geocode: AtomicUsize,
}

impl CallCounters {
    fn counter(&self, operation: ProviderOperation) -> &AtomicUsize {
        match operation {
            ProviderOperation::QueryByEnvelope => &self.envelope,
            ProviderOperation::QueryByPoint => &self.point,
            ProviderOperation::QueryBulk => &self.bulk,
            ProviderOperation::QueryByDepthPredicate => &self.depth,
            ProviderOperation::Geocode => &self.geocode,
        }
    }
}

/// In-memory implementation of [`FeatureQueryProvider`]
#[derive(Debug, Clone, Default)]
pub struct MemoryFeatureProvider {
    tables: Arc<RwLock<MemoryFixture>>,
    fields: FieldNames,
    calls: Arc<CallCounters>,
    failing: Arc<RwLock<HashSet<ProviderOperation>>>,
    latency: Option<Duration>,
}

impl MemoryFeatureProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider over existing tables
    pub fn from_fixture(fixture: MemoryFixture) -> Self {
        Self { tables: Arc::new(RwLock::new(fixture)), ..Self::default() }
    }

    /// Load tables from a JSON fixture file
    pub fn from_fixture_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| EmuError::ConfigInvalid {
            key: "fixture".to_string(),
            reason: format!("cannot read {}: {}", path.display(), e),
        })?;
        let fixture: MemoryFixture = serde_json::from_str(&text)
            .map_err(|e| EmuError::Serialization(format!("{}: {}", path.display(), e)))?;

        tracing::debug!(
            path = %path.display(),
            mesh_clusters = fixture.mesh_clusters.len(),
            summary = fixture.summary.len(),
            "Loaded memory provider fixture"
        );
        Ok(Self::from_fixture(fixture))
    }

    /// Use custom attribute names when locating records
    pub fn with_fields(mut self, fields: FieldNames) -> Self {
        self.fields = fields;
        self
    }

    /// Delay every call, to let concurrent callers overlap
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn add_mesh_cluster(&self, record: RawRecord) {
        self.tables.write().unwrap_or_else(PoisonError::into_inner).mesh_clusters.push(record);
    }

    pub fn add_mesh_point(&self, record: RawRecord) {
        self.tables.write().unwrap_or_else(PoisonError::into_inner).mesh_points.push(record);
    }

    pub fn add_summary_row(&self, record: RawRecord) {
        self.tables.write().unwrap_or_else(PoisonError::into_inner).summary.push(record);
    }

    pub fn add_depth_polygon(&self, record: RawRecord) {
        self.tables.write().unwrap_or_else(PoisonError::into_inner).depth_polygons.push(record);
    }

    pub fn add_place(&self, candidate: GeocodeCandidate) {
        self.tables.write().unwrap_or_else(PoisonError::into_inner).gazetteer.push(candidate);
    }

    /// Make an operation fail until cleared
    pub fn set_failing(&self, operation: ProviderOperation, failing: bool) {
        let mut set = self.failing.write().unwrap_or_else(PoisonError::into_inner);
        if failing {
            set.insert(operation);
        } else {
            set.remove(&operation);
        }
    }

    /// Number of calls made to an operation
    pub fn calls(&self, operation: ProviderOperation) -> usize {
        self.calls.counter(operation).load(Ordering::SeqCst)
    }

    async fn begin(&self, operation: ProviderOperation) -> Result<()> {
        self.calls.counter(operation).fetch_add(1, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let failing = self.failing.read().unwrap_or_else(PoisonError::into_inner);
        if failing.contains(&operation) {
            return Err(EmuError::provider(operation.name(), "injected failure"));
        }
        Ok(())
    }

    /// Copy of the current tables
    pub fn snapshot(&self) -> MemoryFixture {
        self.read_tables().clone()
    }

    fn read_tables(&self) -> std::sync::RwLockReadGuard<'_, MemoryFixture> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Location of a record from its point attributes or geometry
    fn record_location(&self, record: &RawRecord) -> Option<Location> {
        let x = record.text(&self.fields.point_x).and_then(|s| s.parse::<f64>().ok());
        let y = record.text(&self.fields.point_y).and_then(|s| s.parse::<f64>().ok());
        match (x, y) {
            (Some(x), Some(y)) => Some(Location::new(x, y)),
            _ => record.geometry,
        }
    }
}

#[async_trait]
impl FeatureQueryProvider for MemoryFeatureProvider {
    async fn query_by_envelope(&self, envelope: &Envelope) -> Result<Vec<RawRecord>> {
        self.begin(ProviderOperation::QueryByEnvelope).await?;

        let tables = self.read_tables();
        Ok(tables
            .mesh_clusters
            .iter()
            .filter(|r| self.record_location(r).is_some_and(|l| envelope.contains(&l)))
            .cloned()
            .collect())
    }

    async fn query_by_point(&self, point: &Location) -> Result<Vec<RawRecord>> {
        self.begin(ProviderOperation::QueryByPoint).await?;

        let key = point.key();
        let tables = self.read_tables();
        Ok(tables
            .mesh_points
            .iter()
            .filter(|r| self.record_location(r).is_some_and(|l| l.key() == key))
            .cloned()
            .collect())
    }

    async fn query_bulk(&self, where_clause: &str) -> Result<Vec<RawRecord>> {
        self.begin(ProviderOperation::QueryBulk).await?;

        tracing::debug!(where_clause, "Memory provider returns the full summary table");
        Ok(self.read_tables().summary.clone())
    }

    async fn query_by_depth_predicate(&self, bucket: DepthBucket) -> Result<LayerHandle> {
        self.begin(ProviderOperation::QueryByDepthPredicate).await?;

        let wanted = bucket.value().to_string();
        let feature_count = self
            .read_tables()
            .depth_polygons
            .iter()
            .filter(|r| r.text("Depth").is_some_and(|d| d == wanted))
            .count();

        Ok(LayerHandle { layer_id: format!("memory/by-depth/{}", bucket), bucket, feature_count })
    }

    async fn geocode(&self, address: &str, max_results: usize) -> Result<Vec<GeocodeCandidate>> {
        self.begin(ProviderOperation::Geocode).await?;

        let needle = address.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let mut matches: Vec<GeocodeCandidate> = self
            .read_tables()
            .gazetteer
            .iter()
            .filter(|c| c.label.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(max_results);
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn cluster_at(lon: f64, lat: f64) -> RawRecord {
        RawRecord::default().attr("Cluster37", 5).attr("Point_X", lon).attr("Point_Y", lat)
    }

    #[tokio::test]
    async fn test_envelope_filter() {
        let provider = MemoryFeatureProvider::new();
        provider.add_mesh_cluster(cluster_at(-40.0, 10.0));
        provider.add_mesh_cluster(cluster_at(-30.0, 10.0));

        let envelope =
            Envelope::from_corners(Location::new(-41.0, 9.0), Location::new(-39.0, 11.0));
        let records = provider.query_by_envelope(&envelope).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(provider.calls(ProviderOperation::QueryByEnvelope), 1);
    }

    #[tokio::test]
    async fn test_point_query_uses_geometry_fallback() {
        let provider = MemoryFeatureProvider::new();
        provider.add_mesh_point(
            RawRecord::default().attr("UnitTop", 10).with_geometry(Location::new(2.5, -7.0)),
        );
        provider.add_mesh_point(cluster_at(2.5, -7.5));

        let records = provider.query_by_point(&Location::new(2.5, -7.0)).await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let provider = MemoryFeatureProvider::new();
        provider.set_failing(ProviderOperation::QueryBulk, true);

        let err = provider.query_bulk("1 = 1").await.unwrap_err();
        assert!(matches!(err, EmuError::Provider { ref operation, .. } if operation == "query_bulk"));

        provider.set_failing(ProviderOperation::QueryBulk, false);
        assert!(provider.query_bulk("1 = 1").await.is_ok());
        assert_eq!(provider.calls(ProviderOperation::QueryBulk), 2);
    }

    #[tokio::test]
    async fn test_depth_predicate_counts_polygons() {
        let provider = MemoryFeatureProvider::new();
        provider.add_depth_polygon(RawRecord::default().attr("Depth", 20));
        provider.add_depth_polygon(RawRecord::default().attr("Depth", 20));
        provider.add_depth_polygon(RawRecord::default().attr("Depth", 30));

        let bucket = DepthBucket::from_band(20).unwrap();
        let handle = provider.query_by_depth_predicate(bucket).await.unwrap();
        assert_eq!(handle.feature_count, 2);
        assert_eq!(handle.bucket, bucket);
    }

    #[tokio::test]
    async fn test_geocode_limits_results() {
        let provider = MemoryFeatureProvider::new();
        for (label, score) in [("Cape Town", 90.0), ("Cape Verde", 95.0), ("Cape Horn", 80.0)] {
            provider.add_place(GeocodeCandidate {
                label: label.to_string(),
                location: Location::new(0.0, 0.0),
                score,
            });
        }

        let results = provider.geocode("cape", 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].label, "Cape Verde");
        assert!(provider.geocode("   ", 2).await.unwrap().is_empty());
    }

    #[test]
    fn test_fixture_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "mesh_clusters": [{{"attributes": {{"Cluster37": 3, "Point_X": 1.0, "Point_Y": 2.0}}}}],
                "gazetteer": [{{"label": "Azores", "location": {{"lon": -28.0, "lat": 38.5}}, "score": 100.0}}]
            }}"#
        )
        .unwrap();

        let provider = MemoryFeatureProvider::from_fixture_file(file.path()).unwrap();
        let tables = provider.snapshot();
        assert_eq!(tables.mesh_clusters.len(), 1);
        assert_eq!(tables.gazetteer[0].label, "Azores");
        assert!(tables.summary.is_empty());
    }

    #[test]
    fn test_fixture_file_errors() {
        assert!(MemoryFeatureProvider::from_fixture_file("/nonexistent/fixture.json").is_err());

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = MemoryFeatureProvider::from_fixture_file(file.path()).unwrap_err();
        assert!(matches!(err, EmuError::Serialization(_)));
    }
}
