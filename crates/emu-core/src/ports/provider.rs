use async_trait::async_trait;

use crate::error::Result;
use crate::models::{DepthBucket, Envelope, GeocodeCandidate, LayerHandle, Location, RawRecord};

/// Port for the remote feature-query service.
///
/// Every call is a single attempt: adapters must not retry, and any transport
/// or service failure is reported as [`crate::EmuError::Provider`].
#[async_trait]
pub trait FeatureQueryProvider: Send + Sync {
    /// Mesh-cluster records intersecting a search envelope
    async fn query_by_envelope(&self, envelope: &Envelope) -> Result<Vec<RawRecord>>;

    /// Mesh-point records at an exact location, used for depth profiles
    async fn query_by_point(&self, point: &Location) -> Result<Vec<RawRecord>>;

    /// Full scan of the summary statistics table
    async fn query_bulk(&self, where_clause: &str) -> Result<Vec<RawRecord>>;

    /// Fetch the polygon layer scoped to one depth bucket
    async fn query_by_depth_predicate(&self, bucket: DepthBucket) -> Result<LayerHandle>;

    /// Resolve free text to candidate locations, best first
    async fn geocode(&self, address: &str, max_results: usize) -> Result<Vec<GeocodeCandidate>>;
}
