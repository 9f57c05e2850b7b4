pub mod cluster;
pub mod geometry;
pub mod layer;
pub mod observation;
pub mod profile;
pub mod record;
pub mod stat;

pub use cluster::{ClusterDescriptor, ClusterId, Property, NOT_FOUND};
pub use geometry::{Envelope, Location, LocationKey};
pub use layer::{DepthBucket, GeocodeCandidate, LayerHandle};
pub use observation::{Observation, Measurements, WaterColumn};
pub use profile::{DepthProfile, ProfileMeasurement};
pub use record::RawRecord;
pub use stat::{ClusterStat, PropertyStats};
