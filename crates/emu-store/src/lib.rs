//! EMU Store - Process-lifetime caches and feature-query provider adapters

pub mod arcgis;
pub mod depth;
pub mod memory;
pub mod statistics;

pub use arcgis::{ArcGisFeatureProvider, ArcGisLayers};
pub use depth::{DepthCacheStats, DepthLayer, DepthLayerCache, LayerVisibility};
pub use memory::{MemoryFeatureProvider, MemoryFixture, ProviderOperation};
pub use statistics::{Extrema, LoadOutcome, StatisticsCache};
