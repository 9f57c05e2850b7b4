use emu_core::models::{
    ClusterStat, DepthProfile, GeocodeCandidate, Location, Observation, WaterColumn,
};
use emu_store::{DepthCacheStats, Extrema, LayerVisibility};
use serde::Serialize;
use tabled::Tabled;

use crate::output::opt;

/// Output for locate command
#[derive(Debug, Serialize)]
pub struct LocateOutput {
    pub query: Location,
    pub buffer_meters: f64,
    pub column: Option<WaterColumn>,
}

#[derive(Debug, Tabled)]
pub struct ObservationRow {
    #[tabled(rename = "EMU")]
    pub cluster: u32,
    #[tabled(rename = "Top (m)")]
    pub top_depth: u32,
    #[tabled(rename = "Thickness (m)")]
    pub thickness: u32,
    #[tabled(rename = "Physical")]
    pub physical: String,
    #[tabled(rename = "Nutrient")]
    pub nutrient: String,
    #[tabled(rename = "Temp")]
    pub temperature: String,
    #[tabled(rename = "Salinity")]
    pub salinity: String,
    #[tabled(rename = "O2")]
    pub dissolved_oxygen: String,
}

impl From<&Observation> for ObservationRow {
    fn from(o: &Observation) -> Self {
        Self {
            cluster: o.cluster.id.0,
            top_depth: o.top_depth,
            thickness: o.thickness,
            physical: o.cluster.physical_summary.clone(),
            nutrient: o.cluster.nutrient_summary.clone(),
            temperature: opt(o.measurements.temperature),
            salinity: opt(o.measurements.salinity),
            dissolved_oxygen: opt(o.measurements.dissolved_oxygen),
        }
    }
}

/// Output for profile command
#[derive(Debug, Serialize)]
pub struct ProfileOutput {
    pub profile: DepthProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<PropertySeries>,
}

#[derive(Debug, Serialize)]
pub struct PropertySeries {
    pub name: String,
    /// `(depth, value)` pairs, shallowest first
    pub values: Vec<(f64, f64)>,
}

#[derive(Debug, Tabled)]
pub struct ProfileRow {
    #[tabled(rename = "Depth (m)")]
    pub depth: f64,
    #[tabled(rename = "EMU")]
    pub cluster: u32,
    #[tabled(rename = "Temp")]
    pub temperature: f64,
    #[tabled(rename = "Salinity")]
    pub salinity: f64,
    #[tabled(rename = "O2")]
    pub dissolved_oxygen: f64,
    #[tabled(rename = "Phosphate")]
    pub phosphate: f64,
    #[tabled(rename = "Silicate")]
    pub silicate: f64,
    #[tabled(rename = "Nitrate")]
    pub nitrate: f64,
}

#[derive(Debug, Tabled)]
pub struct SeriesRow {
    #[tabled(rename = "Depth (m)")]
    pub depth: f64,
    #[tabled(rename = "Value")]
    pub value: f64,
}

/// Output for stats command
#[derive(Debug, Serialize)]
pub struct StatsOutput {
    pub loaded_now: bool,
    pub clusters: usize,
    pub skipped: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extrema: Vec<ExtremaItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<ClusterStat>,
}

#[derive(Debug, Serialize)]
pub struct ExtremaItem {
    pub property: String,
    #[serde(flatten)]
    pub extrema: Extrema,
}

#[derive(Debug, Tabled)]
pub struct ExtremaRow {
    #[tabled(rename = "Property")]
    pub property: String,
    #[tabled(rename = "Global min")]
    pub min: String,
    #[tabled(rename = "Global max")]
    pub max: String,
}

#[derive(Debug, Tabled)]
pub struct ClusterStatRow {
    #[tabled(rename = "Property")]
    pub property: String,
    #[tabled(rename = "Min")]
    pub min: String,
    #[tabled(rename = "Max")]
    pub max: String,
    #[tabled(rename = "Mean")]
    pub mean: String,
}

/// Output for depth command
#[derive(Debug, Serialize)]
pub struct DepthOutput {
    pub requests: Vec<DepthItem>,
    pub visibility: LayerVisibility,
    pub cache: DepthCacheStats,
}

#[derive(Debug, Serialize, Tabled)]
pub struct DepthItem {
    #[tabled(rename = "Slider")]
    pub value: i32,
    #[tabled(rename = "Bucket")]
    pub bucket: u8,
    #[tabled(rename = "Layer")]
    pub layer: String,
    #[tabled(rename = "Features")]
    pub features: String,
}

/// Output for search command
#[derive(Debug, Serialize)]
pub struct SearchOutput {
    pub address: String,
    pub candidate: Option<GeocodeCandidate>,
    pub column: Option<WaterColumn>,
}

#[derive(Debug, Serialize, Tabled)]
pub struct ConfigRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}
