use emu_core::config::{FieldNames, LayeredConfig};
use emu_core::models::{GeocodeCandidate, WaterColumn};
use std::sync::Arc;

/// Tunables the orchestrator reads at construction time
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorSettings {
    /// Radius of the search envelope built around a point, in meters
    pub buffer_meters: f64,

    /// Upper bound on geocoding candidates requested
    pub geocode_max_results: usize,

    /// Predicate of the bulk statistics query
    pub stats_where_clause: String,

    pub fields: FieldNames,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from(&LayeredConfig::with_defaults())
    }
}

impl From<&LayeredConfig> for OrchestratorSettings {
    fn from(config: &LayeredConfig) -> Self {
        Self {
            buffer_meters: config.buffer_meters.value,
            geocode_max_results: config.geocode_max_results.value,
            stats_where_clause: config.stats_where_clause.value.clone(),
            fields: config.fields.value.clone(),
        }
    }
}

/// Outcome of a geocode-then-locate request
#[derive(Debug, Clone)]
pub struct GeocodeMatch {
    /// The best candidate, which the location query was run against
    pub candidate: GeocodeCandidate,

    /// Nearest water column around the candidate, if any
    pub column: Option<Arc<WaterColumn>>,
}
