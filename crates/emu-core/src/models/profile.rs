use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::cluster::{ClusterId, Property};
use super::geometry::Location;

/// One depth-indexed reading at a fixed mesh point.
///
/// Property values are plain numbers: a reading the parser could not read is
/// stored as `0.0`, unlike [`super::Measurements`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileMeasurement {
    pub depth: f64,
    pub cluster: ClusterId,
    pub temperature: f64,
    pub salinity: f64,
    pub dissolved_oxygen: f64,
    pub phosphate: f64,
    pub silicate: f64,
    pub nitrate: f64,
}

impl ProfileMeasurement {
    pub fn value(&self, property: Property) -> f64 {
        match property {
            Property::Temperature => self.temperature,
            Property::Salinity => self.salinity,
            Property::DissolvedOxygen => self.dissolved_oxygen,
            Property::Phosphate => self.phosphate,
            Property::Silicate => self.silicate,
            Property::Nitrate => self.nitrate,
        }
    }
}

/// Descending depth key with a total order over `f64`
#[derive(Debug, Clone, Copy)]
struct DescendingDepth(f64);

impl PartialEq for DescendingDepth {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DescendingDepth {}

impl PartialOrd for DescendingDepth {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DescendingDepth {
    fn cmp(&self, other: &Self) -> Ordering {
        other.0.total_cmp(&self.0)
    }
}

/// De-duplicated, depth-ordered readings for one location
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DepthProfile {
    location: Option<Location>,
    measurements: BTreeMap<DescendingDepth, ProfileMeasurement>,
}

impl DepthProfile {
    pub fn new(location: Location) -> Self {
        Self { location: Some(location), measurements: BTreeMap::new() }
    }

    pub fn location(&self) -> Option<Location> {
        self.location
    }

    /// Add a reading; a reading at an already-present depth is ignored
    pub fn add_measurement(&mut self, measurement: ProfileMeasurement) -> bool {
        let key = DescendingDepth(measurement.depth + 0.0);
        if self.measurements.contains_key(&key) {
            return false;
        }
        self.measurements.insert(key, measurement);
        true
    }

    /// Readings deepest first
    pub fn measurements(&self) -> impl Iterator<Item = &ProfileMeasurement> {
        self.measurements.values()
    }

    pub fn measurement_count(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    /// `(depth, value)` pairs for one property, shallowest first
    pub fn measurements_for_property(&self, property: Property) -> Vec<(f64, f64)> {
        self.measurements.values().rev().map(|m| (m.depth, m.value(property))).collect()
    }

    /// Same as [`Self::measurements_for_property`], looked up by property name.
    /// Unknown names yield nothing.
    pub fn measurements_for_property_name(&self, name: &str) -> Option<Vec<(f64, f64)>> {
        let property = name.parse::<Property>().ok()?;
        Some(self.measurements_for_property(property))
    }
}

impl Serialize for DepthProfile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("DepthProfile", 2)?;
        state.serialize_field("location", &self.location)?;
        state.serialize_field("measurements", &self.measurements.values().collect::<Vec<_>>())?;
        state.end()
    }
}
