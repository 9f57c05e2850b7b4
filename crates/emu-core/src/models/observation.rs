use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::{Ordering, Reverse};
use std::collections::BTreeMap;

use super::cluster::{ClusterDescriptor, ClusterId, Property};
use super::geometry::Location;

/// Optional physical and chemical measurements.
///
/// Each value is either present or explicitly absent; absence is never
/// encoded as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    pub temperature: Option<f64>,
    pub salinity: Option<f64>,
    pub dissolved_oxygen: Option<f64>,
    pub phosphate: Option<f64>,
    pub silicate: Option<f64>,
    pub nitrate: Option<f64>,
}

impl Measurements {
    pub fn get(&self, property: Property) -> Option<f64> {
        match property {
            Property::Temperature => self.temperature,
            Property::Salinity => self.salinity,
            Property::DissolvedOxygen => self.dissolved_oxygen,
            Property::Phosphate => self.phosphate,
            Property::Silicate => self.silicate,
            Property::Nitrate => self.nitrate,
        }
    }

    pub fn set(&mut self, property: Property, value: Option<f64>) {
        let slot = match property {
            Property::Temperature => &mut self.temperature,
            Property::Salinity => &mut self.salinity,
            Property::DissolvedOxygen => &mut self.dissolved_oxygen,
            Property::Phosphate => &mut self.phosphate,
            Property::Silicate => &mut self.silicate,
            Property::Nitrate => &mut self.nitrate,
        };
        *slot = value;
    }
}

/// One occurrence of a cluster at a location and depth interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub cluster: ClusterDescriptor,

    /// Meters below the surface where this unit begins
    pub top_depth: u32,

    /// Vertical extent in meters, always > 0
    pub thickness: u32,

    pub location: Location,

    pub measurements: Measurements,
}

impl Observation {
    /// Natural ordering: deepest top first
    pub fn cmp_by_depth(&self, other: &Self) -> Ordering {
        other.top_depth.cmp(&self.top_depth)
    }

    /// Key under which a water column de-duplicates observations
    pub fn ordering_key(&self) -> Reverse<u32> {
        Reverse(self.top_depth)
    }
}

/// Vertically ordered stack of observations at one location
#[derive(Debug, Clone, PartialEq)]
pub struct WaterColumn {
    location: Location,
    observations: BTreeMap<Reverse<u32>, Observation>,
}

impl WaterColumn {
    /// Create an empty column at a location
    pub fn new(location: Location) -> Self {
        Self { location, observations: BTreeMap::new() }
    }

    pub fn location(&self) -> Location {
        self.location
    }

    /// Add an observation.
    ///
    /// Returns `false` when an observation with the same top depth is already
    /// present; the first one added is kept.
    pub fn add_observation(&mut self, observation: Observation) -> bool {
        match self.observations.entry(observation.ordering_key()) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(observation);
                true
            }
        }
    }

    /// Observations in natural order (largest top depth first)
    pub fn observations(&self) -> impl Iterator<Item = &Observation> {
        self.observations.values()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Total depth: the sum of all member thicknesses
    pub fn depth(&self) -> u32 {
        self.observations.values().map(|o| o.thickness).sum()
    }

    /// All observations belonging to one cluster
    pub fn observations_for_cluster(&self, id: ClusterId) -> Vec<&Observation> {
        self.observations.values().filter(|o| o.cluster.id == id).collect()
    }
}

impl Serialize for WaterColumn {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("WaterColumn", 3)?;
        state.serialize_field("location", &self.location)?;
        state.serialize_field("depth", &self.depth())?;
        state.serialize_field("observations", &self.observations.values().collect::<Vec<_>>())?;
        state.end()
    }
}
