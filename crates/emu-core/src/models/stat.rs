use serde::{Deserialize, Serialize};

use super::cluster::{ClusterId, Property};

/// Min/max/mean summary of one property, each part optional
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyStats {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
}

impl PropertyStats {
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none() && self.mean.is_none()
    }
}

/// Per-cluster aggregate statistics from the summary table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterStat {
    pub id: ClusterId,
    pub temperature: PropertyStats,
    pub salinity: PropertyStats,
    pub dissolved_oxygen: PropertyStats,
    pub phosphate: PropertyStats,
    pub silicate: PropertyStats,
    pub nitrate: PropertyStats,
}

impl ClusterStat {
    /// A stat with every property absent
    pub fn empty(id: ClusterId) -> Self {
        Self {
            id,
            temperature: PropertyStats::default(),
            salinity: PropertyStats::default(),
            dissolved_oxygen: PropertyStats::default(),
            phosphate: PropertyStats::default(),
            silicate: PropertyStats::default(),
            nitrate: PropertyStats::default(),
        }
    }

    pub fn get(&self, property: Property) -> &PropertyStats {
        match property {
            Property::Temperature => &self.temperature,
            Property::Salinity => &self.salinity,
            Property::DissolvedOxygen => &self.dissolved_oxygen,
            Property::Phosphate => &self.phosphate,
            Property::Silicate => &self.silicate,
            Property::Nitrate => &self.nitrate,
        }
    }

    pub fn get_mut(&mut self, property: Property) -> &mut PropertyStats {
        match property {
            Property::Temperature => &mut self.temperature,
            Property::Salinity => &mut self.salinity,
            Property::DissolvedOxygen => &mut self.dissolved_oxygen,
            Property::Phosphate => &mut self.phosphate,
            Property::Silicate => &mut self.silicate,
            Property::Nitrate => &mut self.nitrate,
        }
    }
}
