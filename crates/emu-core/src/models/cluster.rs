use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EmuError;

/// Sentinel used when a combined description cannot be split
pub const NOT_FOUND: &str = "not found";

/// Numeric identifier of an Ecological Marine Unit cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClusterId(pub u32);

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Descriptive attributes of a cluster. Identity is the id alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterDescriptor {
    pub id: ClusterId,
    pub physical_summary: String,
    pub nutrient_summary: String,
    pub geomorphology_base: String,
    pub geomorphology_features: String,
}

impl ClusterDescriptor {
    /// Split a combined `"<physical> with <nutrient>"` description.
    ///
    /// Anything other than exactly two parts yields [`NOT_FOUND`] for both.
    pub fn split_summary(name: &str) -> (String, String) {
        let parts: Vec<&str> = name.split(" with ").collect();
        match parts.as_slice() {
            [physical, nutrient] => (physical.to_string(), nutrient.to_string()),
            _ => (NOT_FOUND.to_string(), NOT_FOUND.to_string()),
        }
    }
}

impl PartialEq for ClusterDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ClusterDescriptor {}

/// The six measured water properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Property {
    Temperature,
    Salinity,
    DissolvedOxygen,
    Phosphate,
    Silicate,
    Nitrate,
}

impl Property {
    pub const ALL: [Property; 6] = [
        Property::Temperature,
        Property::Salinity,
        Property::DissolvedOxygen,
        Property::Phosphate,
        Property::Silicate,
        Property::Nitrate,
    ];

    /// Stable slot index, used by per-property memo tables
    pub fn index(&self) -> usize {
        match self {
            Property::Temperature => 0,
            Property::Salinity => 1,
            Property::DissolvedOxygen => 2,
            Property::Phosphate => 3,
            Property::Silicate => 4,
            Property::Nitrate => 5,
        }
    }

    /// Upper-case name used by chart consumers
    pub fn name(&self) -> &'static str {
        match self {
            Property::Temperature => "TEMPERATURE",
            Property::Salinity => "SALINITY",
            Property::DissolvedOxygen => "DISSOLVED_OXYGEN",
            Property::Phosphate => "PHOSPHATE",
            Property::Silicate => "SILICATE",
            Property::Nitrate => "NITRATE",
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Property {
    type Err = EmuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace(['-', ' '], "_").as_str() {
            "TEMPERATURE" | "TEMP" => Ok(Property::Temperature),
            "SALINITY" => Ok(Property::Salinity),
            "DISSOLVED_OXYGEN" | "OXYGEN" | "DISSO2" => Ok(Property::DissolvedOxygen),
            "PHOSPHATE" => Ok(Property::Phosphate),
            "SILICATE" => Ok(Property::Silicate),
            "NITRATE" => Ok(Property::Nitrate),
            _ => Err(EmuError::UnknownProperty { name: s.to_string() }),
        }
    }
}
