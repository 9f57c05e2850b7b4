//! Geographic primitives shared by every emu crate.
//!
//! Coordinates are WGS 84 longitude/latitude in degrees.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A longitude/latitude pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lon: f64,
    pub lat: f64,
}

impl Location {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Exact-equality grouping key for this coordinate pair
    pub fn key(&self) -> LocationKey {
        LocationKey::from(*self)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.lon, self.lat)
    }
}

/// Hashable key for exact coordinate equality.
///
/// Built from the bit patterns of both coordinates, with `-0.0` folded into
/// `0.0` so that the key agrees with `f64` equality. No tolerance or snapping
/// is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocationKey {
    lon_bits: u64,
    lat_bits: u64,
}

impl From<Location> for LocationKey {
    fn from(location: Location) -> Self {
        Self {
            lon_bits: (location.lon + 0.0).to_bits(),
            lat_bits: (location.lat + 0.0).to_bits(),
        }
    }
}

impl LocationKey {
    pub fn location(&self) -> Location {
        Location::new(f64::from_bits(self.lon_bits), f64::from_bits(self.lat_bits))
    }
}

/// Axis-aligned search region in lon/lat degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Envelope {
    /// Create an envelope from two opposite corners in any order
    pub fn from_corners(a: Location, b: Location) -> Self {
        Self {
            min_lon: a.lon.min(b.lon),
            min_lat: a.lat.min(b.lat),
            max_lon: a.lon.max(b.lon),
            max_lat: a.lat.max(b.lat),
        }
    }

    /// Midpoint of the envelope, used as the query center
    pub fn center(&self) -> Location {
        Location::new(
            (self.min_lon + self.max_lon) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }

    /// Inclusive containment test
    pub fn contains(&self, location: &Location) -> bool {
        location.lon >= self.min_lon
            && location.lon <= self.max_lon
            && location.lat >= self.min_lat
            && location.lat <= self.max_lat
    }

    /// `xmin,ymin,xmax,ymax` as used by feature-service query strings
    pub fn to_bbox_string(&self) -> String {
        format!("{},{},{},{}", self.min_lon, self.min_lat, self.max_lon, self.max_lat)
    }
}
