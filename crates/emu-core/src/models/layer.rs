use serde::{Deserialize, Serialize};
use std::fmt;

use super::geometry::Location;

/// Discrete depth band used to scope polygon layers.
///
/// Valid values are 1 (the surface) and 10, 20, ... 90.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DepthBucket(u8);

impl DepthBucket {
    pub const SURFACE: DepthBucket = DepthBucket(1);

    /// Map a slider value in `0..=100` onto a bucket.
    ///
    /// Values up to 10 map to the surface; larger values round down to the
    /// nearest multiple of ten, capped at 90. Out-of-range input is clamped.
    pub fn from_slider(raw: i32) -> Self {
        if raw <= 10 {
            return Self::SURFACE;
        }
        let band = (raw.min(100) / 10) * 10;
        DepthBucket(band.clamp(10, 90) as u8)
    }

    /// Construct from a known band value
    pub fn from_band(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::SURFACE),
            10 | 20 | 30 | 40 | 50 | 60 | 70 | 80 | 90 => Some(DepthBucket(value)),
            _ => None,
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn is_surface(&self) -> bool {
        *self == Self::SURFACE
    }

    /// Filter predicate scoping a polygon layer to this band
    pub fn definition_expression(&self) -> String {
        format!("Depth = {}", self.0)
    }
}

impl fmt::Display for DepthBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to a renderable polygon layer fetched for one depth bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerHandle {
    pub layer_id: String,
    pub bucket: DepthBucket,
    pub feature_count: usize,
}

/// A location candidate returned by geocoding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeCandidate {
    pub label: String,
    pub location: Location,
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(DepthBucket::from_slider(0).value(), 1);
        assert_eq!(DepthBucket::from_slider(10).value(), 1);
        assert_eq!(DepthBucket::from_slider(11).value(), 10);
        assert_eq!(DepthBucket::from_slider(19).value(), 10);
        assert_eq!(DepthBucket::from_slider(20).value(), 20);
        assert_eq!(DepthBucket::from_slider(29).value(), 20);
        assert_eq!(DepthBucket::from_slider(89).value(), 80);
        assert_eq!(DepthBucket::from_slider(90).value(), 90);
        assert_eq!(DepthBucket::from_slider(100).value(), 90);
    }

    #[test]
    fn test_bucket_clamps_out_of_range() {
        assert_eq!(DepthBucket::from_slider(-5), DepthBucket::SURFACE);
        assert_eq!(DepthBucket::from_slider(250).value(), 90);
    }

    #[test]
    fn test_from_band() {
        assert_eq!(DepthBucket::from_band(1), Some(DepthBucket::SURFACE));
        assert_eq!(DepthBucket::from_band(40).map(|b| b.value()), Some(40));
        assert_eq!(DepthBucket::from_band(45), None);
        assert_eq!(DepthBucket::from_band(100), None);
    }

    #[test]
    fn test_definition_expression() {
        assert_eq!(DepthBucket::from_slider(35).definition_expression(), "Depth = 30");
    }

    mod prop {
        use super::super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn bucket_is_always_a_known_band(raw in -50i32..200) {
                let bucket = DepthBucket::from_slider(raw);
                prop_assert_eq!(DepthBucket::from_band(bucket.value()), Some(bucket));
            }

            #[test]
            fn bucket_never_exceeds_slider_value(raw in 11i32..=100) {
                let bucket = DepthBucket::from_slider(raw);
                prop_assert!(i32::from(bucket.value()) <= raw);
                prop_assert!(raw - i32::from(bucket.value()) < 10 || raw == 100);
            }
        }
    }
}
