//! EMU Geo - Geodesic distance, grouping, and nearest-column selection
//!
//! This crate turns parsed observations into water columns and picks the
//! column closest to a search point.

pub mod aggregate;
pub mod nearest;
pub mod spatial;

pub use aggregate::{aggregate, ColumnsByLocation};
pub use nearest::{rank_by_distance, select_nearest, select_nearest_by};
pub use spatial::{buffer_envelope, geodesic_distance};
