use emu_core::models::{Location, WaterColumn};

use crate::aggregate::ColumnsByLocation;
use crate::spatial::geodesic_distance;

/// Pair every column with its geodesic distance from `center`, nearest first.
///
/// The sort is stable: columns at equal distance keep their input order.
pub fn rank_by_distance(
    center: Location,
    columns: impl IntoIterator<Item = WaterColumn>,
) -> Vec<(WaterColumn, f64)> {
    rank_by(center, columns, geodesic_distance)
}

/// Pick the column nearest to `center` using geodesic distance
pub fn select_nearest(center: Location, candidates: ColumnsByLocation) -> Option<WaterColumn> {
    select_nearest_by(center, candidates, geodesic_distance)
}

/// Pick the column nearest to `center` under the given distance function.
///
/// No candidates yields `None`. A single candidate is returned as-is and the
/// distance function is never called.
pub fn select_nearest_by(
    center: Location,
    candidates: ColumnsByLocation,
    distance: impl FnMut(Location, Location) -> f64,
) -> Option<WaterColumn> {
    let mut columns = candidates.into_columns();
    match columns.len() {
        0 => None,
        1 => columns.pop(),
        _ => {
            let ranked = rank_by(center, columns, distance);
            if let (Some((_, nearest)), Some((_, furthest))) = (ranked.first(), ranked.last()) {
                tracing::debug!(
                    candidates = ranked.len(),
                    nearest_meters = nearest,
                    furthest_meters = furthest,
                    "Ranked water columns by distance"
                );
            }
            ranked.into_iter().next().map(|(column, _)| column)
        }
    }
}

fn rank_by(
    center: Location,
    columns: impl IntoIterator<Item = WaterColumn>,
    mut distance: impl FnMut(Location, Location) -> f64,
) -> Vec<(WaterColumn, f64)> {
    let mut ranked: Vec<(WaterColumn, f64)> = columns
        .into_iter()
        .map(|column| {
            let d = distance(center, column.location());
            (column, d)
        })
        .collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use emu_core::models::{ClusterDescriptor, ClusterId, Measurements, Observation};
    use proptest::prelude::*;

    fn observation(location: Location, cluster: u32) -> Observation {
        Observation {
            cluster: ClusterDescriptor {
                id: ClusterId(cluster),
                physical_summary: String::new(),
                nutrient_summary: String::new(),
                geomorphology_base: String::new(),
                geomorphology_features: String::new(),
            },
            top_depth: 0,
            thickness: 25,
            location,
            measurements: Measurements::default(),
        }
    }

    fn columns_at(locations: &[Location]) -> ColumnsByLocation {
        aggregate(locations.iter().enumerate().map(|(i, l)| observation(*l, i as u32)))
    }

    #[test]
    fn test_no_candidates() {
        assert!(select_nearest(Location::new(0.0, 0.0), ColumnsByLocation::new()).is_none());
    }

    #[test]
    fn test_single_candidate_skips_distance() {
        let far = Location::new(170.0, -80.0);
        let mut calls = 0;
        let selected = select_nearest_by(Location::new(0.0, 0.0), columns_at(&[far]), |_, _| {
            calls += 1;
            0.0
        });

        assert_eq!(selected.unwrap().location(), far);
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_picks_geodesically_nearest() {
        let center = Location::new(-40.0, 10.0);
        // Roughly 50 km and 5 km east of the center
        let far = Location::new(-39.543, 10.0);
        let near = Location::new(-39.9543, 10.0);

        let selected = select_nearest(center, columns_at(&[far, near])).unwrap();
        assert_eq!(selected.location(), near);
    }

    #[test]
    fn test_ties_keep_first_encountered() {
        let center = Location::new(0.0, 0.0);
        let east = Location::new(0.1, 0.0);
        let west = Location::new(-0.1, 0.0);

        let selected = select_nearest_by(center, columns_at(&[west, east]), |_, _| 42.0).unwrap();
        assert_eq!(selected.location(), west);

        let selected = select_nearest_by(center, columns_at(&[east, west]), |_, _| 42.0).unwrap();
        assert_eq!(selected.location(), east);
    }

    #[test]
    fn test_rank_by_distance_is_ascending() {
        let center = Location::new(20.0, 60.0);
        let columns = columns_at(&[
            Location::new(21.0, 60.0),
            Location::new(20.1, 60.0),
            Location::new(20.5, 60.0),
        ])
        .into_columns();

        let ranked = rank_by_distance(center, columns);
        let lons: Vec<f64> = ranked.iter().map(|(c, _)| c.location().lon).collect();
        assert_eq!(lons, vec![20.1, 20.5, 21.0]);
        assert!(ranked.windows(2).all(|w| w[0].1 <= w[1].1));
    }

    proptest! {
        #[test]
        fn selected_column_has_minimal_distance(
            points in proptest::collection::vec((-60.0f64..60.0, -60.0f64..60.0), 2..12),
            center in (-60.0f64..60.0, -60.0f64..60.0),
        ) {
            let center = Location::new(center.0, center.1);
            let locations: Vec<Location> =
                points.iter().map(|(x, y)| Location::new(*x, *y)).collect();
            let columns = columns_at(&locations);
            let distances: Vec<f64> =
                columns.iter().map(|c| geodesic_distance(center, c.location())).collect();
            let min = distances.iter().cloned().fold(f64::INFINITY, f64::min);

            let selected = select_nearest(center, columns).unwrap();
            prop_assert_eq!(geodesic_distance(center, selected.location()), min);
        }
    }
}
