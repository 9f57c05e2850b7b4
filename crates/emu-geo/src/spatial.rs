use emu_core::models::{Envelope, Location};
use geo::{Destination, Distance, Geodesic, Point};

/// Geodesic distance in meters between two lon/lat locations on the WGS 84
/// ellipsoid
pub fn geodesic_distance(a: Location, b: Location) -> f64 {
    Geodesic.distance(to_point(a), to_point(b))
}

/// Envelope enclosing a geodesic circle of `radius_meters` around `center`.
///
/// When the circle reaches a pole, that latitude edge is the pole and the
/// envelope spans every longitude. An east or west edge that wraps past the
/// antimeridian is truncated at ±180 rather than split.
pub fn buffer_envelope(center: Location, radius_meters: f64) -> Envelope {
    let origin = to_point(center);

    let reaches_north_pole =
        Geodesic.distance(origin, Point::new(center.lon, 90.0)) <= radius_meters;
    let reaches_south_pole =
        Geodesic.distance(origin, Point::new(center.lon, -90.0)) <= radius_meters;

    let max_lat = if reaches_north_pole {
        90.0
    } else {
        Geodesic.destination(origin, 0.0, radius_meters).y().max(center.lat)
    };
    let min_lat = if reaches_south_pole {
        -90.0
    } else {
        Geodesic.destination(origin, 180.0, radius_meters).y().min(center.lat)
    };

    if reaches_north_pole || reaches_south_pole {
        return Envelope { min_lon: -180.0, min_lat, max_lon: 180.0, max_lat };
    }

    let east = Geodesic.destination(origin, 90.0, radius_meters).x();
    let west = Geodesic.destination(origin, 270.0, radius_meters).x();

    // Destinations come back normalized to [-180, 180]; a wrapped edge lands
    // on the wrong side of the center.
    let max_lon = if east < center.lon { 180.0 } else { east };
    let min_lon = if west > center.lon { -180.0 } else { west };

    Envelope { min_lon, min_lat, max_lon, max_lat }
}

fn to_point(location: Location) -> Point<f64> {
    Point::new(location.lon, location.lat)
}
