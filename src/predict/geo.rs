pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Flat-earth approximation used for short dead-reckoning hops.
pub const METERS_PER_DEGREE: f64 = 111_000.0;

const DEGENERATE_ARC_RAD: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl From<(f64, f64)> for LatLon {
    fn from((lat, lon): (f64, f64)) -> Self {
        Self { lat, lon }
    }
}

/// Central angle between two points, in radians.
fn central_angle(a: LatLon, b: LatLon) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Great-circle distance in meters.
pub fn haversine_distance(a: LatLon, b: LatLon) -> f64 {
    EARTH_RADIUS_M * central_angle(a, b)
}

/// Point at `fraction` of the great-circle path from `from` to `to`.
pub fn interpolate_great_circle(from: LatLon, to: LatLon, fraction: f64) -> LatLon {
    let d = central_angle(from, to);
    if d < DEGENERATE_ARC_RAD {
        return from;
    }

    let (lat1, lon1) = (from.lat.to_radians(), from.lon.to_radians());
    let (lat2, lon2) = (to.lat.to_radians(), to.lon.to_radians());
    let a = ((1.0 - fraction) * d).sin() / d.sin();
    let b = (fraction * d).sin() / d.sin();

    let x = a * lat1.cos() * lon1.cos() + b * lat2.cos() * lon2.cos();
    let y = a * lat1.cos() * lon1.sin() + b * lat2.cos() * lon2.sin();
    let z = a * lat1.sin() + b * lat2.sin();

    LatLon {
        lat: z.atan2((x * x + y * y).sqrt()).to_degrees(),
        lon: y.atan2(x).to_degrees(),
    }
}

/// Moves `from` by `distance_m` along `heading_deg` (0 = north, clockwise).
pub fn dead_reckon(from: LatLon, heading_deg: f64, distance_m: f64) -> LatLon {
    let heading = heading_deg.to_radians();
    let north = distance_m * heading.cos();
    let east = distance_m * heading.sin();

    let meters_per_deg_lon = METERS_PER_DEGREE * from.lat.to_radians().cos();
    let dlon = if meters_per_deg_lon.abs() > f64::EPSILON {
        east / meters_per_deg_lon
    } else {
        0.0
    };

    LatLon {
        lat: (from.lat + north / METERS_PER_DEGREE).clamp(-90.0, 90.0),
        lon: normalize_longitude(from.lon + dlon),
    }
}

fn normalize_longitude(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 && lon > 0.0 {
        180.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const AMS: LatLon = LatLon { lat: 52.3086, lon: 4.7639 };
    const JFK: LatLon = LatLon { lat: 40.6413, lon: -73.7781 };

    #[test]
    fn known_distance() {
        // Amsterdam to New York is roughly 5,850 km.
        let d = haversine_distance(AMS, JFK);
        assert!(d > 5_800_000.0 && d < 5_900_000.0, "got {d}");
        assert_abs_diff_eq!(haversine_distance(AMS, AMS), 0.0);
    }

    #[test]
    fn interpolation_hits_both_endpoints() {
        let start = interpolate_great_circle(AMS, JFK, 0.0);
        let end = interpolate_great_circle(AMS, JFK, 1.0);
        assert_abs_diff_eq!(start.lat, AMS.lat, epsilon = 1e-9);
        assert_abs_diff_eq!(start.lon, AMS.lon, epsilon = 1e-9);
        assert_abs_diff_eq!(end.lat, JFK.lat, epsilon = 1e-9);
        assert_abs_diff_eq!(end.lon, JFK.lon, epsilon = 1e-9);
    }

    #[test]
    fn midpoint_is_equidistant() {
        let mid = interpolate_great_circle(AMS, JFK, 0.5);
        assert_abs_diff_eq!(
            haversine_distance(AMS, mid),
            haversine_distance(mid, JFK),
            epsilon = 1.0
        );
        // The great circle bends north of both endpoints.
        assert!(mid.lat > AMS.lat);
    }

    #[test]
    fn degenerate_arc_returns_departure() {
        let p = interpolate_great_circle(AMS, AMS, 0.7);
        assert_eq!(p, AMS);
    }

    #[test]
    fn dead_reckoning_east_and_north() {
        let origin = LatLon::new(0.0, 0.0);
        let north = dead_reckon(origin, 0.0, 111_000.0);
        assert_abs_diff_eq!(north.lat, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(north.lon, 0.0, epsilon = 1e-9);

        let east = dead_reckon(origin, 90.0, 111_000.0);
        assert_abs_diff_eq!(east.lat, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(east.lon, 1.0, epsilon = 1e-9);

        let east_at_60 = dead_reckon(LatLon::new(60.0, 10.0), 90.0, 55_500.0);
        assert_abs_diff_eq!(east_at_60.lon, 11.0, epsilon = 1e-9);
    }

    #[test]
    fn longitude_wraps_at_antimeridian() {
        let p = dead_reckon(LatLon::new(0.0, 179.9), 90.0, 22_200.0);
        assert_abs_diff_eq!(p.lon, -179.9, epsilon = 1e-6);
        assert_eq!(normalize_longitude(180.0), 180.0);
        assert_eq!(normalize_longitude(-180.0), -180.0);
    }
}
