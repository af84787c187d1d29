use geo::{Distance, Geodesic, Haversine, Point};
use wphase_core::models::DistanceModel;

/// Mean Earth radius in metres, used to express surface lengths as arc degrees
pub const MEAN_EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Metres of mean-radius arc per degree
fn metres_per_degree() -> f64 {
    MEAN_EARTH_RADIUS_M * std::f64::consts::PI / 180.0
}

/// Epicentral distance in degrees between two (lat, lon) positions
pub fn epicentral_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64, model: DistanceModel) -> f64 {
    let p1 = Point::new(lon1, lat1);
    let p2 = Point::new(lon2, lat2);

    let metres = match model {
        DistanceModel::Ellipsoidal => Geodesic.distance(p1, p2),
        DistanceModel::Spherical => Haversine.distance(p1, p2),
    };

    metres / metres_per_degree()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_distance() {
        let d = epicentral_distance(-35.3, 149.1, -35.3, 149.1, DistanceModel::Ellipsoidal);
        assert!(d.abs() < 1e-9);
    }

    #[test]
    fn test_spherical_quarter_circle() {
        // Equator to pole is exactly 90 degrees of central angle
        let d = epicentral_distance(0.0, 0.0, 90.0, 0.0, DistanceModel::Spherical);
        assert!((d - 90.0).abs() < 1e-3, "got {}", d);
    }

    #[test]
    fn test_ellipsoidal_close_to_spherical() {
        let e = epicentral_distance(38.3, 142.4, -35.3, 149.0, DistanceModel::Ellipsoidal);
        let s = epicentral_distance(38.3, 142.4, -35.3, 149.0, DistanceModel::Spherical);
        assert!(e > 70.0 && e < 76.0, "got {}", e);
        // Flattening keeps the two within a fraction of a degree
        assert!((e - s).abs() < 0.5);
    }

    #[test]
    fn test_symmetric() {
        let a = epicentral_distance(10.0, 20.0, -5.0, 100.0, DistanceModel::Ellipsoidal);
        let b = epicentral_distance(-5.0, 100.0, 10.0, 20.0, DistanceModel::Ellipsoidal);
        assert!((a - b).abs() < 1e-9);
    }
}
