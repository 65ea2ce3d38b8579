use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6_371.0;
const SECONDS_PER_HOUR: f64 = 3_600.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Finite and within WGS84 bounds. The distance functions do not check
    /// this themselves.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Great-circle distance in kilometres. NaN or infinite coordinates yield a
/// non-finite result.
pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    // Rounding can push the term just outside [0, 1]; clamp keeps NaN as NaN.
    let haversine =
        (sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng).clamp(0.0, 1.0);
    let central_angle = 2.0 * haversine.sqrt().atan2((1.0 - haversine).sqrt());

    EARTH_RADIUS_KM * central_angle
}

/// Whole seconds needed to cover `distance_km` at `average_speed_kmh`.
pub fn travel_seconds(distance_km: f64, average_speed_kmh: f64) -> f64 {
    (distance_km / average_speed_kmh * SECONDS_PER_HOUR).trunc()
}

#[cfg(test)]
mod tests {
    use super::{haversine_km, travel_seconds, GeoPoint};

    #[test]
    fn zero_distance_for_same_point() {
        let p = GeoPoint::new(53.5511, 9.9937);
        let distance = haversine_km(&p, &p);
        assert!(distance < 1e-9);
    }

    #[test]
    fn near_identical_points_are_finite_and_tiny() {
        let a = GeoPoint::new(-23.550520, -46.633308);
        let b = GeoPoint::new(-23.550520 + 1e-12, -46.633308 - 1e-12);
        let distance = haversine_km(&a, &b);
        assert!(distance.is_finite());
        assert!(distance < 1e-6);
    }

    #[test]
    fn london_to_paris_is_around_343_km() {
        let london = GeoPoint::new(51.5074, -0.1278);
        let paris = GeoPoint::new(48.8566, 2.3522);
        let distance = haversine_km(&london, &paris);
        assert!((distance - 343.0).abs() < 5.0);
    }

    #[test]
    fn one_degree_of_longitude_on_the_equator() {
        let distance = haversine_km(&GeoPoint::new(0.0, 0.0), &GeoPoint::new(0.0, 1.0));
        assert!((distance - 111.195).abs() < 0.01);
    }

    #[test]
    fn antipodal_points_are_half_the_circumference() {
        let distance = haversine_km(&GeoPoint::new(0.0, 0.0), &GeoPoint::new(0.0, 180.0));
        assert!((distance - std::f64::consts::PI * 6_371.0).abs() < 1e-6);
    }

    #[test]
    fn nan_coordinates_propagate() {
        let distance = haversine_km(&GeoPoint::new(f64::NAN, 0.0), &GeoPoint::new(0.0, 0.0));
        assert!(distance.is_nan());
    }

    #[test]
    fn travel_time_is_truncated_to_whole_seconds() {
        assert_eq!(travel_seconds(30.0, 30.0), 3_600.0);
        assert_eq!(travel_seconds(15.0, 30.0), 1_800.0);
        assert_eq!(travel_seconds(0.0105, 30.0), 1.0);
    }

    #[test]
    fn validity_checks_range_and_finiteness() {
        assert!(GeoPoint::new(-90.0, 180.0).is_valid());
        assert!(!GeoPoint::new(90.5, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, f64::INFINITY).is_valid());
    }
}
