/// Calculate distance between two coordinates using Haversine formula
/// Returns distance in kilometers
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Check if a pickup point falls inside a car wash's service area
pub fn is_within_radius(
    pickup_lat: f64,
    pickup_lng: f64,
    base_lat: f64,
    base_lng: f64,
    max_radius_km: f64,
) -> bool {
    haversine_distance(pickup_lat, pickup_lng, base_lat, base_lng) <= max_radius_km
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_nairobi_thika() {
        // Nairobi CBD
        let nairobi = (-1.2864, 36.8172);
        // Thika town
        let thika = (-1.0333, 37.0693);

        let distance = haversine_distance(nairobi.0, nairobi.1, thika.0, thika.1);
        // Roughly 40 km apart
        assert!(distance > 30.0 && distance < 50.0);
    }

    #[test]
    fn test_within_service_area() {
        let base = (-1.2864, 36.8172); // car wash in Nairobi CBD
        let nearby = (-1.29, 36.82);   // pickup a few blocks away

        assert!(is_within_radius(nearby.0, nearby.1, base.0, base.1, 10.0));

        let far = (-1.0333, 37.0693); // Thika
        assert!(!is_within_radius(far.0, far.1, base.0, base.1, 10.0));
    }
}
