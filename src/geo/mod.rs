use crate::models::location::GeoPoint;

const EARTH_RADIUS_KM: f64 = 6_371.0;

pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().atan2((1.0 - haversine).sqrt());

    EARTH_RADIUS_KM * central_angle
}

/// Great-circle distance rounded to one decimal place.
///
/// Rounds half away from zero (`f64::round`). Inputs are not range checked:
/// a NaN coordinate yields NaN, which compares false against any radius.
pub fn distance_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    round_to_tenth(haversine_km(a, b))
}

pub fn round_to_tenth(km: f64) -> f64 {
    (km * 10.0).round() / 10.0
}

pub fn directions_url(origin: &GeoPoint, destination: &GeoPoint) -> String {
    format!(
        "https://www.google.com/maps/dir/?api=1&origin={},{}&destination={},{}",
        origin.lat, origin.lng, destination.lat, destination.lng
    )
}
