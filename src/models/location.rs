use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

/// A fix reported by a positioning device.
///
/// `accuracy` is the radius of uncertainty in meters. Devices do not always
/// report it; a fix without accuracy ranks below every fix that has one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub accuracy: Option<f64>,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64, accuracy: Option<f64>) -> Self {
        Self {
            latitude,
            longitude,
            accuracy,
        }
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint {
            lat: self.latitude,
            lng: self.longitude,
        }
    }

    pub fn accuracy_or_worst(&self) -> f64 {
        match self.accuracy {
            Some(meters) if meters.is_finite() && meters >= 0.0 => meters,
            _ => f64::INFINITY,
        }
    }

    pub fn is_valid(&self) -> bool {
        let accuracy_ok = self.accuracy.is_none_or(|meters| meters >= 0.0);
        self.point().is_valid() && accuracy_ok
    }
}
