use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DirectoryError;
use crate::models::location::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleType {
    #[serde(rename = "2-wheeler")]
    TwoWheeler,
    #[serde(rename = "3-wheeler")]
    ThreeWheeler,
    #[serde(rename = "4-wheeler")]
    FourWheeler,
}

impl VehicleType {
    pub const ALL: [VehicleType; 3] = [
        VehicleType::TwoWheeler,
        VehicleType::ThreeWheeler,
        VehicleType::FourWheeler,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::TwoWheeler => "2-wheeler",
            VehicleType::ThreeWheeler => "3-wheeler",
            VehicleType::FourWheeler => "4-wheeler",
        }
    }

    /// Parses a vehicle-type filter where `all` (or nothing) means no filter.
    pub fn parse_filter(raw: Option<&str>) -> Result<Option<Self>, String> {
        match raw.map(str::trim) {
            None | Some("") | Some("all") => Ok(None),
            Some(value) => value.parse().map(Some),
        }
    }
}

impl FromStr for VehicleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VehicleType::ALL
            .into_iter()
            .find(|vehicle_type| vehicle_type.as_str() == s)
            .ok_or_else(|| {
                format!("unknown vehicle type: {s}, expected 2-wheeler/3-wheeler/4-wheeler")
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GarageStatus {
    Pending,
    Approved,
    Rejected,
}

/// A garage document as it sits in the collection.
///
/// Documents are written by several paths (registration, bulk import) so
/// nothing beyond the id is guaranteed to be present. Convert to [`Garage`]
/// before trusting any field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GarageRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub vehicle_types: Vec<VehicleType>,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub working_hours: Option<String>,
    #[serde(default)]
    pub status: Option<GarageStatus>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl GarageRecord {
    pub fn is_listed(&self) -> bool {
        self.status == Some(GarageStatus::Approved) && self.is_active == Some(true)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Garage {
    pub id: String,
    pub name: String,
    pub location: GeoPoint,
    pub address: String,
    pub phone: String,
    pub vehicle_types: Vec<VehicleType>,
    pub services: Vec<String>,
    pub rating: f64,
    pub working_hours: String,
    pub status: GarageStatus,
    pub is_active: bool,
}

impl Garage {
    pub fn serves(&self, vehicle_type: VehicleType) -> bool {
        self.vehicle_types.contains(&vehicle_type)
    }
}

impl TryFrom<GarageRecord> for Garage {
    type Error = DirectoryError;

    fn try_from(record: GarageRecord) -> Result<Self, Self::Error> {
        let malformed = |reason: &'static str| DirectoryError::MalformedRecord {
            id: record.id.clone(),
            reason,
        };

        let location = record.location.ok_or_else(|| malformed("missing location"))?;
        if !location.is_valid() {
            return Err(malformed("location out of range"));
        }

        let name = match record.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Err(malformed("missing name")),
        };

        Ok(Self {
            id: record.id,
            name,
            location,
            address: record.address.unwrap_or_default(),
            phone: record.phone.unwrap_or_default(),
            vehicle_types: record.vehicle_types,
            services: record.services,
            rating: record.rating.unwrap_or(0.0).clamp(0.0, 5.0),
            working_hours: record.working_hours.unwrap_or_default(),
            status: record.status.unwrap_or(GarageStatus::Pending),
            is_active: record.is_active.unwrap_or(false),
        })
    }
}

/// A garage annotated with its distance from the query origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GarageWithDistance {
    #[serde(flatten)]
    pub garage: Garage,
    pub distance_km: f64,
}

#[cfg(test)]
mod tests {
    use super::{Garage, GarageRecord, GarageStatus, VehicleType};
    use crate::error::DirectoryError;
    use crate::models::location::GeoPoint;

    fn record() -> GarageRecord {
        GarageRecord {
            id: "g-1".to_string(),
            name: Some("Quick Fix Motors".to_string()),
            location: Some(GeoPoint {
                lat: 12.9716,
                lng: 77.5946,
            }),
            vehicle_types: vec![VehicleType::TwoWheeler],
            status: Some(GarageStatus::Approved),
            is_active: Some(true),
            ..GarageRecord::default()
        }
    }

    #[test]
    fn vehicle_type_uses_wheeler_names_on_the_wire() {
        let json = serde_json::to_string(&VehicleType::FourWheeler).unwrap();
        assert_eq!(json, "\"4-wheeler\"");
        assert_eq!("3-wheeler".parse::<VehicleType>(), Ok(VehicleType::ThreeWheeler));
        assert!("truck".parse::<VehicleType>().is_err());
    }

    #[test]
    fn all_filter_means_no_vehicle_predicate() {
        assert_eq!(VehicleType::parse_filter(Some("all")), Ok(None));
        assert_eq!(VehicleType::parse_filter(None), Ok(None));
        assert_eq!(
            VehicleType::parse_filter(Some("2-wheeler")),
            Ok(Some(VehicleType::TwoWheeler))
        );
    }

    #[test]
    fn record_without_location_is_malformed() {
        let mut raw = record();
        raw.location = None;

        let err = Garage::try_from(raw).unwrap_err();
        assert!(matches!(
            err,
            DirectoryError::MalformedRecord { ref id, reason: "missing location" } if id == "g-1"
        ));
    }

    #[test]
    fn record_with_blank_name_is_malformed() {
        let mut raw = record();
        raw.name = Some("   ".to_string());
        assert!(Garage::try_from(raw).is_err());
    }

    #[test]
    fn valid_record_fills_optional_fields() {
        let garage = Garage::try_from(record()).unwrap();
        assert_eq!(garage.name, "Quick Fix Motors");
        assert_eq!(garage.address, "");
        assert_eq!(garage.rating, 0.0);
        assert!(garage.serves(VehicleType::TwoWheeler));
        assert!(!garage.serves(VehicleType::FourWheeler));
    }
}
