use crate::models::garage::{Garage, GarageStatus, VehicleType};
use crate::models::location::GeoPoint;

struct SampleGarage {
    name: &'static str,
    vehicle_types: &'static [VehicleType],
    lat: f64,
    lng: f64,
    address: &'static str,
    phone: &'static str,
    rating: f64,
    services: &'static [&'static str],
    working_hours: &'static str,
}

const SAMPLES: [SampleGarage; 5] = [
    SampleGarage {
        name: "Quick Fix Motors",
        vehicle_types: &[VehicleType::TwoWheeler],
        lat: 12.9716,
        lng: 77.5946,
        address: "MG Road, Bangalore",
        phone: "+91 9876543210",
        rating: 4.5,
        services: &["Repair", "Maintenance", "Parts"],
        working_hours: "9 AM - 7 PM",
    },
    SampleGarage {
        name: "Auto Care Center",
        vehicle_types: &[VehicleType::TwoWheeler, VehicleType::ThreeWheeler],
        lat: 12.9352,
        lng: 77.6245,
        address: "Indiranagar, Bangalore",
        phone: "+91 9876543211",
        rating: 4.2,
        services: &["Repair", "Service", "Spare Parts"],
        working_hours: "8 AM - 8 PM",
    },
    SampleGarage {
        name: "City Service Station",
        vehicle_types: &[VehicleType::ThreeWheeler, VehicleType::FourWheeler],
        lat: 12.9698,
        lng: 77.7500,
        address: "Whitefield, Bangalore",
        phone: "+91 9876543212",
        rating: 4.7,
        services: &["Full Service", "Body Work", "Painting"],
        working_hours: "9 AM - 6 PM",
    },
    SampleGarage {
        name: "Express Auto Repair",
        vehicle_types: &[
            VehicleType::TwoWheeler,
            VehicleType::ThreeWheeler,
            VehicleType::FourWheeler,
        ],
        lat: 12.9141,
        lng: 77.6411,
        address: "Koramangala, Bangalore",
        phone: "+91 9876543213",
        rating: 4.6,
        services: &["Emergency Repair", "24/7 Service", "Towing"],
        working_hours: "24 Hours",
    },
    SampleGarage {
        name: "Bike World",
        vehicle_types: &[VehicleType::TwoWheeler],
        lat: 13.0358,
        lng: 77.5970,
        address: "Malleshwaram, Bangalore",
        phone: "+91 9876543214",
        rating: 4.3,
        services: &["Bike Repair", "Accessories", "Customization"],
        working_hours: "10 AM - 8 PM",
    },
];

/// Fallback dataset shown when the directory has nothing to offer.
pub fn sample_garages() -> Vec<Garage> {
    SAMPLES
        .iter()
        .enumerate()
        .map(|(index, sample)| Garage {
            id: format!("sample-{index}"),
            name: sample.name.to_string(),
            location: GeoPoint {
                lat: sample.lat,
                lng: sample.lng,
            },
            address: sample.address.to_string(),
            phone: sample.phone.to_string(),
            vehicle_types: sample.vehicle_types.to_vec(),
            services: sample.services.iter().map(|s| s.to_string()).collect(),
            rating: sample.rating,
            working_hours: sample.working_hours.to_string(),
            status: GarageStatus::Approved,
            is_active: true,
        })
        .collect()
}
