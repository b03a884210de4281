pub mod memory;
pub mod sample;

use futures::future::BoxFuture;

use crate::error::DirectoryError;
use crate::models::garage::{GarageRecord, VehicleType};

pub use memory::InMemoryGarages;

/// The logical query issued against the garage collection: approved and
/// active documents, optionally narrowed to one vehicle type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GarageFilter {
    pub vehicle_type: Option<VehicleType>,
}

impl GarageFilter {
    pub fn matches(&self, record: &GarageRecord) -> bool {
        let serves = self
            .vehicle_type
            .is_none_or(|vehicle_type| record.vehicle_types.contains(&vehicle_type));
        record.is_listed() && serves
    }
}

pub trait GarageCollection: Send + Sync {
    fn query(
        &self,
        filter: GarageFilter,
    ) -> BoxFuture<'_, Result<Vec<GarageRecord>, DirectoryError>>;
}
