use serde::{Deserialize, Serialize};

use crate::models::garage::{GarageWithDistance, VehicleType};

/// Where a result set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    Directory,
    Sample,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleTypeCounts {
    pub all: usize,
    #[serde(rename = "2-wheeler")]
    pub two_wheeler: usize,
    #[serde(rename = "3-wheeler")]
    pub three_wheeler: usize,
    #[serde(rename = "4-wheeler")]
    pub four_wheeler: usize,
}

pub fn filter_by_vehicle_type(
    results: &[GarageWithDistance],
    vehicle_type: Option<VehicleType>,
) -> Vec<&GarageWithDistance> {
    results
        .iter()
        .filter(|candidate| vehicle_type.is_none_or(|wanted| candidate.garage.serves(wanted)))
        .collect()
}

pub fn count_by_vehicle_type(results: &[GarageWithDistance]) -> VehicleTypeCounts {
    let count = |vehicle_type| filter_by_vehicle_type(results, Some(vehicle_type)).len();
    VehicleTypeCounts {
        all: results.len(),
        two_wheeler: count(VehicleType::TwoWheeler),
        three_wheeler: count(VehicleType::ThreeWheeler),
        four_wheeler: count(VehicleType::FourWheeler),
    }
}

/// Identifies one query issued for a view. Only the latest ticket may load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTicket(u64);

/// Client-side state of a garage listing: the fetched results, the active
/// vehicle-type facet and the selected garage.
///
/// Changing the facet or loading new results clears the selection. A garage
/// outside the visible subset cannot be selected.
#[derive(Debug, Clone)]
pub struct GarageView {
    results: Vec<GarageWithDistance>,
    source: ResultSource,
    filter: Option<VehicleType>,
    selected: Option<String>,
    generation: u64,
}

impl Default for GarageView {
    fn default() -> Self {
        Self::new(None)
    }
}

impl GarageView {
    pub fn new(filter: Option<VehicleType>) -> Self {
        Self {
            results: Vec::new(),
            source: ResultSource::Directory,
            filter,
            selected: None,
            generation: 0,
        }
    }

    pub fn begin_query(&mut self) -> QueryTicket {
        self.generation += 1;
        QueryTicket(self.generation)
    }

    /// Installs results for `ticket`. Returns false and changes nothing when
    /// a newer query has been started since.
    pub fn load(
        &mut self,
        ticket: QueryTicket,
        results: Vec<GarageWithDistance>,
        source: ResultSource,
    ) -> bool {
        if ticket.0 != self.generation {
            return false;
        }
        self.results = results;
        self.source = source;
        self.selected = None;
        true
    }

    pub fn source(&self) -> ResultSource {
        self.source
    }

    pub fn filter(&self) -> Option<VehicleType> {
        self.filter
    }

    pub fn set_filter(&mut self, filter: Option<VehicleType>) {
        if self.filter != filter {
            self.filter = filter;
            self.selected = None;
        }
    }

    pub fn results(&self) -> &[GarageWithDistance] {
        &self.results
    }

    pub fn visible(&self) -> Vec<&GarageWithDistance> {
        filter_by_vehicle_type(&self.results, self.filter)
    }

    pub fn counts(&self) -> VehicleTypeCounts {
        count_by_vehicle_type(&self.results)
    }

    pub fn select(&mut self, garage_id: &str) -> bool {
        let visible = self
            .visible()
            .iter()
            .any(|candidate| candidate.garage.id == garage_id);
        if visible {
            self.selected = Some(garage_id.to_string());
        }
        visible
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&GarageWithDistance> {
        let id = self.selected.as_deref()?;
        self.results.iter().find(|candidate| candidate.garage.id == id)
    }
}
