use std::time::Instant;

use tracing::{debug, info, warn};

use crate::engine::view::ResultSource;
use crate::error::DirectoryError;
use crate::geo::distance_km;
use crate::models::garage::{Garage, GarageWithDistance, VehicleType};
use crate::models::location::GeoPoint;
use crate::state::AppState;
use crate::store::sample::sample_garages;
use crate::store::{GarageCollection, GarageFilter};

#[derive(Debug, Clone)]
pub struct NearbyGarages {
    pub source: ResultSource,
    pub garages: Vec<GarageWithDistance>,
}

/// Directory lookup as served to clients: falls back to the sample dataset
/// when the directory has no match and the fallback is enabled.
pub async fn search(
    state: &AppState,
    origin: &GeoPoint,
    vehicle_type: Option<VehicleType>,
    radius_km: f64,
) -> Result<NearbyGarages, DirectoryError> {
    let start = Instant::now();
    let found = find_nearby(&state.garages, origin, vehicle_type, radius_km).await;
    let elapsed = start.elapsed().as_secs_f64();

    let garages = match found {
        Ok(garages) => garages,
        Err(err) => {
            state.metrics.observe_garage_query("error", elapsed);
            return Err(err);
        }
    };

    if garages.is_empty() && state.settings.sample_fallback {
        info!(lat = origin.lat, lng = origin.lng, "directory empty; serving sample garages");
        let samples = sample_garages()
            .into_iter()
            .filter(|garage| vehicle_type.is_none_or(|wanted| garage.serves(wanted)));
        state.metrics.observe_garage_query("sample", elapsed);
        return Ok(NearbyGarages {
            source: ResultSource::Sample,
            garages: annotate_sorted(origin, samples),
        });
    }

    state.metrics.observe_garage_query("directory", elapsed);
    Ok(NearbyGarages {
        source: ResultSource::Directory,
        garages,
    })
}

/// Listed garages within `radius_km` of `origin`, nearest first.
///
/// Documents that fail validation are skipped. Equal distances keep the
/// collection's order.
pub async fn find_nearby<C>(
    collection: &C,
    origin: &GeoPoint,
    vehicle_type: Option<VehicleType>,
    radius_km: f64,
) -> Result<Vec<GarageWithDistance>, DirectoryError>
where
    C: GarageCollection + ?Sized,
{
    let records = collection.query(GarageFilter { vehicle_type }).await?;
    let fetched = records.len();

    let garages = records.into_iter().filter_map(|record| match Garage::try_from(record) {
        Ok(garage) => Some(garage),
        Err(err) => {
            warn!(error = %err, "skipping garage record");
            None
        }
    });

    let mut nearby: Vec<GarageWithDistance> = annotate(origin, garages)
        .filter(|candidate| candidate.distance_km <= radius_km)
        .collect();
    sort_by_distance(&mut nearby);

    debug!(fetched, matched = nearby.len(), radius_km, "nearby garages resolved");
    Ok(nearby)
}

/// Distance-annotated and sorted, without a radius cut.
pub fn annotate_sorted<I>(origin: &GeoPoint, garages: I) -> Vec<GarageWithDistance>
where
    I: IntoIterator<Item = Garage>,
{
    let mut annotated: Vec<GarageWithDistance> = annotate(origin, garages).collect();
    sort_by_distance(&mut annotated);
    annotated
}

fn annotate<I>(origin: &GeoPoint, garages: I) -> impl Iterator<Item = GarageWithDistance>
where
    I: IntoIterator<Item = Garage>,
{
    garages.into_iter().map(move |garage| GarageWithDistance {
        distance_km: distance_km(origin, &garage.location),
        garage,
    })
}

fn sort_by_distance(garages: &mut [GarageWithDistance]) {
    // stable
    garages.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
}
