use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::engine::nearby::search;
use crate::engine::view::{count_by_vehicle_type, ResultSource, VehicleTypeCounts};
use crate::error::AppError;
use crate::models::garage::{GarageRecord, GarageStatus, GarageWithDistance, VehicleType};
use crate::models::location::GeoPoint;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/garages", post(register_garage).get(list_garages))
        .route("/garages/import", post(import_garages))
        .route("/garages/nearby", get(nearby_garages))
        .route("/garages/:id", delete(delete_garage))
        .route("/garages/:id/status", patch(update_garage_status))
        .route("/garages/:id/active", patch(update_garage_active))
}

#[derive(Deserialize)]
pub struct RegisterGarageRequest {
    pub name: String,
    pub location: GeoPoint,
    pub address: String,
    pub phone: String,
    pub vehicle_types: Vec<VehicleType>,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub working_hours: String,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: GarageStatus,
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateActiveRequest {
    pub is_active: bool,
}

#[derive(Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub vehicle_type: Option<String>,
    #[serde(default)]
    pub radius_km: Option<f64>,
}

/// Nearby lookup result. `radius_km` bounds directory results only: when
/// `source` is `sample` the fallback garages are returned at whatever
/// distance they are.
#[derive(Serialize)]
pub struct NearbyResponse {
    pub source: ResultSource,
    pub origin: GeoPoint,
    pub radius_km: f64,
    pub counts: VehicleTypeCounts,
    pub garages: Vec<GarageWithDistance>,
}

#[derive(Serialize)]
pub struct ImportResponse {
    pub imported: usize,
}

async fn register_garage(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterGarageRequest>,
) -> Result<(StatusCode, Json<GarageRecord>), AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }
    if !payload.location.is_valid() {
        return Err(AppError::BadRequest(
            "location must be a valid coordinate".to_string(),
        ));
    }
    if payload.vehicle_types.is_empty() {
        return Err(AppError::BadRequest(
            "at least one vehicle type is required".to_string(),
        ));
    }

    let now = Utc::now();
    let record = GarageRecord {
        id: Uuid::new_v4().to_string(),
        name: Some(payload.name.trim().to_string()),
        location: Some(payload.location),
        address: Some(payload.address),
        phone: Some(payload.phone),
        vehicle_types: payload.vehicle_types,
        services: payload.services,
        rating: Some(payload.rating.unwrap_or(0.0).clamp(0.0, 5.0)),
        working_hours: Some(payload.working_hours),
        status: Some(GarageStatus::Pending),
        is_active: Some(true),
        rejection_reason: None,
        reviewed_at: None,
        created_at: Some(now),
        updated_at: Some(now),
    };

    let stored = state.garages.insert_record(record);
    info!(garage_id = %stored.id, "garage registered for review");
    Ok((StatusCode::CREATED, Json(stored)))
}

async fn list_garages(State(state): State<Arc<AppState>>) -> Json<Vec<GarageRecord>> {
    Json(state.garages.list())
}

async fn import_garages(
    State(state): State<Arc<AppState>>,
    Json(records): Json<Vec<GarageRecord>>,
) -> Json<ImportResponse> {
    let imported = records.len();
    for record in records {
        state.garages.insert_record(record);
    }

    info!(imported, "garage records imported");
    Json(ImportResponse { imported })
}

async fn nearby_garages(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<NearbyResponse>, AppError> {
    let origin = GeoPoint {
        lat: query.lat,
        lng: query.lng,
    };
    if !origin.is_valid() {
        return Err(AppError::BadRequest(
            "lat/lng must be a valid coordinate".to_string(),
        ));
    }

    let radius_km = query.radius_km.unwrap_or(state.settings.search_radius_km);
    if radius_km.is_nan() || radius_km <= 0.0 {
        return Err(AppError::BadRequest("radius_km must be > 0".to_string()));
    }

    let vehicle_type =
        VehicleType::parse_filter(query.vehicle_type.as_deref()).map_err(AppError::BadRequest)?;

    let nearby = search(&state, &origin, vehicle_type, radius_km).await?;

    Ok(Json(NearbyResponse {
        source: nearby.source,
        origin,
        radius_km,
        counts: count_by_vehicle_type(&nearby.garages),
        garages: nearby.garages,
    }))
}

async fn update_garage_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<GarageRecord>, AppError> {
    if payload.status == GarageStatus::Pending {
        return Err(AppError::BadRequest(
            "status must be approved or rejected".to_string(),
        ));
    }

    let rejection_reason = payload
        .rejection_reason
        .map(|reason| reason.trim().to_string())
        .filter(|reason| !reason.is_empty());
    if payload.status == GarageStatus::Rejected && rejection_reason.is_none() {
        return Err(AppError::BadRequest(
            "rejection_reason is required to reject a garage".to_string(),
        ));
    }

    let updated = state
        .garages
        .set_status(&id, payload.status, rejection_reason)
        .ok_or_else(|| AppError::NotFound(format!("garage {} not found", id)))?;

    info!(
        garage_id = %id,
        status = ?payload.status,
        reason = updated.rejection_reason.as_deref().unwrap_or(""),
        "garage moderated"
    );
    Ok(Json(updated))
}

async fn update_garage_active(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateActiveRequest>,
) -> Result<Json<GarageRecord>, AppError> {
    let updated = state
        .garages
        .set_active(&id, payload.is_active)
        .ok_or_else(|| AppError::NotFound(format!("garage {} not found", id)))?;

    Ok(Json(updated))
}

async fn delete_garage(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state
        .garages
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("garage {} not found", id)))?;

    info!(garage_id = %id, "garage deleted");
    Ok(StatusCode::NO_CONTENT)
}
