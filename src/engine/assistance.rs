use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::assistance::{AssistanceRequest, RequestStatus, RequestType};
use crate::models::garage::VehicleType;
use crate::models::location::Coordinate;
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct NewAssistanceRequest {
    pub user_id: String,
    #[serde(default)]
    pub problem_id: Option<String>,
    #[serde(default)]
    pub vehicle_type: Option<VehicleType>,
    pub request_type: RequestType,
    pub location: Coordinate,
    #[serde(default)]
    pub notes: String,
}

/// Persists a pending request and announces it to live subscribers.
pub fn file_request(
    state: &AppState,
    draft: NewAssistanceRequest,
) -> Result<AssistanceRequest, AppError> {
    if draft.user_id.trim().is_empty() {
        return Err(AppError::BadRequest("user_id cannot be empty".to_string()));
    }
    if !draft.location.is_valid() {
        return Err(AppError::BadRequest(
            "location must be a valid coordinate".to_string(),
        ));
    }

    let now = Utc::now();
    let request = AssistanceRequest {
        id: Uuid::new_v4(),
        user_id: draft.user_id,
        problem_id: draft.problem_id,
        vehicle_type: draft.vehicle_type,
        request_type: draft.request_type,
        location: draft.location,
        status: RequestStatus::Pending,
        notes: draft.notes,
        created_at: now,
        updated_at: now,
    };

    state.assistance_requests.insert(request.id, request.clone());
    state
        .metrics
        .assistance_requests_total
        .with_label_values(&[request.request_type.as_str()])
        .inc();
    state.metrics.assistance_requests_open.inc();
    let _ = state.assistance_events_tx.send(request.clone());

    info!(
        request_id = %request.id,
        user_id = %request.user_id,
        request_type = request.request_type.as_str(),
        "assistance request filed"
    );

    Ok(request)
}

pub fn update_status(
    state: &AppState,
    id: Uuid,
    next: RequestStatus,
) -> Result<AssistanceRequest, AppError> {
    let mut request = state
        .assistance_requests
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("assistance request {} not found", id)))?;

    let current = request.status;
    if current == next {
        return Ok(request.clone());
    }
    if !current.can_transition_to(next) {
        return Err(AppError::Conflict(format!(
            "cannot move assistance request from {current:?} to {next:?}"
        )));
    }

    request.status = next;
    request.updated_at = Utc::now();
    if current.is_open() && !next.is_open() {
        state.metrics.assistance_requests_open.dec();
    }

    info!(request_id = %id, status = ?next, "assistance request updated");
    Ok(request.clone())
}

/// Replaces the admin notes on a request. Closed requests keep accepting
/// notes.
pub fn update_notes(
    state: &AppState,
    id: Uuid,
    notes: String,
) -> Result<AssistanceRequest, AppError> {
    let mut request = state
        .assistance_requests
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("assistance request {} not found", id)))?;

    request.notes = notes;
    request.updated_at = Utc::now();

    info!(request_id = %id, notes_len = request.notes.len(), "assistance notes updated");
    Ok(request.clone())
}
