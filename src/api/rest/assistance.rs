use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::assistance::{file_request, update_notes, update_status, NewAssistanceRequest};
use crate::error::AppError;
use crate::models::assistance::{AssistanceRequest, RequestStatus};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/assistance-requests",
            post(create_request).get(list_requests),
        )
        .route("/assistance-requests/:id", get(get_request))
        .route("/assistance-requests/:id/status", patch(update_request_status))
        .route("/assistance-requests/:id/notes", patch(update_request_notes))
}

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub status: Option<RequestStatus>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: RequestStatus,
}

#[derive(Deserialize)]
pub struct UpdateNotesRequest {
    pub notes: String,
}

async fn create_request(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewAssistanceRequest>,
) -> Result<(StatusCode, Json<AssistanceRequest>), AppError> {
    let request = file_request(&state, payload)?;
    Ok((StatusCode::CREATED, Json(request)))
}

async fn list_requests(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<AssistanceRequest>> {
    let mut requests: Vec<AssistanceRequest> = state
        .assistance_requests
        .iter()
        .map(|entry| entry.value().clone())
        .filter(|request| query.status.is_none_or(|status| request.status == status))
        .collect();
    requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Json(requests)
}

async fn get_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<AssistanceRequest>, AppError> {
    let request = state
        .assistance_requests
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("assistance request {} not found", id)))?;

    Ok(Json(request.value().clone()))
}

async fn update_request_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<AssistanceRequest>, AppError> {
    let updated = update_status(&state, id, payload.status)?;
    Ok(Json(updated))
}

async fn update_request_notes(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateNotesRequest>,
) -> Result<Json<AssistanceRequest>, AppError> {
    let updated = update_notes(&state, id, payload.notes)?;
    Ok(Json(updated))
}
