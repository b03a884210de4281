use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::garage::VehicleType;
use crate::models::location::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestType {
    ViewSolution,
    EmergencyAssistance,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::ViewSolution => "view-solution",
            RequestType::EmergencyAssistance => "emergency-assistance",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestStatus {
    Pending,
    InProgress,
    Resolved,
    Cancelled,
}

impl RequestStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, RequestStatus::Pending | RequestStatus::InProgress)
    }

    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        match (self, next) {
            (RequestStatus::Pending, RequestStatus::InProgress)
            | (RequestStatus::Pending, RequestStatus::Cancelled)
            | (RequestStatus::InProgress, RequestStatus::Resolved)
            | (RequestStatus::InProgress, RequestStatus::Cancelled) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistanceRequest {
    pub id: Uuid,
    pub user_id: String,
    pub problem_id: Option<String>,
    pub vehicle_type: Option<VehicleType>,
    pub request_type: RequestType,
    pub location: Coordinate,
    pub status: RequestStatus,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
