use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use futures::SinkExt;
use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};

use crate::engine::session::{ClientMessage, FindSession, SessionParams};
use crate::error::AppError;
use crate::models::assistance::RequestType;
use crate::models::garage::VehicleType;
use crate::state::AppState;

const SESSION_CHANNEL_SIZE: usize = 64;

#[derive(Deserialize)]
pub struct FindQuery {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub problem_id: Option<String>,
    #[serde(default)]
    pub vehicle_type: Option<String>,
    #[serde(default)]
    pub request_type: Option<RequestType>,
    #[serde(default)]
    pub radius_km: Option<f64>,
}

impl FindQuery {
    fn into_params(self, default_radius_km: f64) -> Result<SessionParams, AppError> {
        let radius_km = self.radius_km.unwrap_or(default_radius_km);
        if radius_km.is_nan() || radius_km <= 0.0 {
            return Err(AppError::BadRequest("radius_km must be > 0".to_string()));
        }

        let vehicle_type =
            VehicleType::parse_filter(self.vehicle_type.as_deref()).map_err(AppError::BadRequest)?;
        let user_id = self.user_id.filter(|id| !id.trim().is_empty());
        if self.request_type.is_some() && user_id.is_none() {
            return Err(AppError::BadRequest(
                "user_id is required to file an assistance request".to_string(),
            ));
        }

        Ok(SessionParams {
            user_id,
            problem_id: self.problem_id,
            vehicle_type,
            request_type: self.request_type,
            radius_km,
        })
    }
}

/// Garage-finding session over a websocket. The client streams its
/// geolocation samples and receives the fix, nearby garages and selection
/// updates.
pub async fn find_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<FindQuery>,
) -> Result<Response, AppError> {
    let params = query.into_params(state.settings.search_radius_km)?;
    Ok(ws
        .on_upgrade(|socket| handle_session(socket, state, params))
        .into_response())
}

async fn handle_session(socket: WebSocket, state: Arc<AppState>, params: SessionParams) {
    let (mut sender, mut receiver) = socket.split();
    let (incoming_tx, incoming_rx) = mpsc::channel::<ClientMessage>(SESSION_CHANNEL_SIZE);
    let (outgoing_tx, mut outgoing_rx) = mpsc::channel(SESSION_CHANNEL_SIZE);

    info!("find session client connected");

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            let text = match message {
                Message::Text(text) => text,
                Message::Close(_) => break,
                _ => continue,
            };

            match serde_json::from_str::<ClientMessage>(&text) {
                Ok(parsed) => {
                    if incoming_tx.send(parsed).await.is_err() {
                        break;
                    }
                }
                Err(err) => warn!(error = %err, "unparseable find session message"),
            }
        }
    });

    let send_task = tokio::spawn(async move {
        while let Some(reply) = outgoing_rx.recv().await {
            let json = match serde_json::to_string(&reply) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, "failed to serialize find session reply");
                    continue;
                }
            };

            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    FindSession::new(state, params)
        .run(ReceiverStream::new(incoming_rx), outgoing_tx)
        .await;

    recv_task.abort();
    if let Err(err) = send_task.await {
        warn!(error = %err, "find session writer failed");
    }

    info!("find session client disconnected");
}
