use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::SinkExt;
use futures::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};

use crate::state::AppState;

/// Live feed of newly filed assistance requests.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut events = BroadcastStream::new(state.assistance_events_tx.subscribe());

    info!("assistance feed client connected");

    let send_task = tokio::spawn(async move {
        while let Some(event) = events.next().await {
            let request = match event {
                Ok(request) => request,
                Err(err) => {
                    warn!(error = %err, "assistance feed lagged");
                    continue;
                }
            };

            let json = match serde_json::to_string(&request) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, "failed to serialize assistance request for ws");
                    continue;
                }
            };

            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(_msg)) = receiver.next().await {}
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    info!("assistance feed client disconnected");
}
