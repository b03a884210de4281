use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::config::Settings;
use crate::models::assistance::AssistanceRequest;
use crate::observability::metrics::Metrics;
use crate::store::InMemoryGarages;

pub struct AppState {
    pub garages: InMemoryGarages,
    pub assistance_requests: DashMap<Uuid, AssistanceRequest>,
    pub assistance_events_tx: broadcast::Sender<AssistanceRequest>,
    pub metrics: Metrics,
    pub settings: Settings,
}

impl AppState {
    pub fn new(settings: Settings, event_buffer_size: usize) -> Self {
        let (assistance_events_tx, _unused_rx) = broadcast::channel(event_buffer_size.max(1));

        Self {
            garages: InMemoryGarages::new(),
            assistance_requests: DashMap::new(),
            assistance_events_tx,
            metrics: Metrics::new(),
            settings,
        }
    }
}
