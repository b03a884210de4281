//! One garage-finding session per connected client.
//!
//! The client relays its device's position samples; the session runs the
//! accuracy race over them, optionally files an assistance request, looks up
//! nearby garages and then serves facet and selection changes locally.

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::{FutureExt, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::acquisition::{acquire_location, Fix, FixQuality};
use crate::engine::assistance::{file_request, NewAssistanceRequest};
use crate::engine::nearby::search;
use crate::engine::view::{GarageView, ResultSource, VehicleTypeCounts};
use crate::error::LocationError;
use crate::geo::directions_url;
use crate::models::assistance::{AssistanceRequest, RequestType};
use crate::models::garage::{GarageWithDistance, VehicleType};
use crate::models::location::Coordinate;
use crate::positioning::channel::FeedOutcome;
use crate::positioning::{ChannelPositionSource, PositionFeed};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Sample {
        latitude: f64,
        longitude: f64,
        #[serde(default)]
        accuracy: Option<f64>,
    },
    PositionError {
        code: u16,
    },
    Filter {
        #[serde(default)]
        vehicle_type: Option<String>,
    },
    Select {
        garage_id: String,
    },
    ClearSelection,
    /// Starts a fresh acquisition once the previous one has finished.
    Relocate,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Located {
        coordinate: Coordinate,
        quality: FixQuality,
        samples: usize,
    },
    LocationFailed {
        error: LocationError,
        message: String,
    },
    AssistanceRequested {
        request: AssistanceRequest,
    },
    Garages {
        source: ResultSource,
        filter: Option<VehicleType>,
        counts: VehicleTypeCounts,
        garages: Vec<GarageWithDistance>,
    },
    Selection {
        garage: Option<GarageWithDistance>,
        directions_url: Option<String>,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct SessionParams {
    pub user_id: Option<String>,
    pub problem_id: Option<String>,
    pub vehicle_type: Option<VehicleType>,
    pub request_type: Option<RequestType>,
    pub radius_km: f64,
}

pub struct FindSession {
    state: Arc<AppState>,
    params: SessionParams,
    view: GarageView,
    origin: Option<Coordinate>,
    filed: bool,
}

/// One acquisition attempt: the feed the client's samples go into and the
/// pending fix.
struct Locating {
    feed: PositionFeed,
    fix: BoxFuture<'static, Result<Fix, LocationError>>,
    running: bool,
}

impl FindSession {
    pub fn new(state: Arc<AppState>, params: SessionParams) -> Self {
        let view = GarageView::new(params.vehicle_type);
        Self {
            state,
            params,
            view,
            origin: None,
            filed: false,
        }
    }

    fn locate(&self) -> Locating {
        let (source, feed) = ChannelPositionSource::new(self.state.settings.session_sample_buffer);
        let config = self.state.settings.locate.clone();
        let fix = async move { acquire_location(&source, &config).await }.boxed();
        Locating {
            feed,
            fix,
            running: true,
        }
    }

    /// Drives the session until the client stops sending or stops listening.
    pub async fn run<I>(mut self, mut incoming: I, outgoing: mpsc::Sender<ServerMessage>)
    where
        I: Stream<Item = ClientMessage> + Unpin,
    {
        let mut locating = self.locate();

        info!(radius_km = self.params.radius_km, "find session started");

        loop {
            let replies = tokio::select! {
                outcome = &mut locating.fix, if locating.running => {
                    locating.running = false;
                    self.on_acquired(outcome).await
                }
                message = incoming.next() => match message {
                    Some(message) => self.on_message(message, &mut locating),
                    None => break,
                },
            };

            if !deliver(&outgoing, replies).await {
                break;
            }
        }

        info!(located = self.origin.is_some(), "find session closed");
    }

    async fn on_acquired(&mut self, outcome: Result<Fix, LocationError>) -> Vec<ServerMessage> {
        let fix = match outcome {
            Ok(fix) => fix,
            Err(err) => {
                self.record_acquisition(err.as_str());
                return vec![ServerMessage::LocationFailed {
                    error: err,
                    message: failure_hint(err).to_string(),
                }];
            }
        };

        self.record_acquisition(fix.quality.as_str());
        self.origin = Some(fix.coordinate);

        let mut replies = vec![ServerMessage::Located {
            coordinate: fix.coordinate,
            quality: fix.quality,
            samples: fix.samples,
        }];

        if let Some(reply) = self.file_assistance(fix.coordinate) {
            replies.push(reply);
        }

        let ticket = self.view.begin_query();
        match search(&self.state, &fix.coordinate.point(), None, self.params.radius_km).await {
            Ok(nearby) => {
                self.view.load(ticket, nearby.garages, nearby.source);
                replies.push(self.garages_message());
            }
            Err(err) => {
                warn!(error = %err, "nearby garage lookup failed");
                replies.push(ServerMessage::Error {
                    message: err.to_string(),
                });
            }
        }

        replies
    }

    fn file_assistance(&mut self, location: Coordinate) -> Option<ServerMessage> {
        if self.filed {
            return None;
        }
        let user_id = self.params.user_id.clone()?;
        let request_type = self.params.request_type?;

        let draft = NewAssistanceRequest {
            user_id,
            problem_id: self.params.problem_id.clone(),
            vehicle_type: self.params.vehicle_type,
            request_type,
            location,
            notes: String::new(),
        };

        Some(match file_request(&self.state, draft) {
            Ok(request) => {
                self.filed = true;
                ServerMessage::AssistanceRequested { request }
            }
            Err(err) => ServerMessage::Error {
                message: err.to_string(),
            },
        })
    }

    fn on_message(
        &mut self,
        message: ClientMessage,
        locating: &mut Locating,
    ) -> Vec<ServerMessage> {
        match message {
            ClientMessage::Sample {
                latitude,
                longitude,
                accuracy,
            } => {
                let sample = Coordinate::new(latitude, longitude, accuracy);
                if !sample.is_valid() {
                    return vec![error_message("sample is not a valid coordinate")];
                }
                if locating.running {
                    relay(&locating.feed, Ok(sample));
                } else {
                    debug!("ignoring sample after acquisition finished");
                }
                Vec::new()
            }
            ClientMessage::PositionError { code } => match LocationError::from_code(code) {
                Some(err) => {
                    if locating.running {
                        relay(&locating.feed, Err(err));
                    }
                    Vec::new()
                }
                None => vec![error_message(&format!("unknown position error code {code}"))],
            },
            ClientMessage::Filter { vehicle_type } => {
                match VehicleType::parse_filter(vehicle_type.as_deref()) {
                    Ok(filter) => {
                        self.view.set_filter(filter);
                        vec![self.garages_message()]
                    }
                    Err(err) => vec![error_message(&err)],
                }
            }
            ClientMessage::Select { garage_id } => {
                if self.view.select(&garage_id) {
                    vec![self.selection_message()]
                } else {
                    vec![error_message(&format!(
                        "garage {garage_id} is not in the current view"
                    ))]
                }
            }
            ClientMessage::ClearSelection => {
                self.view.clear_selection();
                vec![self.selection_message()]
            }
            ClientMessage::Relocate => {
                if locating.running {
                    return vec![error_message("location is still being acquired")];
                }
                *locating = self.locate();
                debug!("relocating");
                Vec::new()
            }
        }
    }

    fn garages_message(&self) -> ServerMessage {
        ServerMessage::Garages {
            source: self.view.source(),
            filter: self.view.filter(),
            counts: self.view.counts(),
            garages: self.view.visible().into_iter().cloned().collect(),
        }
    }

    fn selection_message(&self) -> ServerMessage {
        let garage = self.view.selected().cloned();
        let directions = match (&garage, &self.origin) {
            (Some(selected), Some(origin)) => {
                Some(directions_url(&origin.point(), &selected.garage.location))
            }
            _ => None,
        };
        ServerMessage::Selection {
            garage,
            directions_url: directions,
        }
    }

    fn record_acquisition(&self, outcome: &str) {
        self.state
            .metrics
            .location_acquisitions_total
            .with_label_values(&[outcome])
            .inc();
    }
}

fn relay(feed: &PositionFeed, event: Result<Coordinate, LocationError>) {
    match feed.push(event) {
        FeedOutcome::Delivered => {}
        FeedOutcome::Dropped => warn!("position buffer full; sample dropped"),
        FeedOutcome::Closed => debug!("position subscription already closed"),
    }
}

fn failure_hint(err: LocationError) -> &'static str {
    match err {
        LocationError::PermissionDenied => {
            "location permission denied; enable location access or enter an address"
        }
        LocationError::PositionUnavailable => "position unavailable; check your signal and retry",
        LocationError::Timeout => "timed out waiting for GPS; please try again",
    }
}

fn error_message(message: &str) -> ServerMessage {
    ServerMessage::Error {
        message: message.to_string(),
    }
}

async fn deliver(outgoing: &mpsc::Sender<ServerMessage>, replies: Vec<ServerMessage>) -> bool {
    for reply in replies {
        if outgoing.send(reply).await.is_err() {
            return false;
        }
    }
    true
}
