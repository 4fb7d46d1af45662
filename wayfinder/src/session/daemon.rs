//! The session's serialized owner task.
//!
//! All state mutation happens here. Provider calls run as spawned tasks and
//! report back through channels; their results are checked against the
//! per-kind [`QuerySlot`] and published only if still current.
//!
//! ```text
//!   Session ──SessionCommand──►┌──────────────────┐──send_modify──► watch
//!                              │  SessionDaemon   │
//!   search tasks ─Completion──►│  (select! loop)  │
//!   query tasks ───Outcome────►└──────────────────┘
//! ```

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::SessionConfig;
use super::state::{Highlight, MapStyle, SessionSnapshot};
use crate::completer::{Completion, DebouncedCompleter};
use crate::coord::{Coordinate, Region};
use crate::estimator::{SequentialEstimator, TravelEstimate};
use crate::location::{LocationError, LocationSource};
use crate::panel::PanelStateMachine;
use crate::provider::{MapItem, PlaceCandidate, Placemark};
use crate::query::{GeoQueryClient, HandleAllocator, QueryError, QueryHandle, QueryKind, QuerySlot};
use crate::routing::{RouteAggregator, TransportMode, Trip};

/// Inbound requests from the view layer.
#[derive(Debug)]
pub(crate) enum SessionCommand {
    TextChanged(String),
    SearchSelected(PlaceCandidate),
    ComputeTrip {
        source: Coordinate,
        waypoints: Vec<Coordinate>,
        destination: Coordinate,
        mode: TransportMode,
    },
    EstimateTravel {
        address: String,
        reply: oneshot::Sender<String>,
    },
    DragChanged(f64),
    DragEnded(f64),
    SearchFocusChanged(bool),
    SearchCancelled,
    Identify(Coordinate),
    Nearby(Vec<String>),
    SetMapStyle(MapStyle),
    RegionChanged(Region),
    /// Replies once every earlier command has been handled.
    Barrier(oneshot::Sender<()>),
}

/// Finished background work.
#[derive(Debug)]
pub(crate) enum Outcome {
    Selection {
        handle: QueryHandle,
        result: Result<Vec<MapItem>, QueryError>,
    },
    Trip {
        handle: QueryHandle,
        result: Result<Trip, QueryError>,
    },
    Estimate {
        handle: QueryHandle,
        estimate: TravelEstimate,
        reply: oneshot::Sender<String>,
    },
    Identify {
        handle: QueryHandle,
        result: Result<Placemark, QueryError>,
    },
    Nearby {
        handle: QueryHandle,
        result: Result<Vec<MapItem>, QueryError>,
    },
    Location(Result<Coordinate, LocationError>),
}

pub(crate) struct SessionDaemon {
    config: SessionConfig,
    client: GeoQueryClient,
    aggregator: RouteAggregator,
    estimator: SequentialEstimator,
    completer: DebouncedCompleter,
    panel: PanelStateMachine,
    handles: Arc<HandleAllocator>,
    selection: QuerySlot,
    trip: QuerySlot,
    estimate: QuerySlot,
    identify: QuerySlot,
    nearby: QuerySlot,
    location_pending: bool,
    /// Set once the user has moved the map; a late fix then leaves the
    /// region alone.
    region_moved: bool,
    state_tx: watch::Sender<SessionSnapshot>,
    outcome_tx: mpsc::UnboundedSender<Outcome>,
}

/// Receivers the daemon loop drains.
pub(crate) struct DaemonInbox {
    pub commands: mpsc::Receiver<SessionCommand>,
    pub completions: mpsc::UnboundedReceiver<Completion>,
    pub outcomes: mpsc::UnboundedReceiver<Outcome>,
}

impl SessionDaemon {
    pub(crate) fn new(
        config: SessionConfig,
        client: GeoQueryClient,
        panel: PanelStateMachine,
        state_tx: watch::Sender<SessionSnapshot>,
        commands: mpsc::Receiver<SessionCommand>,
    ) -> (Self, DaemonInbox) {
        let handles = Arc::new(HandleAllocator::new());
        let (completion_tx, completions) = mpsc::unbounded_channel();
        let (outcome_tx, outcomes) = mpsc::unbounded_channel();

        let daemon = Self {
            aggregator: RouteAggregator::new(client.clone()),
            estimator: SequentialEstimator::new(client.clone()),
            completer: DebouncedCompleter::new(client.clone(), handles.clone(), completion_tx),
            client,
            config,
            panel,
            handles,
            selection: QuerySlot::new(QueryKind::Selection),
            trip: QuerySlot::new(QueryKind::Trip),
            estimate: QuerySlot::new(QueryKind::Estimate),
            identify: QuerySlot::new(QueryKind::Identify),
            nearby: QuerySlot::new(QueryKind::Nearby),
            location_pending: false,
            region_moved: false,
            state_tx,
            outcome_tx,
        };
        let inbox = DaemonInbox {
            commands,
            completions,
            outcomes,
        };
        (daemon, inbox)
    }

    /// Run until `shutdown` fires or every [`Session`](super::Session)
    /// handle is gone.
    pub(crate) async fn run(
        mut self,
        location: Arc<dyn LocationSource>,
        mut inbox: DaemonInbox,
        shutdown: CancellationToken,
    ) {
        info!(provider = self.client.provider_name(), "Session started");
        self.request_location(location);

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Session shutting down");
                    break;
                }

                Some(outcome) = inbox.outcomes.recv() => {
                    self.handle_outcome(outcome);
                }

                Some(completion) = inbox.completions.recv() => {
                    self.handle_completion(completion);
                }

                command = inbox.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => {
                        debug!("All session handles dropped");
                        break;
                    }
                },
            }
        }

        info!("Session stopped");
    }

    fn pending_queries(&self) -> usize {
        [&self.selection, &self.trip, &self.estimate, &self.identify, &self.nearby]
            .iter()
            .filter(|slot| slot.current().is_some())
            .count()
            + usize::from(self.completer.is_pending())
            + usize::from(self.location_pending)
    }

    /// Apply `update` to the published snapshot and refresh derived fields.
    fn publish(&self, update: impl FnOnce(&mut SessionSnapshot)) {
        let pending = self.pending_queries();
        let panel = self.panel.state();
        let drag_offset = self.panel.drag_offset();
        let panel_offset = self.panel.rendered_offset();
        self.state_tx.send_modify(|snapshot| {
            update(snapshot);
            snapshot.panel = panel;
            snapshot.drag_offset = drag_offset;
            snapshot.panel_offset = panel_offset;
            snapshot.pending_queries = pending;
        });
    }

    fn current_center(&self) -> Coordinate {
        self.state_tx.borrow().region.center()
    }

    fn spawn_query<F>(&self, work: F)
    where
        F: Future<Output = Outcome> + Send + 'static,
    {
        let outcome_tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            // Closed channel means the session stopped; drop the result.
            let _ = outcome_tx.send(work.await);
        });
    }

    fn request_location(&mut self, location: Arc<dyn LocationSource>) {
        self.location_pending = true;
        let timeout = self.config.location_timeout;
        self.spawn_query(async move {
            let result = tokio::time::timeout(timeout, location.current_location())
                .await
                .unwrap_or_else(|_| {
                    Err(LocationError::Unavailable(format!(
                        "timed out after {:?}",
                        timeout
                    )))
                });
            Outcome::Location(result)
        });
        self.publish(|_| {});
    }

    fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::TextChanged(text) => {
                let published = self.completer.text_changed(&text);
                self.publish(|s| {
                    s.search_text = text;
                    if let Some(candidates) = published {
                        s.candidates = candidates;
                    }
                });
            }
            SessionCommand::SearchSelected(candidate) => self.search_selected(candidate),
            SessionCommand::ComputeTrip {
                source,
                waypoints,
                destination,
                mode,
            } => self.compute_trip(source, waypoints, destination, mode),
            SessionCommand::EstimateTravel { address, reply } => {
                self.estimate_travel(address, reply)
            }
            SessionCommand::DragChanged(delta) => {
                self.panel.drag_changed(delta);
                self.publish(|_| {});
            }
            SessionCommand::DragEnded(delta) => {
                self.panel.drag_ended(delta);
                self.publish(|_| {});
            }
            SessionCommand::SearchFocusChanged(focused) => {
                if focused {
                    self.panel.focus_search();
                }
                self.publish(|_| {});
            }
            SessionCommand::SearchCancelled => {
                self.completer.cancel();
                self.panel.cancel();
                self.publish(|s| {
                    s.search_text.clear();
                    s.candidates.clear();
                });
            }
            SessionCommand::Identify(coordinate) => {
                let (handle, _) = self.identify.issue(&self.handles);
                let client = self.client.clone();
                self.spawn_query(async move {
                    let result = client.reverse_geocode(coordinate).await;
                    Outcome::Identify { handle, result }
                });
                self.publish(|_| {});
            }
            SessionCommand::Nearby(categories) => {
                let (handle, _) = self.nearby.issue(&self.handles);
                let client = self.client.clone();
                let center = self.current_center();
                let radius_m = self.config.nearby_radius_m;
                self.spawn_query(async move {
                    let result = client.nearby(center, radius_m, &categories).await;
                    Outcome::Nearby { handle, result }
                });
                self.publish(|_| {});
            }
            SessionCommand::SetMapStyle(style) => {
                debug!(style = %style, "Map style changed");
                self.publish(|s| s.map_style = style);
            }
            SessionCommand::RegionChanged(region) => {
                self.region_moved = true;
                self.publish(|s| s.region = region);
            }
            SessionCommand::Barrier(reply) => {
                let _ = reply.send(());
            }
        }
    }

    fn search_selected(&mut self, candidate: PlaceCandidate) {
        let (handle, _) = self.selection.issue(&self.handles);
        debug!(query = %handle, title = %candidate.title, "Candidate selected");
        let client = self.client.clone();
        self.spawn_query(async move {
            let result = client.search_places(candidate.reference.as_str()).await;
            Outcome::Selection { handle, result }
        });
        self.publish(|_| {});
    }

    fn compute_trip(
        &mut self,
        source: Coordinate,
        waypoints: Vec<Coordinate>,
        destination: Coordinate,
        mode: TransportMode,
    ) {
        let (handle, _) = self.trip.issue(&self.handles);
        let aggregator = self.aggregator.clone();
        self.spawn_query(async move {
            let result = aggregator
                .compute_trip(source, &waypoints, destination, mode)
                .await;
            Outcome::Trip { handle, result }
        });
        self.publish(|s| s.trip = None);
    }

    fn estimate_travel(&mut self, address: String, reply: oneshot::Sender<String>) {
        let (handle, _) = self.estimate.issue(&self.handles);
        let estimator = self.estimator.clone();
        let from = self.current_center();
        let mode = self.config.default_mode;
        self.spawn_query(async move {
            let estimate = estimator.estimate(&address, from, mode).await;
            Outcome::Estimate {
                handle,
                estimate,
                reply,
            }
        });
        self.publish(|_| {});
    }

    fn handle_completion(&mut self, completion: Completion) {
        let error = completion.result.as_ref().err().cloned();
        if let Some(candidates) = self.completer.accept(completion) {
            self.publish(|s| {
                s.candidates = candidates;
                if error.is_some() {
                    s.last_error = error;
                }
            });
        }
    }

    fn handle_outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Selection { handle, result } => {
                if self.selection.complete(handle).is_err() {
                    return;
                }
                match result {
                    Ok(items) => {
                        let highlights: Vec<Highlight> = items
                            .iter()
                            .map(|item| Highlight {
                                center: item.coordinate,
                                radius_m: self.config.highlight_radius_m,
                            })
                            .collect();
                        let span = self.config.highlight_span_m;
                        let highlighted = items.last().and_then(|item| {
                            Region::from_meters(item.coordinate, span, span)
                                .map_err(|e| warn!(error = %e, "Cannot frame selected place"))
                                .ok()
                        });
                        info!(query = %handle, items = items.len(), "Selection resolved");
                        self.publish(|s| {
                            s.highlights = highlights;
                            s.highlighted_region = highlighted;
                            s.map_items = items;
                        });
                    }
                    Err(e) => {
                        warn!(query = %handle, error = %e, "Selection failed");
                        self.publish(|s| {
                            s.highlights.clear();
                            s.highlighted_region = None;
                            s.map_items.clear();
                            s.last_error = Some(e);
                        });
                    }
                }
            }
            Outcome::Trip { handle, result } => {
                if self.trip.complete(handle).is_err() {
                    return;
                }
                match result {
                    Ok(trip) => {
                        info!(query = %handle, legs = trip.legs().len(), "Trip ready");
                        self.publish(|s| s.trip = Some(trip));
                    }
                    Err(e) => {
                        warn!(query = %handle, error = %e, "Trip failed");
                        self.publish(|s| {
                            s.trip = None;
                            s.last_error = Some(e);
                        });
                    }
                }
            }
            Outcome::Estimate {
                handle,
                estimate,
                reply,
            } => {
                let text = estimate.to_string();
                // The caller always gets its own answer, even when superseded
                let _ = reply.send(text.clone());
                if self.estimate.complete(handle).is_err() {
                    return;
                }
                let error = match estimate {
                    TravelEstimate::Available(_) => None,
                    TravelEstimate::NotAvailable(e) => Some(e),
                };
                self.publish(|s| {
                    s.last_estimate = Some(text);
                    if error.is_some() {
                        s.last_error = error;
                    }
                });
            }
            Outcome::Identify { handle, result } => {
                if self.identify.complete(handle).is_err() {
                    return;
                }
                match result {
                    Ok(placemark) => self.publish(|s| s.placemark = Some(placemark)),
                    Err(e) => {
                        debug!(query = %handle, error = %e, "Identify found nothing");
                        self.publish(|s| {
                            s.placemark = None;
                            s.last_error = Some(e);
                        });
                    }
                }
            }
            Outcome::Nearby { handle, result } => {
                if self.nearby.complete(handle).is_err() {
                    return;
                }
                match result {
                    Ok(items) => self.publish(|s| s.nearby = items),
                    Err(e) => {
                        warn!(query = %handle, error = %e, "Nearby search failed");
                        self.publish(|s| {
                            s.nearby.clear();
                            s.last_error = Some(e);
                        });
                    }
                }
            }
            Outcome::Location(result) => {
                self.location_pending = false;
                match result {
                    Ok(coordinate) if self.region_moved => {
                        debug!(location = %coordinate, "Device location received after user moved the map");
                        self.publish(|s| s.device_location = Some(coordinate));
                    }
                    Ok(coordinate) => {
                        let span = self.config.location_span_m;
                        match Region::from_meters(coordinate, span, span) {
                            Ok(region) => {
                                info!(location = %coordinate, "Device location received");
                                self.publish(|s| {
                                    s.region = region;
                                    s.device_location = Some(coordinate);
                                });
                            }
                            Err(e) => {
                                warn!(location = %coordinate, error = %e, "Unusable device location");
                                self.publish(|_| {});
                            }
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Device location unavailable, keeping default region");
                        self.publish(|_| {});
                    }
                }
            }
        }
    }
}
