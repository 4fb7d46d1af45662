//! The session: single owner of all interaction state.
//!
//! [`Session`] is a cheap front end over a daemon task that serializes every
//! mutation. Inbound methods enqueue a command and return; results of the
//! provider calls they trigger appear later in the published
//! [`SessionSnapshot`]. The one exception is
//! [`estimate_travel`](Session::estimate_travel), which suspends the caller
//! until both of its dependent calls have finished.
//!
//! # Example
//!
//! ```ignore
//! let session = Session::start(
//!     SessionConfig::default(),
//!     Arc::new(FakeProvider::with_gazetteer()),
//!     Arc::new(NoLocation::default()),
//! )?;
//!
//! session.text_changed("coffee").await?;
//! let snapshot = session.settle().await?;
//! for candidate in &snapshot.candidates {
//!     println!("{}", candidate.title);
//! }
//! session.shutdown().await;
//! ```

mod config;
mod daemon;
mod state;

pub use config::{
    SessionConfig, DEFAULT_COMMAND_CAPACITY, DEFAULT_HIGHLIGHT_RADIUS_M, DEFAULT_HIGHLIGHT_SPAN_M,
    DEFAULT_LOCATION_SPAN_M, DEFAULT_LOCATION_TIMEOUT,
};
pub use state::{Highlight, MapStyle, SessionSnapshot};

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::coord::{CoordError, Coordinate, Region};
use crate::location::LocationSource;
use crate::panel::{PanelConfigError, PanelStateMachine};
use crate::provider::{GeoProvider, PlaceCandidate};
use crate::query::GeoQueryClient;
use crate::routing::TransportMode;
use daemon::{SessionCommand, SessionDaemon};

/// Errors from the session front end.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The daemon has stopped; no further commands are accepted.
    #[error("Session has stopped")]
    Closed,

    #[error("Invalid session configuration: {0}")]
    InvalidConfig(String),
}

impl From<PanelConfigError> for SessionError {
    fn from(e: PanelConfigError) -> Self {
        SessionError::InvalidConfig(e.to_string())
    }
}

impl From<CoordError> for SessionError {
    fn from(e: CoordError) -> Self {
        SessionError::InvalidConfig(e.to_string())
    }
}

/// Handle to a running session.
///
/// Dropping the handle stops the daemon.
pub struct Session {
    config: SessionConfig,
    command_tx: mpsc::Sender<SessionCommand>,
    state_rx: watch::Receiver<SessionSnapshot>,
    shutdown: CancellationToken,
    daemon: Option<JoinHandle<()>>,
}

impl Session {
    /// Validate `config` and spawn the session daemon.
    ///
    /// Must be called from within a tokio runtime. The device location is
    /// requested once, immediately.
    pub fn start(
        config: SessionConfig,
        provider: Arc<dyn GeoProvider>,
        location: Arc<dyn LocationSource>,
    ) -> Result<Self, SessionError> {
        let region = config.initial_region()?;
        let panel = PanelStateMachine::new(config.panel.clone())?;

        let snapshot = SessionSnapshot::new(region, panel.state(), panel.rendered_offset());
        let (state_tx, state_rx) = watch::channel(snapshot);
        let (command_tx, command_rx) = mpsc::channel(config.command_capacity.max(1));

        let client = GeoQueryClient::new(provider, config.query.clone());
        let (daemon, inbox) =
            SessionDaemon::new(config.clone(), client, panel, state_tx, command_rx);

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(daemon.run(location, inbox, shutdown.clone()));

        Ok(Self {
            config,
            command_tx,
            state_rx,
            shutdown,
            daemon: Some(handle),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    async fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| SessionError::Closed)
    }

    /// The search text changed.
    pub async fn text_changed(&self, text: &str) -> Result<(), SessionError> {
        self.send(SessionCommand::TextChanged(text.to_string())).await
    }

    /// A candidate was picked: resolve it and highlight the results.
    pub async fn search_selected(&self, candidate: PlaceCandidate) -> Result<(), SessionError> {
        self.send(SessionCommand::SearchSelected(candidate)).await
    }

    /// Route `source → waypoints… → destination`. Replaces any current trip.
    pub async fn compute_trip(
        &self,
        source: Coordinate,
        waypoints: Vec<Coordinate>,
        destination: Coordinate,
        mode: TransportMode,
    ) -> Result<(), SessionError> {
        self.send(SessionCommand::ComputeTrip {
            source,
            waypoints,
            destination,
            mode,
        })
        .await
    }

    /// Travel time from the current region center to `address`, using the
    /// configured default mode.
    ///
    /// Suspends until the geocode and, if it succeeded, the ETA have both
    /// finished. Returns an abbreviated duration or `"Not available"`.
    pub async fn estimate_travel(&self, address: &str) -> Result<String, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::EstimateTravel {
            address: address.to_string(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Live drag translation in points; never changes the panel state.
    pub async fn drag_changed(&self, delta: f64) -> Result<(), SessionError> {
        self.send(SessionCommand::DragChanged(delta)).await
    }

    /// End of a drag with net translation `delta` in points.
    pub async fn drag_ended(&self, delta: f64) -> Result<(), SessionError> {
        self.send(SessionCommand::DragEnded(delta)).await
    }

    pub async fn search_focus_changed(&self, focused: bool) -> Result<(), SessionError> {
        self.send(SessionCommand::SearchFocusChanged(focused)).await
    }

    /// Collapse the panel and clear the search text and candidates.
    pub async fn search_cancelled(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::SearchCancelled).await
    }

    /// Reverse geocode a tapped coordinate.
    pub async fn identify(&self, coordinate: Coordinate) -> Result<(), SessionError> {
        self.send(SessionCommand::Identify(coordinate)).await
    }

    /// Points of interest around the current region center.
    pub async fn nearby(&self, categories: Vec<String>) -> Result<(), SessionError> {
        self.send(SessionCommand::Nearby(categories)).await
    }

    pub async fn set_map_style(&self, style: MapStyle) -> Result<(), SessionError> {
        self.send(SessionCommand::SetMapStyle(style)).await
    }

    /// The user panned or zoomed the map.
    pub async fn region_changed(&self, region: Region) -> Result<(), SessionError> {
        self.send(SessionCommand::RegionChanged(region)).await
    }

    /// Current published state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state_rx.borrow().clone()
    }

    /// A receiver notified on every publish.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state_rx.clone()
    }

    /// Wait until the published state satisfies `predicate`.
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&SessionSnapshot) -> bool,
    ) -> Result<SessionSnapshot, SessionError> {
        let mut rx = self.state_rx.clone();
        let snapshot = rx
            .wait_for(predicate)
            .await
            .map_err(|_| SessionError::Closed)?;
        Ok(snapshot.clone())
    }

    /// Wait until every command sent so far has been handled and every
    /// query it started has been published or discarded.
    pub async fn settle(&self) -> Result<SessionSnapshot, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Barrier(reply)).await?;
        rx.await.map_err(|_| SessionError::Closed)?;
        self.wait_for(SessionSnapshot::is_idle).await
    }

    /// Stop the daemon and wait for it to exit.
    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.daemon.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::{Span, NEW_YORK_CITY};
    use crate::location::{FixedLocation, NoLocation};
    use crate::panel::{PanelConfig, PanelState};
    use crate::provider::{FakeOp, FakeProvider};
    use crate::query::QueryError;

    fn start(fake: FakeProvider) -> (Session, Arc<FakeProvider>) {
        let fake = Arc::new(fake);
        let session = Session::start(
            SessionConfig::default(),
            fake.clone(),
            Arc::new(NoLocation::default()),
        )
        .unwrap();
        (session, fake)
    }

    #[tokio::test]
    async fn test_initial_snapshot() {
        let (session, _) = start(FakeProvider::new());
        let snapshot = session.settle().await.unwrap();

        assert_eq!(snapshot.region.center(), NEW_YORK_CITY);
        assert_eq!(snapshot.region.span(), Span::new(0.1, 0.1));
        assert_eq!(snapshot.panel, PanelState::Low);
        assert_eq!(snapshot.trip, None);
        assert!(snapshot.candidates.is_empty());
        assert_eq!(snapshot.device_location, None);
        assert_eq!(snapshot.pending_queries, 0);
    }

    #[tokio::test]
    async fn test_device_location_recenters_region() {
        let fix = Coordinate::new(42.355, -71.0656);
        let session = Session::start(
            SessionConfig::default(),
            Arc::new(FakeProvider::new()),
            Arc::new(FixedLocation(fix)),
        )
        .unwrap();

        let snapshot = session.settle().await.unwrap();
        assert_eq!(snapshot.device_location, Some(fix));
        assert_eq!(snapshot.region.center(), fix);
        let expected = Region::from_meters(fix, 1000.0, 1000.0).unwrap();
        assert_eq!(snapshot.region, expected);
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let config = SessionConfig::default().with_panel(PanelConfig::default().with_height(-1.0));
        let result = Session::start(
            config,
            Arc::new(FakeProvider::new()),
            Arc::new(NoLocation::default()),
        );
        assert!(matches!(result, Err(SessionError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_estimate_travel_blocks_until_resolved() {
        let (session, fake) = start(FakeProvider::with_gazetteer());

        let text = session.estimate_travel("nowhere").await.unwrap();
        assert_eq!(text, "Not available");
        assert_eq!(fake.calls(FakeOp::Eta), 0);

        let snapshot = session.settle().await.unwrap();
        assert_eq!(snapshot.last_estimate.as_deref(), Some("Not available"));
        assert_eq!(snapshot.last_error, Some(QueryError::NotFound));
    }

    #[tokio::test]
    async fn test_identify_and_map_style() {
        let (session, _) = start(FakeProvider::with_gazetteer());

        session.identify(Coordinate::new(40.7581, -73.9856)).await.unwrap();
        session.set_map_style(MapStyle::Hybrid).await.unwrap();
        let snapshot = session.settle().await.unwrap();

        assert_eq!(snapshot.placemark.map(|p| p.name), Some("Times Square".to_string()));
        assert_eq!(snapshot.map_style, MapStyle::Hybrid);
    }

    #[tokio::test]
    async fn test_shutdown_closes_state_channel() {
        let (session, _) = start(FakeProvider::new());
        let rx = session.subscribe();
        session.shutdown().await;
        assert!(rx.has_changed().is_err());
    }
}
