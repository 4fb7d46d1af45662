//! Wayfinder - location exploration engine
//!
//! The core of a map client: it issues, supersedes and aggregates
//! asynchronous queries against a mapping provider, and turns drag
//! gestures into panel detents. Rendering and platform services stay
//! outside, behind [`provider::GeoProvider`] and
//! [`location::LocationSource`].
//!
//! # Layers
//!
//! ```text
//! Session ──► DebouncedCompleter ─┐
//!         ──► RouteAggregator ────┼──► GeoQueryClient ──► GeoProvider
//!         ──► SequentialEstimator ┘
//!         ──► PanelStateMachine
//! ```

pub mod completer;
pub mod config;
pub mod coord;
pub mod estimator;
pub mod location;
pub mod logging;
pub mod panel;
pub mod provider;
pub mod query;
pub mod routing;
pub mod session;

pub use coord::{Coordinate, Region, Span};
pub use panel::{PanelConfig, PanelState, PanelStateMachine};
pub use provider::{GeoProvider, PlaceCandidate, Placemark};
pub use query::{GeoQueryClient, QueryError};
pub use routing::{RouteLeg, TransportMode, Trip};
pub use session::{Session, SessionConfig, SessionError, SessionSnapshot};
