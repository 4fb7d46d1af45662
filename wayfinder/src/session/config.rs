//! Session configuration.

use std::time::Duration;

use crate::config::{ConfigFile, DEFAULT_INITIAL_SPAN_DEG, DEFAULT_NEARBY_RADIUS_M};
use crate::coord::{CoordError, Coordinate, Region, Span, NEW_YORK_CITY};
use crate::panel::PanelConfig;
use crate::query::QueryConfig;
use crate::routing::TransportMode;

/// Default command channel capacity.
pub const DEFAULT_COMMAND_CAPACITY: usize = 64;

/// Side of the square region shown around a device fix, in meters.
pub const DEFAULT_LOCATION_SPAN_M: f64 = 1_000.0;

/// How long to wait for the start-up device fix.
pub const DEFAULT_LOCATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Side of the square region shown around a selected place, in meters.
pub const DEFAULT_HIGHLIGHT_SPAN_M: f64 = 100.0;

/// Radius of a highlight marker, in meters.
pub const DEFAULT_HIGHLIGHT_RADIUS_M: f64 = 500.0;

/// Configuration for a [`Session`](super::Session).
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Map focus before any device fix.
    pub initial_center: Coordinate,
    pub initial_span: Span,
    pub location_span_m: f64,
    /// A fix slower than this is treated as unavailable.
    pub location_timeout: Duration,
    pub highlight_span_m: f64,
    pub highlight_radius_m: f64,
    pub nearby_radius_m: f64,
    /// Mode used for travel estimates.
    pub default_mode: TransportMode,
    /// Bound on queued inbound commands.
    pub command_capacity: usize,
    pub query: QueryConfig,
    pub panel: PanelConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_center: NEW_YORK_CITY,
            initial_span: Span::new(DEFAULT_INITIAL_SPAN_DEG, DEFAULT_INITIAL_SPAN_DEG),
            location_span_m: DEFAULT_LOCATION_SPAN_M,
            location_timeout: DEFAULT_LOCATION_TIMEOUT,
            highlight_span_m: DEFAULT_HIGHLIGHT_SPAN_M,
            highlight_radius_m: DEFAULT_HIGHLIGHT_RADIUS_M,
            nearby_radius_m: DEFAULT_NEARBY_RADIUS_M,
            default_mode: TransportMode::default(),
            command_capacity: DEFAULT_COMMAND_CAPACITY,
            query: QueryConfig::default(),
            panel: PanelConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Build from the user's configuration file.
    pub fn from_config_file(file: &ConfigFile) -> Self {
        Self {
            initial_center: file.session.initial_center(),
            initial_span: Span::new(file.session.initial_span, file.session.initial_span),
            nearby_radius_m: file.session.nearby_radius_m,
            default_mode: file.session.default_mode,
            query: file.query_config(),
            panel: file.panel_config(),
            ..Self::default()
        }
    }

    pub fn with_initial_region(mut self, center: Coordinate, span: Span) -> Self {
        self.initial_center = center;
        self.initial_span = span;
        self
    }

    pub fn with_default_mode(mut self, mode: TransportMode) -> Self {
        self.default_mode = mode;
        self
    }

    pub fn with_query(mut self, query: QueryConfig) -> Self {
        self.query = query;
        self
    }

    pub fn with_panel(mut self, panel: PanelConfig) -> Self {
        self.panel = panel;
        self
    }

    pub fn with_location_timeout(mut self, timeout: Duration) -> Self {
        self.location_timeout = timeout;
        self
    }

    pub fn with_nearby_radius(mut self, radius_m: f64) -> Self {
        self.nearby_radius_m = radius_m;
        self
    }

    /// The starting map region.
    pub fn initial_region(&self) -> Result<Region, CoordError> {
        self.initial_center.validate()?;
        Region::new(self.initial_center, self.initial_span)
    }
}
