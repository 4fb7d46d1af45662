//! Published session state.

use std::fmt;
use std::str::FromStr;

use crate::coord::{Coordinate, Region};
use crate::panel::PanelState;
use crate::provider::{MapItem, PlaceCandidate, Placemark};
use crate::query::QueryError;
use crate::routing::Trip;

/// Base map rendering style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MapStyle {
    #[default]
    Standard,
    Satellite,
    Hybrid,
}

impl fmt::Display for MapStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MapStyle::Standard => "standard",
            MapStyle::Satellite => "satellite",
            MapStyle::Hybrid => "hybrid",
        };
        f.write_str(name)
    }
}

impl FromStr for MapStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(MapStyle::Standard),
            "satellite" => Ok(MapStyle::Satellite),
            "hybrid" => Ok(MapStyle::Hybrid),
            other => Err(format!("unknown map style '{}'", other)),
        }
    }
}

/// A circular marker drawn around a selected place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Highlight {
    pub center: Coordinate,
    pub radius_m: f64,
}

/// Snapshot of everything the view layer renders.
///
/// Written only by the session daemon; readers get clones through a
/// `watch` channel.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    /// Current map viewport.
    pub region: Region,
    /// Extent around the most recently selected place.
    pub highlighted_region: Option<Region>,
    /// Markers for every item of the last selection.
    pub highlights: Vec<Highlight>,
    /// Items resolved by the last selection.
    pub map_items: Vec<MapItem>,
    pub search_text: String,
    pub candidates: Vec<PlaceCandidate>,
    /// Either the complete trip or nothing.
    pub trip: Option<Trip>,
    pub panel: PanelState,
    /// Live drag translation in points. Zero when no gesture is active.
    pub drag_offset: f64,
    /// Where the panel is drawn right now, in points.
    pub panel_offset: f64,
    /// Display string of the most recent travel estimate.
    pub last_estimate: Option<String>,
    /// Result of the last identify request.
    pub placemark: Option<Placemark>,
    /// Points of interest from the last nearby request.
    pub nearby: Vec<MapItem>,
    pub map_style: MapStyle,
    /// Device fix received at start-up.
    pub device_location: Option<Coordinate>,
    /// Most recent query failure, for diagnostics.
    pub last_error: Option<QueryError>,
    /// Queries whose results have not been published yet.
    pub pending_queries: usize,
}

impl SessionSnapshot {
    pub(crate) fn new(region: Region, panel: PanelState, panel_offset: f64) -> Self {
        Self {
            region,
            highlighted_region: None,
            highlights: Vec::new(),
            map_items: Vec::new(),
            search_text: String::new(),
            candidates: Vec::new(),
            trip: None,
            panel,
            drag_offset: 0.0,
            panel_offset,
            last_estimate: None,
            placemark: None,
            nearby: Vec::new(),
            map_style: MapStyle::default(),
            device_location: None,
            last_error: None,
            pending_queries: 0,
        }
    }

    /// The region the map should frame: the highlight if there is one,
    /// otherwise the viewport.
    pub fn focus_region(&self) -> Region {
        self.highlighted_region.unwrap_or(self.region)
    }

    /// No query is awaiting publication.
    pub fn is_idle(&self) -> bool {
        self.pending_queries == 0
    }
}
