//! Provider trait, place types and errors.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;

use crate::coord::Coordinate;
use crate::routing::{RouteLeg, TransportMode};

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors reported by a mapping provider.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// No place matched the query.
    #[error("No matching place found")]
    NotFound,

    /// The provider has no path between the points for the requested mode.
    #[error("No route available")]
    NoRoute,

    /// The provider could not be reached or refused the request.
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    /// The provider answered with something we could not interpret.
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    /// HTTP transport failure.
    #[error("HTTP error: {0}")]
    HttpError(String),
}

/// Opaque provider-specific reference used to resolve a candidate later.
///
/// References are only meaningful to the provider that produced them and may
/// be invalidated once a newer completion query supersedes the one that
/// returned them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlaceRef(String);

impl PlaceRef {
    /// Wrap a provider reference.
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// The raw reference string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A lightweight, unresolved search suggestion.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceCandidate {
    /// Primary label (e.g. "Central Park").
    pub title: String,
    /// Secondary label, usually the locality (e.g. "New York, NY").
    pub subtitle: String,
    /// Reference used to resolve the full placemark.
    pub reference: PlaceRef,
}

impl PlaceCandidate {
    /// Create a candidate.
    pub fn new(
        title: impl Into<String>,
        subtitle: impl Into<String>,
        reference: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            subtitle: subtitle.into(),
            reference: PlaceRef::new(reference),
        }
    }
}

/// A fully resolved place.
#[derive(Debug, Clone, PartialEq)]
pub struct Placemark {
    /// Display name.
    pub name: String,
    /// Resolved position.
    pub coordinate: Coordinate,
    /// Formatted postal address, when the provider has one.
    pub address: Option<String>,
}

/// A resolved place returned by local or nearby search.
#[derive(Debug, Clone, PartialEq)]
pub struct MapItem {
    /// Display name.
    pub name: String,
    /// Resolved position.
    pub coordinate: Coordinate,
    /// Point-of-interest category, if known (e.g. "cafe").
    pub category: Option<String>,
    /// Formatted postal address, if known.
    pub address: Option<String>,
}

impl From<MapItem> for Placemark {
    fn from(item: MapItem) -> Self {
        Self {
            name: item.name,
            coordinate: item.coordinate,
            address: item.address,
        }
    }
}

/// Asynchronous capability boundary to an external mapping provider.
///
/// Every method resolves exactly once with either a value or an error.
/// Implementations hold no session state; they are safe to share behind
/// `Arc<dyn GeoProvider>` across tasks.
///
/// # Dyn Compatibility
///
/// Methods return [`BoxFuture`] so the trait can be used as a trait object.
pub trait GeoProvider: Send + Sync {
    /// Human-readable provider name for logs.
    fn name(&self) -> &str;

    /// Free-text autocomplete. Ranked candidates, best first.
    fn search<'a>(&'a self, text: &'a str)
        -> BoxFuture<'a, Result<Vec<PlaceCandidate>, ProviderError>>;

    /// Full local search returning resolved items.
    fn search_places<'a>(&'a self, text: &'a str)
        -> BoxFuture<'a, Result<Vec<MapItem>, ProviderError>>;

    /// Address to single best-match placemark.
    ///
    /// Returns [`ProviderError::NotFound`] when nothing matches.
    fn geocode<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Placemark, ProviderError>>;

    /// Coordinate to the nearest known placemark.
    fn reverse_geocode(&self, coordinate: Coordinate)
        -> BoxFuture<'_, Result<Placemark, ProviderError>>;

    /// Single-leg route. The returned leg's endpoints are `from` and `to`.
    ///
    /// Returns [`ProviderError::NoRoute`] when no path exists for `mode`.
    fn route(
        &self,
        from: Coordinate,
        to: Coordinate,
        mode: TransportMode,
    ) -> BoxFuture<'_, Result<RouteLeg, ProviderError>>;

    /// Travel time only; cheaper than a full route.
    fn eta(
        &self,
        from: Coordinate,
        to: Coordinate,
        mode: TransportMode,
    ) -> BoxFuture<'_, Result<Duration, ProviderError>>;

    /// Points of interest within `radius_m` of `center`.
    ///
    /// An empty `categories` slice means any category.
    fn nearby<'a>(
        &'a self,
        center: Coordinate,
        radius_m: f64,
        categories: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<MapItem>, ProviderError>>;
}
