//! Mapping provider abstraction.
//!
//! The [`GeoProvider`] trait is the one boundary between the session and the
//! outside world: search, geocoding, routing and travel-time estimation all
//! go through it. Implementations:
//!
//! - [`OsmProvider`]: Nominatim and OSRM over HTTP
//! - [`FakeProvider`]: deterministic, in-memory, with latency and failure
//!   injection for tests and offline use

mod fake;
mod http;
mod osm;
mod types;

pub use fake::{FakeOp, FakePlace, FakeProvider};
pub use http::{AsyncHttpClient, ReqwestClient, DEFAULT_HTTP_TIMEOUT, DEFAULT_USER_AGENT};
pub use osm::{OsmProvider, DEFAULT_ROUTING_URL, DEFAULT_SEARCH_URL};
pub use types::{
    BoxFuture, GeoProvider, MapItem, PlaceCandidate, PlaceRef, Placemark, ProviderError,
};

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;
