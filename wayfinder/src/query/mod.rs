//! Uniform asynchronous access to the mapping provider.
//!
//! [`GeoQueryClient`] wraps an `Arc<dyn GeoProvider>` and gives every call
//! the same treatment: a bounded wait (the provider itself promises no
//! latency bound), structured logging, and translation of adapter errors
//! into the [`QueryError`] taxonomy. It holds no per-request state and is
//! cheap to clone into spawned tasks.
//!
//! Supersession bookkeeping ([`QueryHandle`], [`QuerySlot`]) lives here too,
//! since every composite operation builds on it.

mod error;
mod handle;

pub use error::QueryError;
pub use handle::{HandleAllocator, QueryHandle, QueryKind, QuerySlot};

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::coord::Coordinate;
use crate::provider::{GeoProvider, MapItem, PlaceCandidate, Placemark, ProviderError};
use crate::routing::{RouteLeg, TransportMode};

/// Default upper bound on a single provider call.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for [`GeoQueryClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct QueryConfig {
    /// Maximum time to wait for any one provider call.
    pub timeout: Duration,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }
}

impl QueryConfig {
    /// Set the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Timed, logged access to the provider's operations.
#[derive(Clone)]
pub struct GeoQueryClient {
    provider: Arc<dyn GeoProvider>,
    config: QueryConfig,
}

impl std::fmt::Debug for GeoQueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoQueryClient")
            .field("provider", &self.provider.name())
            .field("config", &self.config)
            .finish()
    }
}

impl GeoQueryClient {
    /// Create a client over `provider`.
    pub fn new(provider: Arc<dyn GeoProvider>, config: QueryConfig) -> Self {
        Self { provider, config }
    }

    /// The configured per-call timeout.
    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    /// Name of the underlying provider.
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Autocomplete. Empty (or whitespace-only) text yields an empty list
    /// without contacting the provider.
    pub async fn search(&self, text: &str) -> Result<Vec<PlaceCandidate>, QueryError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        self.call("search", self.provider.search(text)).await
    }

    /// Full local search. Empty text yields an empty list.
    pub async fn search_places(&self, text: &str) -> Result<Vec<MapItem>, QueryError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        self.call("search_places", self.provider.search_places(text))
            .await
    }

    /// Address to best-match placemark.
    pub async fn geocode(&self, text: &str) -> Result<Placemark, QueryError> {
        if text.trim().is_empty() {
            return Err(QueryError::NotFound);
        }
        self.call("geocode", self.provider.geocode(text)).await
    }

    /// Coordinate to nearest placemark.
    pub async fn reverse_geocode(&self, coordinate: Coordinate) -> Result<Placemark, QueryError> {
        self.call("reverse_geocode", self.provider.reverse_geocode(coordinate))
            .await
    }

    /// Single-leg route.
    pub async fn route(
        &self,
        from: Coordinate,
        to: Coordinate,
        mode: TransportMode,
    ) -> Result<RouteLeg, QueryError> {
        self.call("route", self.provider.route(from, to, mode)).await
    }

    /// Travel time between two points.
    pub async fn eta(
        &self,
        from: Coordinate,
        to: Coordinate,
        mode: TransportMode,
    ) -> Result<Duration, QueryError> {
        self.call("eta", self.provider.eta(from, to, mode)).await
    }

    /// Points of interest around `center`.
    pub async fn nearby(
        &self,
        center: Coordinate,
        radius_m: f64,
        categories: &[String],
    ) -> Result<Vec<MapItem>, QueryError> {
        self.call(
            "nearby",
            self.provider.nearby(center, radius_m, categories),
        )
        .await
    }

    async fn call<T, F>(&self, operation: &'static str, request: F) -> Result<T, QueryError>
    where
        F: Future<Output = Result<T, ProviderError>>,
    {
        let start = Instant::now();
        match tokio::time::timeout(self.config.timeout, request).await {
            Ok(Ok(value)) => {
                debug!(
                    provider = self.provider.name(),
                    operation,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Provider call succeeded"
                );
                Ok(value)
            }
            Ok(Err(e)) => {
                debug!(
                    provider = self.provider.name(),
                    operation,
                    error = %e,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Provider call failed"
                );
                Err(e.into())
            }
            Err(_) => {
                warn!(
                    provider = self.provider.name(),
                    operation,
                    timeout_ms = self.config.timeout.as_millis() as u64,
                    "Provider call timed out"
                );
                Err(QueryError::TimedOut(self.config.timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{FakeOp, FakeProvider};

    fn client(fake: &Arc<FakeProvider>) -> GeoQueryClient {
        GeoQueryClient::new(fake.clone(), QueryConfig::default())
    }

    #[tokio::test]
    async fn test_empty_search_skips_provider() {
        let fake = Arc::new(FakeProvider::with_gazetteer());
        let client = client(&fake);

        assert_eq!(client.search("").await, Ok(Vec::new()));
        assert_eq!(client.search("   ").await, Ok(Vec::new()));
        assert_eq!(fake.calls(FakeOp::Search), 0);
    }

    #[tokio::test]
    async fn test_search_passes_through() {
        let fake = Arc::new(FakeProvider::with_gazetteer());
        let client = client(&fake);

        let candidates = client.search("central").await.unwrap();
        assert!(candidates.iter().any(|c| c.title == "Central Park"));
        assert_eq!(fake.calls(FakeOp::Search), 1);
    }

    #[tokio::test]
    async fn test_geocode_not_found_is_mapped() {
        let fake = Arc::new(FakeProvider::with_gazetteer());
        let client = client(&fake);

        assert_eq!(client.geocode("nowhere").await, Err(QueryError::NotFound));
    }

    #[tokio::test]
    async fn test_geocode_empty_text_is_not_found() {
        let fake = Arc::new(FakeProvider::new());
        let client = client(&fake);

        assert_eq!(client.geocode("").await, Err(QueryError::NotFound));
        assert_eq!(fake.calls(FakeOp::Geocode), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_provider_times_out() {
        let fake = Arc::new(FakeProvider::with_gazetteer().with_latency(Duration::from_secs(60)));
        let client = GeoQueryClient::new(
            fake.clone(),
            QueryConfig::default().with_timeout(Duration::from_secs(2)),
        );

        let result = client.geocode("Central Park").await;
        assert_eq!(result, Err(QueryError::TimedOut(Duration::from_secs(2))));
    }

    #[test]
    fn test_query_config_default() {
        let config = QueryConfig::default();
        assert_eq!(config.timeout, DEFAULT_QUERY_TIMEOUT);
    }
}
