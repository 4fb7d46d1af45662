//! Address-to-travel-time estimation.
//!
//! Geocoding must finish before the ETA request can be built, so the two
//! calls run strictly in sequence inside one task. A failed geocode ends the
//! estimate without touching the router.

use std::fmt;
use std::time::Duration;

use tracing::debug;

use crate::coord::Coordinate;
use crate::query::{GeoQueryClient, QueryError};
use crate::routing::TransportMode;

/// Placeholder shown when either step fails.
pub const NOT_AVAILABLE: &str = "Not available";

/// Outcome of a travel estimate.
#[derive(Debug, Clone, PartialEq)]
pub enum TravelEstimate {
    /// Both steps succeeded.
    Available(Duration),
    /// The first failing step's error.
    NotAvailable(QueryError),
}

impl TravelEstimate {
    pub fn duration(&self) -> Option<Duration> {
        match self {
            TravelEstimate::Available(d) => Some(*d),
            TravelEstimate::NotAvailable(_) => None,
        }
    }
}

impl fmt::Display for TravelEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TravelEstimate::Available(d) => f.write_str(&format_duration(*d)),
            TravelEstimate::NotAvailable(_) => f.write_str(NOT_AVAILABLE),
        }
    }
}

/// Abbreviated duration with a single unit: whole hours if at least one
/// hour, otherwise whole minutes.
///
/// ```
/// use std::time::Duration;
/// use wayfinder::estimator::format_duration;
///
/// assert_eq!(format_duration(Duration::from_secs(2 * 3600 + 40 * 60)), "2h");
/// assert_eq!(format_duration(Duration::from_secs(25 * 60 + 59)), "25m");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let hours = secs / 3600;
    if hours > 0 {
        format!("{}h", hours)
    } else {
        format!("{}m", secs / 60)
    }
}

/// Chains `geocode` into `eta`.
#[derive(Debug, Clone)]
pub struct SequentialEstimator {
    client: GeoQueryClient,
}

impl SequentialEstimator {
    pub fn new(client: GeoQueryClient) -> Self {
        Self { client }
    }

    /// Resolve `address`, then time the trip from `from` to it.
    ///
    /// Returns only after both calls have finished, or after the first one
    /// failed.
    pub async fn estimate(
        &self,
        address: &str,
        from: Coordinate,
        mode: TransportMode,
    ) -> TravelEstimate {
        let placemark = match self.client.geocode(address).await {
            Ok(placemark) => placemark,
            Err(e) => {
                debug!(address, error = %e, "Estimate stopped at geocode");
                return TravelEstimate::NotAvailable(e);
            }
        };

        match self.client.eta(from, placemark.coordinate, mode).await {
            Ok(duration) => {
                debug!(
                    address,
                    destination = %placemark.coordinate,
                    mode = %mode,
                    duration_secs = duration.as_secs(),
                    "Estimate ready"
                );
                TravelEstimate::Available(duration)
            }
            Err(e) => {
                debug!(address, error = %e, "Estimate stopped at eta");
                TravelEstimate::NotAvailable(e)
            }
        }
    }

    /// [`estimate`](Self::estimate) rendered for display.
    pub async fn estimate_travel(
        &self,
        address: &str,
        from: Coordinate,
        mode: TransportMode,
    ) -> String {
        self.estimate(address, from, mode).await.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::NEW_YORK_CITY;
    use crate::provider::{FakeOp, FakeProvider, ProviderError};
    use crate::query::QueryConfig;
    use std::sync::Arc;

    fn estimator(fake: FakeProvider) -> (SequentialEstimator, Arc<FakeProvider>) {
        let fake = Arc::new(fake);
        let client = GeoQueryClient::new(fake.clone(), QueryConfig::default());
        (SequentialEstimator::new(client), fake)
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::ZERO), "0m");
        assert_eq!(format_duration(Duration::from_secs(59)), "0m");
        assert_eq!(format_duration(Duration::from_secs(60)), "1m");
        assert_eq!(format_duration(Duration::from_secs(3599)), "59m");
        assert_eq!(format_duration(Duration::from_secs(3600)), "1h");
        assert_eq!(format_duration(Duration::from_secs(5 * 3600 + 59 * 60)), "5h");
    }

    #[tokio::test]
    async fn test_geocode_failure_skips_eta() {
        let (estimator, fake) = estimator(FakeProvider::with_gazetteer());

        let result = estimator
            .estimate_travel("nowhere", NEW_YORK_CITY, TransportMode::Automobile)
            .await;

        assert_eq!(result, NOT_AVAILABLE);
        assert_eq!(fake.calls(FakeOp::Geocode), 1);
        assert_eq!(fake.calls(FakeOp::Eta), 0);
    }

    #[tokio::test]
    async fn test_eta_failure_is_not_available() {
        let (estimator, fake) = estimator(
            FakeProvider::with_gazetteer().failing(FakeOp::Eta, ProviderError::NoRoute),
        );

        let estimate = estimator
            .estimate("Central Park", NEW_YORK_CITY, TransportMode::Walking)
            .await;

        assert_eq!(estimate, TravelEstimate::NotAvailable(QueryError::NoRoute));
        assert_eq!(estimate.to_string(), NOT_AVAILABLE);
        assert_eq!(fake.calls(FakeOp::Eta), 1);
    }

    #[tokio::test]
    async fn test_successful_estimate_is_formatted() {
        let (estimator, _) = estimator(FakeProvider::with_gazetteer());
        let central_park = Coordinate::new(40.7829, -73.9654);
        let expected =
            FakeProvider::synthesize_leg(NEW_YORK_CITY, central_park, TransportMode::Walking).duration;

        let estimate = estimator
            .estimate("Central Park", NEW_YORK_CITY, TransportMode::Walking)
            .await;

        assert_eq!(estimate.duration(), Some(expected));
        assert_eq!(estimate.to_string(), format_duration(expected));
    }
}
