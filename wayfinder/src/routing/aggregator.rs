//! Multi-waypoint trip computation.

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::coord::Coordinate;
use crate::query::{GeoQueryClient, QueryError};
use crate::routing::{RouteLeg, Trip, TransportMode};

/// Fans out one `route` call per consecutive stop pair and fans the legs
/// back into a single [`Trip`].
///
/// Legs are routed concurrently and reassembled by position in the stop
/// sequence, so completion order never affects the result. If any leg
/// fails the whole trip resolves to the first error observed (by
/// completion order); remaining legs are awaited and their results
/// discarded, so no task outlives the call.
#[derive(Debug, Clone)]
pub struct RouteAggregator {
    client: GeoQueryClient,
}

impl RouteAggregator {
    /// Create an aggregator over `client`.
    pub fn new(client: GeoQueryClient) -> Self {
        Self { client }
    }

    /// Compute `source → waypoints… → destination`.
    ///
    /// With no waypoints this is a single-leg trip.
    pub async fn compute_trip(
        &self,
        source: Coordinate,
        waypoints: &[Coordinate],
        destination: Coordinate,
        mode: TransportMode,
    ) -> Result<Trip, QueryError> {
        let mut stops = Vec::with_capacity(waypoints.len() + 2);
        stops.push(source);
        stops.extend_from_slice(waypoints);
        stops.push(destination);
        self.compute_trip_through(&stops, mode).await
    }

    /// Compute a trip visiting `stops` in order.
    ///
    /// Returns [`QueryError::InvalidInput`] for fewer than two stops.
    pub async fn compute_trip_through(
        &self,
        stops: &[Coordinate],
        mode: TransportMode,
    ) -> Result<Trip, QueryError> {
        if stops.len() < 2 {
            return Err(QueryError::InvalidInput(format!(
                "a trip needs at least 2 stops, got {}",
                stops.len()
            )));
        }
        for stop in stops {
            stop.validate()
                .map_err(|e| QueryError::InvalidInput(e.to_string()))?;
        }

        let leg_count = stops.len() - 1;
        debug!(legs = leg_count, mode = %mode, "Computing trip");

        let mut tasks = JoinSet::new();
        for (index, pair) in stops.windows(2).enumerate() {
            let client = self.client.clone();
            let (from, to) = (pair[0], pair[1]);
            tasks.spawn(async move { (index, client.route(from, to, mode).await) });
        }

        let mut legs: Vec<Option<RouteLeg>> = vec![None; leg_count];
        let mut first_error: Option<QueryError> = None;

        while let Some(joined) = tasks.join_next().await {
            let (index, result) = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(error = %e, "Route task aborted");
                    first_error.get_or_insert(QueryError::ProviderUnavailable(format!(
                        "route task failed: {}",
                        e
                    )));
                    continue;
                }
            };
            match result {
                Ok(leg) if first_error.is_none() => legs[index] = Some(leg),
                Ok(_) => debug!(leg = index, "Discarding leg after earlier failure"),
                Err(e) => {
                    if first_error.is_none() {
                        warn!(leg = index, error = %e, "Trip leg failed");
                        first_error = Some(e);
                    } else {
                        debug!(leg = index, error = %e, "Discarding later leg failure");
                    }
                }
            }
        }

        if let Some(error) = first_error {
            return Err(error);
        }

        let legs = legs
            .into_iter()
            .enumerate()
            .map(|(index, leg)| {
                leg.ok_or_else(|| {
                    QueryError::ProviderUnavailable(format!("leg {} never resolved", index))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let trip = Trip::from_legs(legs)?;
        debug!(
            legs = leg_count,
            duration_secs = trip.total_duration().as_secs(),
            "Trip computed"
        );
        Ok(trip)
    }
}
