//! Routing commands: `trip` and `eta`.

use wayfinder::config::ConfigFile;
use wayfinder::coord::Coordinate;
use wayfinder::estimator::{format_duration, SequentialEstimator, TravelEstimate};
use wayfinder::routing::{RouteAggregator, Trip};

use super::common::{query_client, resolve_mode, resolve_stop, ModeArg};
use crate::error::CliError;

/// Route `from → via… → to` and print each leg.
pub async fn run_trip(
    from: &str,
    to: &str,
    via: &[String],
    mode: Option<ModeArg>,
    offline: bool,
    config: &ConfigFile,
) -> Result<(), CliError> {
    let client = query_client(offline, config)?;
    let mode = resolve_mode(mode, config);

    let source = resolve_stop(&client, from).await?;
    let mut waypoints = Vec::with_capacity(via.len());
    for stop in via {
        waypoints.push(resolve_stop(&client, stop).await?);
    }
    let destination = resolve_stop(&client, to).await?;

    let trip = RouteAggregator::new(client)
        .compute_trip(source, &waypoints, destination, mode)
        .await?;
    print_trip(&trip);
    Ok(())
}

/// Travel time to `address`, printing "Not available" on any failure.
pub async fn run_eta(
    address: &str,
    from: Option<Coordinate>,
    mode: Option<ModeArg>,
    offline: bool,
    config: &ConfigFile,
) -> Result<(), CliError> {
    let client = query_client(offline, config)?;
    let from = from.unwrap_or_else(|| config.session.initial_center());
    let mode = resolve_mode(mode, config);

    let estimate = SequentialEstimator::new(client)
        .estimate(address, from, mode)
        .await;
    println!("{}", estimate);
    if let TravelEstimate::NotAvailable(error) = &estimate {
        tracing::info!(error = %error, "Estimate unavailable");
    }
    Ok(())
}

fn print_trip(trip: &Trip) {
    println!(
        "Trip: {} legs, {:.1} km, {}",
        trip.legs().len(),
        trip.total_distance_m() / 1000.0,
        format_duration(trip.total_duration())
    );
    for (index, leg) in trip.legs().iter().enumerate() {
        println!(
            "  {}. {} → {}  {:.1} km  {}  ({})",
            index + 1,
            leg.source,
            leg.destination,
            leg.distance_m / 1000.0,
            format_duration(leg.duration),
            leg.mode
        );
    }
}
