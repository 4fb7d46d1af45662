//! Routing: transport modes, legs, trips and the multi-leg aggregator.

mod aggregator;
mod types;

pub use aggregator::RouteAggregator;
pub use types::{RouteLeg, TransportMode, Trip};
