//! Route leg and trip types.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::coord::Coordinate;
use crate::query::QueryError;

/// How the traveller moves between stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransportMode {
    /// Driving.
    #[default]
    Automobile,
    /// On foot.
    Walking,
    /// Public transit.
    Transit,
}

impl TransportMode {
    /// All modes, in display order.
    pub const ALL: [TransportMode; 3] = [
        TransportMode::Automobile,
        TransportMode::Walking,
        TransportMode::Transit,
    ];

    /// Canonical lowercase name used in config files and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMode::Automobile => "automobile",
            TransportMode::Walking => "walking",
            TransportMode::Transit => "transit",
        }
    }

    /// Typical average speed in meters per second.
    ///
    /// Used by providers that synthesize durations from distance.
    pub fn typical_speed_mps(&self) -> f64 {
        match self {
            TransportMode::Automobile => 13.9, // ~50 km/h urban
            TransportMode::Walking => 1.4,
            TransportMode::Transit => 8.3,
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "automobile" | "auto" | "driving" | "car" => Ok(TransportMode::Automobile),
            "walking" | "walk" | "foot" => Ok(TransportMode::Walking),
            "transit" => Ok(TransportMode::Transit),
            other => Err(format!("unknown transport mode '{}'", other)),
        }
    }
}

/// One resolved point-to-point segment.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteLeg {
    /// Start of the leg.
    pub source: Coordinate,
    /// End of the leg.
    pub destination: Coordinate,
    /// Mode the leg was routed for.
    pub mode: TransportMode,
    /// Path geometry, source to destination.
    pub polyline: Vec<Coordinate>,
    /// Expected travel time.
    pub duration: Duration,
    /// Path length in meters.
    pub distance_m: f64,
}

/// An ordered, fully resolved sequence of legs covering
/// source → waypoints → destination.
///
/// A `Trip` can only be built from a complete, chained leg list, so a
/// partially populated trip is unrepresentable.
#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    legs: Vec<RouteLeg>,
}

impl Trip {
    /// Build a trip, checking that there is at least one leg and that each
    /// leg starts where the previous one ended.
    pub fn from_legs(legs: Vec<RouteLeg>) -> Result<Self, QueryError> {
        if legs.is_empty() {
            return Err(QueryError::InvalidInput(
                "a trip needs at least one leg".to_string(),
            ));
        }
        for (index, pair) in legs.windows(2).enumerate() {
            if pair[0].destination != pair[1].source {
                return Err(QueryError::InvalidInput(format!(
                    "leg {} ends at {} but leg {} starts at {}",
                    index,
                    pair[0].destination,
                    index + 1,
                    pair[1].source
                )));
            }
        }
        Ok(Self { legs })
    }

    /// Legs in travel order.
    pub fn legs(&self) -> &[RouteLeg] {
        &self.legs
    }

    /// Start of the first leg.
    pub fn source(&self) -> Coordinate {
        self.legs[0].source
    }

    /// End of the last leg.
    pub fn destination(&self) -> Coordinate {
        self.legs[self.legs.len() - 1].destination
    }

    /// Every stop, source first and destination last.
    pub fn stops(&self) -> Vec<Coordinate> {
        std::iter::once(self.source())
            .chain(self.legs.iter().map(|leg| leg.destination))
            .collect()
    }

    /// Sum of all leg durations.
    pub fn total_duration(&self) -> Duration {
        self.legs.iter().map(|leg| leg.duration).sum()
    }

    /// Sum of all leg distances in meters.
    pub fn total_distance_m(&self) -> f64 {
        self.legs.iter().map(|leg| leg.distance_m).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leg(from: Coordinate, to: Coordinate) -> RouteLeg {
        RouteLeg {
            source: from,
            destination: to,
            mode: TransportMode::Automobile,
            polyline: vec![from, to],
            duration: Duration::from_secs(600),
            distance_m: 5_000.0,
        }
    }

    const A: Coordinate = Coordinate::new(40.0, -74.0);
    const B: Coordinate = Coordinate::new(40.1, -74.0);
    const C: Coordinate = Coordinate::new(40.2, -74.0);

    #[test]
    fn test_trip_from_chained_legs() {
        let trip = Trip::from_legs(vec![leg(A, B), leg(B, C)]).unwrap();
        assert_eq!(trip.legs().len(), 2);
        assert_eq!(trip.source(), A);
        assert_eq!(trip.destination(), C);
        assert_eq!(trip.stops(), vec![A, B, C]);
        assert_eq!(trip.total_duration(), Duration::from_secs(1200));
        assert_eq!(trip.total_distance_m(), 10_000.0);
    }

    #[test]
    fn test_trip_rejects_broken_chain() {
        let result = Trip::from_legs(vec![leg(A, B), leg(A, C)]);
        assert!(matches!(result, Err(QueryError::InvalidInput(_))));
    }

    #[test]
    fn test_trip_rejects_empty() {
        assert!(Trip::from_legs(Vec::new()).is_err());
    }

    #[test]
    fn test_transport_mode_parse() {
        assert_eq!("driving".parse(), Ok(TransportMode::Automobile));
        assert_eq!("Walking".parse(), Ok(TransportMode::Walking));
        assert_eq!("transit".parse(), Ok(TransportMode::Transit));
        assert!("teleport".parse::<TransportMode>().is_err());
    }

    #[test]
    fn test_transport_mode_display_roundtrip() {
        for mode in TransportMode::ALL {
            assert_eq!(mode.to_string().parse(), Ok(mode));
        }
    }
}
