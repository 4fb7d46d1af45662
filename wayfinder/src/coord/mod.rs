//! Geographic coordinate and region types.
//!
//! Provides the immutable [`Coordinate`] and [`Region`] value types shared by
//! every query and by the published session state, plus the distance math
//! the in-memory provider uses to synthesize routes.

mod types;

pub use types::{Coordinate, CoordError, Region, Span, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Approximate length of one degree of latitude in meters.
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// New York City, the default map focus before a device fix arrives.
pub const NEW_YORK_CITY: Coordinate = Coordinate::new(40.7128, -74.0060);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_new_accepts_valid_coordinates() {
        let coord = Coordinate::try_new(40.7128, -74.0060).unwrap();
        assert_eq!(coord.latitude, 40.7128);
        assert_eq!(coord.longitude, -74.0060);
    }

    #[test]
    fn test_invalid_latitude() {
        let result = Coordinate::try_new(90.5, 0.0);
        assert!(matches!(result, Err(CoordError::InvalidLatitude(_))));
    }

    #[test]
    fn test_invalid_longitude() {
        let result = Coordinate::try_new(0.0, -181.0);
        assert!(matches!(result, Err(CoordError::InvalidLongitude(_))));
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(Coordinate::try_new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::try_new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_parse_coordinate() {
        let coord: Coordinate = "40.7128, -74.0060".parse().unwrap();
        assert_eq!(coord, NEW_YORK_CITY);

        assert!(matches!(
            "40.7128".parse::<Coordinate>(),
            Err(CoordError::Parse(_))
        ));
        assert!(matches!(
            "north,west".parse::<Coordinate>(),
            Err(CoordError::Parse(_))
        ));
        assert!(matches!(
            "95,10".parse::<Coordinate>(),
            Err(CoordError::InvalidLatitude(_))
        ));
    }

    #[test]
    fn test_distance_nyc_to_boston() {
        let boston = Coordinate::new(42.3601, -71.0589);
        let distance = NEW_YORK_CITY.distance_to(&boston);
        // ~306 km great-circle
        assert!(
            (distance - 306_000.0).abs() < 5_000.0,
            "unexpected distance {}",
            distance
        );
    }

    #[test]
    fn test_distance_to_self_is_zero() {
        assert_eq!(NEW_YORK_CITY.distance_to(&NEW_YORK_CITY), 0.0);
    }

    #[test]
    fn test_region_rejects_non_positive_span() {
        let result = Region::new(NEW_YORK_CITY, Span::new(0.0, 0.1));
        assert!(matches!(result, Err(CoordError::InvalidSpan { .. })));

        let result = Region::new(NEW_YORK_CITY, Span::new(0.1, -0.1));
        assert!(result.is_err());
    }

    #[test]
    fn test_region_from_meters() {
        let region = Region::from_meters(NEW_YORK_CITY, 1000.0, 1000.0).unwrap();
        let span = region.span();

        assert!((span.latitude_delta - 1000.0 / METERS_PER_DEGREE).abs() < 1e-9);
        // Longitude degrees are shorter at 40°N, so the delta is wider
        assert!(span.longitude_delta > span.latitude_delta);
        assert_eq!(region.center(), NEW_YORK_CITY);
    }

    #[test]
    fn test_region_from_meters_at_pole_is_capped() {
        let pole = Coordinate::new(90.0, 0.0);
        let region = Region::from_meters(pole, 1000.0, 1000.0).unwrap();
        assert!(region.span().longitude_delta <= 360.0);
    }

    #[test]
    fn test_region_contains() {
        let region = Region::new(NEW_YORK_CITY, Span::new(0.1, 0.1)).unwrap();
        assert!(region.contains(&Coordinate::new(40.75, -74.0)));
        assert!(!region.contains(&Coordinate::new(41.0, -74.0)));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_display_parse_roundtrip(
                lat in -90.0..=90.0_f64,
                lon in -180.0..=180.0_f64
            ) {
                let coord = Coordinate::new(lat, lon);
                let parsed: Coordinate = coord.to_string().parse()?;
                prop_assert!((parsed.latitude - lat).abs() < 1e-6);
                prop_assert!((parsed.longitude - lon).abs() < 1e-6);
            }

            #[test]
            fn test_region_from_meters_contains_center(
                lat in -85.0..85.0_f64,
                lon in -180.0..180.0_f64,
                meters in 1.0..100_000.0_f64
            ) {
                let center = Coordinate::new(lat, lon);
                let region = Region::from_meters(center, meters, meters)?;
                prop_assert!(region.contains(&center));
            }
        }
    }
}
