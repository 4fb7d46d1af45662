//! Device location collaborator.
//!
//! The session asks for one fix at start-up and never polls again.

use thiserror::Error;

use crate::coord::Coordinate;
use crate::provider::BoxFuture;

/// Why no fix is available.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location unavailable: {0}")]
    Unavailable(String),
}

/// Supplies a single device position.
pub trait LocationSource: Send + Sync {
    /// Resolve the current position once.
    fn current_location(&self) -> BoxFuture<'_, Result<Coordinate, LocationError>>;
}

/// Always reports the same position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedLocation(pub Coordinate);

impl LocationSource for FixedLocation {
    fn current_location(&self) -> BoxFuture<'_, Result<Coordinate, LocationError>> {
        let coordinate = self.0;
        Box::pin(async move {
            coordinate
                .validate()
                .map_err(|e| LocationError::Unavailable(e.to_string()))?;
            Ok(coordinate)
        })
    }
}

/// No location service; every request fails with the given error.
#[derive(Debug, Clone, PartialEq)]
pub struct NoLocation(pub LocationError);

impl Default for NoLocation {
    fn default() -> Self {
        Self(LocationError::Unavailable("no location service".to_string()))
    }
}

impl LocationSource for NoLocation {
    fn current_location(&self) -> BoxFuture<'_, Result<Coordinate, LocationError>> {
        let error = self.0.clone();
        Box::pin(async move { Err(error) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_location() {
        let source = FixedLocation(Coordinate::new(42.355, -71.0656));
        assert_eq!(
            source.current_location().await,
            Ok(Coordinate::new(42.355, -71.0656))
        );
    }

    #[tokio::test]
    async fn test_fixed_location_rejects_invalid_fix() {
        let source = FixedLocation(Coordinate::new(120.0, 0.0));
        assert!(matches!(
            source.current_location().await,
            Err(LocationError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_no_location() {
        let source = NoLocation(LocationError::PermissionDenied);
        assert_eq!(
            source.current_location().await,
            Err(LocationError::PermissionDenied)
        );
        assert!(NoLocation::default().current_location().await.is_err());
    }
}
