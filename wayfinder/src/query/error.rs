//! Query error taxonomy.

use std::time::Duration;

use thiserror::Error;

use crate::provider::ProviderError;

/// Structured outcome kinds for failed queries.
///
/// The core never formats user-facing prose from these; the view layer
/// decides what to show.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// No geocode match.
    #[error("not found")]
    NotFound,

    /// No path for the requested transport mode.
    #[error("no route")]
    NoRoute,

    /// Transport or permission failure at the provider.
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The provider did not answer within the configured timeout.
    #[error("timed out after {0:?}")]
    TimedOut(Duration),

    /// A newer request of the same kind replaced this one. Returned by
    /// [`QuerySlot::complete`](super::QuerySlot::complete) and never published.
    #[error("superseded")]
    Superseded,

    /// The caller violated an operation precondition.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl QueryError {
    /// Short machine-friendly label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::NotFound => "not_found",
            QueryError::NoRoute => "no_route",
            QueryError::ProviderUnavailable(_) => "provider_unavailable",
            QueryError::TimedOut(_) => "timed_out",
            QueryError::Superseded => "superseded",
            QueryError::InvalidInput(_) => "invalid_input",
        }
    }
}

impl From<ProviderError> for QueryError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::NotFound => QueryError::NotFound,
            ProviderError::NoRoute => QueryError::NoRoute,
            ProviderError::Unavailable(msg) => QueryError::ProviderUnavailable(msg),
            ProviderError::InvalidResponse(msg) => {
                QueryError::ProviderUnavailable(format!("invalid response: {}", msg))
            }
            ProviderError::HttpError(msg) => QueryError::ProviderUnavailable(msg),
        }
    }
}
