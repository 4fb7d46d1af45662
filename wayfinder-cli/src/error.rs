//! CLI error type.

use std::io;

use thiserror::Error;
use wayfinder::config::ConfigError;
use wayfinder::coord::CoordError;
use wayfinder::provider::ProviderError;
use wayfinder::query::QueryError;
use wayfinder::session::SessionError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Config(String),

    #[error(transparent)]
    ConfigFile(#[from] ConfigError),

    #[error("Invalid coordinate: {0}")]
    Coordinate(#[from] CoordError),

    #[error("Provider setup failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Query failed: {0}")]
    Query(#[from] QueryError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Failed to start async runtime: {0}")]
    Runtime(#[from] io::Error),
}
