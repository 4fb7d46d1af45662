//! Common types and utilities shared across CLI commands.

use std::sync::Arc;

use clap::ValueEnum;
use tracing::debug;
use wayfinder::config::ConfigFile;
use wayfinder::coord::Coordinate;
use wayfinder::provider::{FakeProvider, GeoProvider, OsmProvider, ReqwestClient, DEFAULT_HTTP_TIMEOUT};
use wayfinder::query::GeoQueryClient;
use wayfinder::routing::TransportMode;

use crate::error::CliError;

/// Transport mode selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ModeArg {
    /// Driving
    #[value(alias = "driving", alias = "car")]
    Automobile,
    /// On foot
    #[value(alias = "walk")]
    Walking,
    /// Public transit (not every provider can route it)
    Transit,
}

impl From<ModeArg> for TransportMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Automobile => TransportMode::Automobile,
            ModeArg::Walking => TransportMode::Walking,
            ModeArg::Transit => TransportMode::Transit,
        }
    }
}

/// CLI takes precedence, then config.
pub fn resolve_mode(cli_mode: Option<ModeArg>, config: &ConfigFile) -> TransportMode {
    cli_mode
        .map(TransportMode::from)
        .unwrap_or(config.session.default_mode)
}

/// Build the provider: the built-in gazetteer when offline, otherwise the
/// configured OpenStreetMap services.
pub fn resolve_provider(offline: bool, config: &ConfigFile) -> Result<Arc<dyn GeoProvider>, CliError> {
    if offline {
        debug!("Using offline gazetteer");
        return Ok(Arc::new(FakeProvider::with_gazetteer()));
    }
    let http = ReqwestClient::with_settings(DEFAULT_HTTP_TIMEOUT, &config.provider.user_agent)?;
    debug!(
        search_url = %config.provider.search_url,
        routing_url = %config.provider.routing_url,
        "Using OpenStreetMap services"
    );
    Ok(Arc::new(OsmProvider::with_endpoints(
        http,
        config.provider.search_url.clone(),
        config.provider.routing_url.clone(),
    )))
}

/// A query client with the configured timeout.
pub fn query_client(offline: bool, config: &ConfigFile) -> Result<GeoQueryClient, CliError> {
    Ok(GeoQueryClient::new(
        resolve_provider(offline, config)?,
        config.query_config(),
    ))
}

/// Interpret `text` as `lat,lon`, or geocode it.
pub async fn resolve_stop(client: &GeoQueryClient, text: &str) -> Result<Coordinate, CliError> {
    if let Ok(coordinate) = text.parse::<Coordinate>() {
        return Ok(coordinate);
    }
    let placemark = client.geocode(text).await?;
    debug!(text, resolved = %placemark.coordinate, name = %placemark.name, "Stop geocoded");
    Ok(placemark.coordinate)
}
