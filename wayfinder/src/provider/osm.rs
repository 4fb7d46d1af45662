//! OpenStreetMap-backed provider.
//!
//! Talks to a Nominatim-compatible geocoder for search, geocoding, reverse
//! geocoding and points of interest, and to an OSRM-compatible router for
//! routes and travel times.
//!
//! # API Endpoints
//!
//! - Search: `{search_url}/search?q={text}&format=jsonv2&limit={n}`
//! - Reverse: `{search_url}/reverse?lat={lat}&lon={lon}&format=jsonv2`
//! - Route: `{routing_url}/route/v1/{profile}/{lon},{lat};{lon},{lat}?overview=full&geometries=geojson`
//!
//! OSRM has no public transit profile, so transit requests resolve to
//! [`ProviderError::NoRoute`] without a network round trip.

use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use crate::coord::{Coordinate, Region};
use crate::provider::{
    AsyncHttpClient, BoxFuture, GeoProvider, MapItem, PlaceCandidate, Placemark, ProviderError,
};
use crate::routing::{RouteLeg, TransportMode};

/// Public Nominatim instance.
pub const DEFAULT_SEARCH_URL: &str = "https://nominatim.openstreetmap.org";

/// Public OSRM demo server.
pub const DEFAULT_ROUTING_URL: &str = "https://router.project-osrm.org";

/// Maximum candidates requested per autocomplete query.
const SEARCH_LIMIT: usize = 8;

/// Categories searched when a nearby query names none.
const DEFAULT_NEARBY_CATEGORIES: &[&str] = &["cafe", "restaurant", "park"];

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    display_name: String,
    lat: String,
    lon: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NominatimError {
    error: String,
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    duration: f64,
    distance: f64,
    #[serde(default)]
    geometry: Option<OsrmGeometry>,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}

impl NominatimPlace {
    fn coordinate(&self) -> Result<Coordinate, ProviderError> {
        let parse = |v: &str| {
            v.parse::<f64>()
                .map_err(|_| ProviderError::InvalidResponse(format!("bad coordinate '{}'", v)))
        };
        Coordinate::try_new(parse(&self.lat)?, parse(&self.lon)?)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }

    /// Split `display_name` into a title and the remaining locality.
    fn labels(&self) -> (String, String) {
        let (head, tail) = self
            .display_name
            .split_once(", ")
            .unwrap_or((self.display_name.as_str(), ""));
        let title = match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => head,
        };
        let subtitle = if title == head { tail } else { &self.display_name };
        (title.to_string(), subtitle.to_string())
    }

    fn candidate(&self) -> PlaceCandidate {
        let (title, subtitle) = self.labels();
        PlaceCandidate::new(title, subtitle, &self.display_name)
    }

    fn map_item(&self) -> Result<MapItem, ProviderError> {
        let (title, _) = self.labels();
        Ok(MapItem {
            name: title,
            coordinate: self.coordinate()?,
            category: self.kind.clone(),
            address: Some(self.display_name.clone()),
        })
    }

    fn placemark(&self) -> Result<Placemark, ProviderError> {
        self.map_item().map(Placemark::from)
    }
}

fn parse_json<'de, T: Deserialize<'de>>(body: &'de [u8]) -> Result<T, ProviderError> {
    serde_json::from_slice(body).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
}

fn osrm_profile(mode: TransportMode) -> Option<&'static str> {
    match mode {
        TransportMode::Automobile => Some("driving"),
        TransportMode::Walking => Some("foot"),
        TransportMode::Transit => None,
    }
}

/// Nominatim + OSRM provider over an injectable HTTP client.
pub struct OsmProvider<C: AsyncHttpClient> {
    http_client: C,
    search_url: String,
    routing_url: String,
}

impl<C: AsyncHttpClient> OsmProvider<C> {
    /// Creates a provider against the public OpenStreetMap services.
    pub fn new(http_client: C) -> Self {
        Self::with_endpoints(http_client, DEFAULT_SEARCH_URL, DEFAULT_ROUTING_URL)
    }

    /// Creates a provider against self-hosted services.
    pub fn with_endpoints(
        http_client: C,
        search_url: impl Into<String>,
        routing_url: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            search_url: search_url.into().trim_end_matches('/').to_string(),
            routing_url: routing_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn build_url(base: &str, path: &str, params: &[(&str, String)]) -> Result<String, ProviderError> {
        Url::parse_with_params(&format!("{}{}", base, path), params)
            .map(String::from)
            .map_err(|e| ProviderError::HttpError(format!("Invalid URL {}{}: {}", base, path, e)))
    }

    fn search_url(&self, text: &str, limit: usize) -> Result<String, ProviderError> {
        Self::build_url(
            &self.search_url,
            "/search",
            &[
                ("q", text.to_string()),
                ("format", "jsonv2".to_string()),
                ("limit", limit.to_string()),
            ],
        )
    }

    fn bounded_search_url(
        &self,
        text: &str,
        center: Coordinate,
        radius_m: f64,
    ) -> Result<String, ProviderError> {
        let region = Region::from_meters(center, radius_m * 2.0, radius_m * 2.0)
            .map_err(|e| ProviderError::HttpError(e.to_string()))?;
        let half_lat = region.span().latitude_delta / 2.0;
        let half_lon = region.span().longitude_delta / 2.0;
        let viewbox = format!(
            "{},{},{},{}",
            center.longitude - half_lon,
            center.latitude + half_lat,
            center.longitude + half_lon,
            center.latitude - half_lat
        );
        Self::build_url(
            &self.search_url,
            "/search",
            &[
                ("q", text.to_string()),
                ("format", "jsonv2".to_string()),
                ("limit", SEARCH_LIMIT.to_string()),
                ("viewbox", viewbox),
                ("bounded", "1".to_string()),
            ],
        )
    }

    fn reverse_url(&self, coordinate: Coordinate) -> Result<String, ProviderError> {
        Self::build_url(
            &self.search_url,
            "/reverse",
            &[
                ("lat", coordinate.latitude.to_string()),
                ("lon", coordinate.longitude.to_string()),
                ("format", "jsonv2".to_string()),
            ],
        )
    }

    fn route_url(
        &self,
        profile: &str,
        from: Coordinate,
        to: Coordinate,
        with_geometry: bool,
    ) -> Result<String, ProviderError> {
        let path = format!(
            "/route/v1/{}/{},{};{},{}",
            profile, from.longitude, from.latitude, to.longitude, to.latitude
        );
        let params = if with_geometry {
            vec![
                ("overview", "full".to_string()),
                ("geometries", "geojson".to_string()),
            ]
        } else {
            vec![("overview", "false".to_string())]
        };
        Self::build_url(&self.routing_url, &path, &params)
    }

    async fn fetch_places(&self, url: &str) -> Result<Vec<NominatimPlace>, ProviderError> {
        let body = self.http_client.get(url).await?;
        parse_json(&body)
    }

    async fn fetch_route(
        &self,
        from: Coordinate,
        to: Coordinate,
        mode: TransportMode,
        with_geometry: bool,
    ) -> Result<OsrmRoute, ProviderError> {
        let profile = osrm_profile(mode).ok_or(ProviderError::NoRoute)?;
        let url = self.route_url(profile, from, to, with_geometry)?;
        let body = self.http_client.get(&url).await?;
        let response: OsrmResponse = parse_json(&body)?;

        match response.code.as_str() {
            "Ok" => response.routes.into_iter().next().ok_or(ProviderError::NoRoute),
            "NoRoute" | "NoSegment" => Err(ProviderError::NoRoute),
            other => Err(ProviderError::Unavailable(format!(
                "router returned {}: {}",
                other,
                response.message.unwrap_or_default()
            ))),
        }
    }
}

impl<C: AsyncHttpClient> GeoProvider for OsmProvider<C> {
    fn name(&self) -> &str {
        "OpenStreetMap"
    }

    fn search<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<PlaceCandidate>, ProviderError>> {
        Box::pin(async move {
            let url = self.search_url(text, SEARCH_LIMIT)?;
            let places = self.fetch_places(&url).await?;
            Ok(places.iter().map(NominatimPlace::candidate).collect())
        })
    }

    fn search_places<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<MapItem>, ProviderError>> {
        Box::pin(async move {
            let url = self.search_url(text, SEARCH_LIMIT)?;
            let places = self.fetch_places(&url).await?;
            places.iter().map(NominatimPlace::map_item).collect()
        })
    }

    fn geocode<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Placemark, ProviderError>> {
        Box::pin(async move {
            let url = self.search_url(text, 1)?;
            let places = self.fetch_places(&url).await?;
            places
                .first()
                .ok_or(ProviderError::NotFound)?
                .placemark()
        })
    }

    fn reverse_geocode(&self, coordinate: Coordinate) -> BoxFuture<'_, Result<Placemark, ProviderError>> {
        Box::pin(async move {
            let url = self.reverse_url(coordinate)?;
            let body = self.http_client.get(&url).await?;
            if let Ok(error) = serde_json::from_slice::<NominatimError>(&body) {
                tracing::debug!(error = %error.error, "Reverse geocode found nothing");
                return Err(ProviderError::NotFound);
            }
            parse_json::<NominatimPlace>(&body)?.placemark()
        })
    }

    fn route(
        &self,
        from: Coordinate,
        to: Coordinate,
        mode: TransportMode,
    ) -> BoxFuture<'_, Result<RouteLeg, ProviderError>> {
        Box::pin(async move {
            let route = self.fetch_route(from, to, mode, true).await?;
            let mut polyline: Vec<Coordinate> = route
                .geometry
                .map(|g| {
                    g.coordinates
                        .into_iter()
                        .map(|[lon, lat]| Coordinate::new(lat, lon))
                        .collect()
                })
                .unwrap_or_default();
            if polyline.is_empty() {
                polyline = vec![from, to];
            }
            Ok(RouteLeg {
                source: from,
                destination: to,
                mode,
                polyline,
                duration: Duration::from_secs_f64(route.duration.max(0.0)),
                distance_m: route.distance,
            })
        })
    }

    fn eta(
        &self,
        from: Coordinate,
        to: Coordinate,
        mode: TransportMode,
    ) -> BoxFuture<'_, Result<Duration, ProviderError>> {
        Box::pin(async move {
            let route = self.fetch_route(from, to, mode, false).await?;
            Ok(Duration::from_secs_f64(route.duration.max(0.0)))
        })
    }

    fn nearby<'a>(
        &'a self,
        center: Coordinate,
        radius_m: f64,
        categories: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<MapItem>, ProviderError>> {
        Box::pin(async move {
            let wanted: Vec<&str> = if categories.is_empty() {
                DEFAULT_NEARBY_CATEGORIES.to_vec()
            } else {
                categories.iter().map(String::as_str).collect()
            };

            let mut found: Vec<(MapItem, f64)> = Vec::new();
            for category in wanted {
                let url = self.bounded_search_url(category, center, radius_m)?;
                for place in self.fetch_places(&url).await? {
                    let item = place.map_item()?;
                    let distance = item.coordinate.distance_to(&center);
                    if distance <= radius_m && !found.iter().any(|(f, _)| f.name == item.name) {
                        found.push((item, distance));
                    }
                }
            }
            found.sort_by(|a, b| a.1.total_cmp(&b.1));
            Ok(found.into_iter().map(|(item, _)| item).collect())
        })
    }
}
