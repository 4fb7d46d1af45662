//! Deterministic in-memory provider.
//!
//! `FakeProvider` answers every operation from a small list of places and
//! synthesizes routes from great-circle distance. Latency and failures can
//! be injected per operation, per query text, or per leg, and every call is
//! counted, which makes it the seam for testing everything above the
//! provider. The CLI's `--offline` mode uses [`FakeProvider::with_gazetteer`].

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;

use crate::coord::Coordinate;
use crate::provider::{BoxFuture, GeoProvider, MapItem, PlaceCandidate, Placemark, ProviderError};
use crate::routing::{RouteLeg, TransportMode};

/// Radius within which reverse geocoding snaps to a known place.
const REVERSE_GEOCODE_RADIUS_M: f64 = 5_000.0;

/// Provider operations, for counting and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FakeOp {
    Search,
    SearchPlaces,
    Geocode,
    ReverseGeocode,
    Route,
    Eta,
    Nearby,
}

/// A place known to the fake provider.
#[derive(Debug, Clone, PartialEq)]
pub struct FakePlace {
    pub name: String,
    pub locality: String,
    pub coordinate: Coordinate,
    pub category: Option<String>,
}

impl FakePlace {
    /// Create a place with no category.
    pub fn new(name: impl Into<String>, locality: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            name: name.into(),
            locality: locality.into(),
            coordinate,
            category: None,
        }
    }

    /// Set the point-of-interest category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    fn matches(&self, text: &str) -> bool {
        let needle = text.trim().to_lowercase();
        self.name.to_lowercase().contains(&needle)
    }

    fn candidate(&self) -> PlaceCandidate {
        PlaceCandidate::new(&self.name, &self.locality, &self.name)
    }

    fn map_item(&self) -> MapItem {
        MapItem {
            name: self.name.clone(),
            coordinate: self.coordinate,
            category: self.category.clone(),
            address: Some(format!("{}, {}", self.name, self.locality)),
        }
    }

    fn placemark(&self) -> Placemark {
        self.map_item().into()
    }
}

#[derive(Debug, Clone)]
struct LegRule<T> {
    from: Coordinate,
    to: Coordinate,
    value: T,
}

/// In-memory [`GeoProvider`] with latency and failure injection.
#[derive(Debug, Default)]
pub struct FakeProvider {
    places: Vec<FakePlace>,
    latency: Duration,
    text_latency: HashMap<String, Duration>,
    leg_latency: Vec<LegRule<Duration>>,
    op_failures: HashMap<FakeOp, ProviderError>,
    text_failures: HashMap<(FakeOp, String), ProviderError>,
    leg_failures: Vec<LegRule<(FakeOp, ProviderError)>>,
    unroutable_modes: Vec<TransportMode>,
    calls: Mutex<HashMap<FakeOp, usize>>,
}

impl FakeProvider {
    /// Create an empty provider: searches return nothing, geocodes fail
    /// with `NotFound`, routes are synthesized for any pair of points.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider preloaded with a handful of New York City and
    /// Boston places.
    pub fn with_gazetteer() -> Self {
        let nyc = "New York, NY";
        Self::new()
            .with_place(FakePlace::new("Central Park", nyc, Coordinate::new(40.7829, -73.9654)).with_category("park"))
            .with_place(FakePlace::new("Times Square", nyc, Coordinate::new(40.7580, -73.9855)).with_category("landmark"))
            .with_place(FakePlace::new("Empire State Building", nyc, Coordinate::new(40.7484, -73.9857)).with_category("landmark"))
            .with_place(FakePlace::new("Brooklyn Bridge", nyc, Coordinate::new(40.7061, -73.9969)).with_category("landmark"))
            .with_place(FakePlace::new("Bowling Green", nyc, Coordinate::new(40.7049, -74.0137)).with_category("park"))
            .with_place(FakePlace::new("Statue of Liberty", nyc, Coordinate::new(40.6892, -74.0445)).with_category("landmark"))
            .with_place(FakePlace::new("Blue Bottle Coffee", nyc, Coordinate::new(40.7527, -73.9772)).with_category("cafe"))
            .with_place(FakePlace::new("Joe Coffee", nyc, Coordinate::new(40.7736, -73.9566)).with_category("cafe"))
            .with_place(FakePlace::new("Katz's Delicatessen", nyc, Coordinate::new(40.7223, -73.9874)).with_category("restaurant"))
            .with_place(FakePlace::new("JFK Airport", "Queens, NY", Coordinate::new(40.6413, -73.7781)).with_category("airport"))
            .with_place(FakePlace::new("Boston Common", "Boston, MA", Coordinate::new(42.3550, -71.0656)).with_category("park"))
    }

    /// Add a known place.
    pub fn with_place(mut self, place: FakePlace) -> Self {
        self.places.push(place);
        self
    }

    /// Default latency applied to every call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Latency for text operations (search, geocode) on exactly `text`.
    pub fn with_text_latency(mut self, text: impl Into<String>, latency: Duration) -> Self {
        self.text_latency.insert(text.into().to_lowercase(), latency);
        self
    }

    /// Latency for route/eta calls between `from` and `to`.
    pub fn with_leg_latency(mut self, from: Coordinate, to: Coordinate, latency: Duration) -> Self {
        self.leg_latency.push(LegRule {
            from,
            to,
            value: latency,
        });
        self
    }

    /// Make every call of `op` fail with `error`.
    pub fn failing(mut self, op: FakeOp, error: ProviderError) -> Self {
        self.op_failures.insert(op, error);
        self
    }

    /// Make `op` fail with `error` for exactly `text`.
    pub fn failing_text(mut self, op: FakeOp, text: impl Into<String>, error: ProviderError) -> Self {
        self.text_failures
            .insert((op, text.into().to_lowercase()), error);
        self
    }

    /// Make `op` (route or eta) fail with `error` between `from` and `to`.
    pub fn failing_leg(
        mut self,
        op: FakeOp,
        from: Coordinate,
        to: Coordinate,
        error: ProviderError,
    ) -> Self {
        self.leg_failures.push(LegRule {
            from,
            to,
            value: (op, error),
        });
        self
    }

    /// Report `NoRoute` for every route/eta in `mode`.
    pub fn without_mode(mut self, mode: TransportMode) -> Self {
        self.unroutable_modes.push(mode);
        self
    }

    /// Number of calls made to `op` so far.
    pub fn calls(&self, op: FakeOp) -> usize {
        self.calls.lock().get(&op).copied().unwrap_or(0)
    }

    /// Number of calls across all operations.
    pub fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }

    /// The synthesized leg for `from` → `to`, as `route` would return it.
    pub fn synthesize_leg(from: Coordinate, to: Coordinate, mode: TransportMode) -> RouteLeg {
        let distance_m = from.distance_to(&to);
        RouteLeg {
            source: from,
            destination: to,
            mode,
            polyline: vec![from, to],
            duration: Duration::from_secs_f64(distance_m / mode.typical_speed_mps()),
            distance_m,
        }
    }

    fn record(&self, op: FakeOp) {
        *self.calls.lock().entry(op).or_insert(0) += 1;
    }

    fn text_latency(&self, text: &str) -> Duration {
        self.text_latency
            .get(&text.to_lowercase())
            .copied()
            .unwrap_or(self.latency)
    }

    fn leg_latency(&self, from: Coordinate, to: Coordinate) -> Duration {
        self.leg_latency
            .iter()
            .find(|rule| rule.from == from && rule.to == to)
            .map(|rule| rule.value)
            .unwrap_or(self.latency)
    }

    fn text_failure(&self, op: FakeOp, text: &str) -> Option<ProviderError> {
        self.op_failures
            .get(&op)
            .or_else(|| self.text_failures.get(&(op, text.to_lowercase())))
            .cloned()
    }

    fn leg_failure(
        &self,
        op: FakeOp,
        from: Coordinate,
        to: Coordinate,
        mode: TransportMode,
    ) -> Option<ProviderError> {
        if let Some(error) = self.op_failures.get(&op) {
            return Some(error.clone());
        }
        if self.unroutable_modes.contains(&mode) {
            return Some(ProviderError::NoRoute);
        }
        self.leg_failures
            .iter()
            .find(|rule| rule.value.0 == op && rule.from == from && rule.to == to)
            .map(|rule| rule.value.1.clone())
    }

    fn matching(&self, text: &str) -> Vec<&FakePlace> {
        self.places.iter().filter(|p| p.matches(text)).collect()
    }

    fn best_match(&self, text: &str) -> Option<&FakePlace> {
        let needle = text.trim().to_lowercase();
        self.places
            .iter()
            .find(|p| p.name.to_lowercase() == needle)
            .or_else(|| self.places.iter().find(|p| p.matches(text)))
    }
}

impl GeoProvider for FakeProvider {
    fn name(&self) -> &str {
        "Fake"
    }

    fn search<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<PlaceCandidate>, ProviderError>> {
        self.record(FakeOp::Search);
        let latency = self.text_latency(text);
        Box::pin(async move {
            tokio::time::sleep(latency).await;
            if let Some(error) = self.text_failure(FakeOp::Search, text) {
                return Err(error);
            }
            Ok(self.matching(text).into_iter().map(FakePlace::candidate).collect())
        })
    }

    fn search_places<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<MapItem>, ProviderError>> {
        self.record(FakeOp::SearchPlaces);
        let latency = self.text_latency(text);
        Box::pin(async move {
            tokio::time::sleep(latency).await;
            if let Some(error) = self.text_failure(FakeOp::SearchPlaces, text) {
                return Err(error);
            }
            Ok(self.matching(text).into_iter().map(FakePlace::map_item).collect())
        })
    }

    fn geocode<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Placemark, ProviderError>> {
        self.record(FakeOp::Geocode);
        let latency = self.text_latency(text);
        Box::pin(async move {
            tokio::time::sleep(latency).await;
            if let Some(error) = self.text_failure(FakeOp::Geocode, text) {
                return Err(error);
            }
            self.best_match(text)
                .map(FakePlace::placemark)
                .ok_or(ProviderError::NotFound)
        })
    }

    fn reverse_geocode(&self, coordinate: Coordinate) -> BoxFuture<'_, Result<Placemark, ProviderError>> {
        self.record(FakeOp::ReverseGeocode);
        let latency = self.latency;
        Box::pin(async move {
            tokio::time::sleep(latency).await;
            if let Some(error) = self.op_failures.get(&FakeOp::ReverseGeocode) {
                return Err(error.clone());
            }
            self.places
                .iter()
                .map(|p| (p, p.coordinate.distance_to(&coordinate)))
                .filter(|(_, d)| *d <= REVERSE_GEOCODE_RADIUS_M)
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(p, _)| p.placemark())
                .ok_or(ProviderError::NotFound)
        })
    }

    fn route(
        &self,
        from: Coordinate,
        to: Coordinate,
        mode: TransportMode,
    ) -> BoxFuture<'_, Result<RouteLeg, ProviderError>> {
        self.record(FakeOp::Route);
        let latency = self.leg_latency(from, to);
        Box::pin(async move {
            tokio::time::sleep(latency).await;
            if let Some(error) = self.leg_failure(FakeOp::Route, from, to, mode) {
                return Err(error);
            }
            Ok(Self::synthesize_leg(from, to, mode))
        })
    }

    fn eta(
        &self,
        from: Coordinate,
        to: Coordinate,
        mode: TransportMode,
    ) -> BoxFuture<'_, Result<Duration, ProviderError>> {
        self.record(FakeOp::Eta);
        let latency = self.leg_latency(from, to);
        Box::pin(async move {
            tokio::time::sleep(latency).await;
            if let Some(error) = self.leg_failure(FakeOp::Eta, from, to, mode) {
                return Err(error);
            }
            Ok(Self::synthesize_leg(from, to, mode).duration)
        })
    }

    fn nearby<'a>(
        &'a self,
        center: Coordinate,
        radius_m: f64,
        categories: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<MapItem>, ProviderError>> {
        self.record(FakeOp::Nearby);
        let latency = self.latency;
        Box::pin(async move {
            tokio::time::sleep(latency).await;
            if let Some(error) = self.op_failures.get(&FakeOp::Nearby) {
                return Err(error.clone());
            }
            let mut found: Vec<(&FakePlace, f64)> = self
                .places
                .iter()
                .filter(|p| {
                    categories.is_empty()
                        || p.category
                            .as_ref()
                            .is_some_and(|c| categories.iter().any(|want| want.eq_ignore_ascii_case(c)))
                })
                .map(|p| (p, p.coordinate.distance_to(&center)))
                .filter(|(_, d)| *d <= radius_m)
                .collect();
            found.sort_by(|a, b| a.1.total_cmp(&b.1));
            Ok(found.into_iter().map(|(p, _)| p.map_item()).collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMES_SQUARE: Coordinate = Coordinate::new(40.7580, -73.9855);

    #[tokio::test]
    async fn test_search_matches_substring() {
        let fake = FakeProvider::with_gazetteer();
        let results = fake.search("coffee").await.unwrap();
        let titles: Vec<_> = results.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Blue Bottle Coffee", "Joe Coffee"]);
        assert_eq!(fake.calls(FakeOp::Search), 1);
    }

    #[tokio::test]
    async fn test_geocode_prefers_exact_match() {
        let fake = FakeProvider::with_gazetteer();
        let placemark = fake.geocode("joe coffee").await.unwrap();
        assert_eq!(placemark.name, "Joe Coffee");
    }

    #[tokio::test]
    async fn test_geocode_unknown_is_not_found() {
        let fake = FakeProvider::with_gazetteer();
        assert_eq!(fake.geocode("nowhere").await, Err(ProviderError::NotFound));
    }

    #[tokio::test]
    async fn test_reverse_geocode_snaps_to_nearest() {
        let fake = FakeProvider::with_gazetteer();
        let placemark = fake
            .reverse_geocode(Coordinate::new(40.7585, -73.9850))
            .await
            .unwrap();
        assert_eq!(placemark.name, "Times Square");

        let far = fake.reverse_geocode(Coordinate::new(0.0, 0.0)).await;
        assert_eq!(far, Err(ProviderError::NotFound));
    }

    #[tokio::test]
    async fn test_route_is_synthesized() {
        let fake = FakeProvider::new();
        let to = Coordinate::new(40.7829, -73.9654);
        let leg = fake
            .route(TIMES_SQUARE, to, TransportMode::Walking)
            .await
            .unwrap();
        assert_eq!(leg.source, TIMES_SQUARE);
        assert_eq!(leg.destination, to);
        assert_eq!(leg.mode, TransportMode::Walking);
        assert!(leg.duration > Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_leg_failure_injection() {
        let to = Coordinate::new(40.7829, -73.9654);
        let fake = FakeProvider::new().failing_leg(FakeOp::Route, TIMES_SQUARE, to, ProviderError::NoRoute);

        let result = fake.route(TIMES_SQUARE, to, TransportMode::Automobile).await;
        assert_eq!(result, Err(ProviderError::NoRoute));

        // Reverse direction and eta are unaffected
        assert!(fake.route(to, TIMES_SQUARE, TransportMode::Automobile).await.is_ok());
        assert!(fake.eta(TIMES_SQUARE, to, TransportMode::Automobile).await.is_ok());
    }

    #[tokio::test]
    async fn test_unroutable_mode() {
        let fake = FakeProvider::new().without_mode(TransportMode::Transit);
        let to = Coordinate::new(40.7829, -73.9654);
        assert_eq!(
            fake.eta(TIMES_SQUARE, to, TransportMode::Transit).await,
            Err(ProviderError::NoRoute)
        );
    }

    #[tokio::test]
    async fn test_nearby_filters_by_category_and_radius() {
        let fake = FakeProvider::with_gazetteer();
        let categories = vec!["cafe".to_string()];
        let items = fake.nearby(TIMES_SQUARE, 2_000.0, &categories).await.unwrap();
        let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Blue Bottle Coffee"]);

        let any = fake.nearby(TIMES_SQUARE, 100.0, &[]).await.unwrap();
        assert_eq!(any.len(), 1);
        assert_eq!(any[0].name, "Times Square");
    }

    #[tokio::test(start_paused = true)]
    async fn test_text_latency_override() {
        let fake = FakeProvider::with_gazetteer()
            .with_latency(Duration::from_millis(10))
            .with_text_latency("Central", Duration::from_secs(5));

        let start = tokio::time::Instant::now();
        fake.search("central").await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(5));
    }
}
