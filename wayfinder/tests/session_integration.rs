//! Integration tests for the Session.
//!
//! These drive a full session daemon against the in-memory provider:
//! - Keystrokes → completer → published candidates
//! - Candidate selection → highlights
//! - Estimates, identify, nearby
//! - Panel gestures and search cancel
//!
//! Run with: `cargo test --test session_integration`

use std::sync::Arc;
use std::time::Duration;

use wayfinder::coord::{Coordinate, Region, NEW_YORK_CITY};
use wayfinder::location::{FixedLocation, LocationError, LocationSource, NoLocation};
use wayfinder::panel::{PanelConfig, PanelState};
use wayfinder::provider::{BoxFuture, FakeOp, FakeProvider, PlaceCandidate, ProviderError};
use wayfinder::query::QueryError;
use wayfinder::session::{Session, SessionConfig};

// ============================================================================
// Helper Functions
// ============================================================================

const PANEL_HEIGHT: f64 = 1000.0;

const CENTRAL_PARK: Coordinate = Coordinate::new(40.7829, -73.9654);
const JOE_COFFEE: Coordinate = Coordinate::new(40.7736, -73.9566);

fn config() -> SessionConfig {
    SessionConfig::default().with_panel(PanelConfig::default().with_height(PANEL_HEIGHT))
}

fn start(fake: FakeProvider) -> (Session, Arc<FakeProvider>) {
    let fake = Arc::new(fake);
    let session = Session::start(config(), fake.clone(), Arc::new(NoLocation::default()))
        .expect("session starts");
    (session, fake)
}

/// A location service that never answers, like an unanswered permission prompt.
struct StalledLocation;

impl LocationSource for StalledLocation {
    fn current_location(&self) -> BoxFuture<'_, Result<Coordinate, LocationError>> {
        Box::pin(std::future::pending())
    }
}

/// Answers with `fix` after `delay`.
struct DelayedLocation {
    fix: Coordinate,
    delay: Duration,
}

impl LocationSource for DelayedLocation {
    fn current_location(&self) -> BoxFuture<'_, Result<Coordinate, LocationError>> {
        Box::pin(async move {
            tokio::time::sleep(self.delay).await;
            Ok(self.fix)
        })
    }
}

fn titles(candidates: &[PlaceCandidate]) -> Vec<String> {
    candidates.iter().map(|c| c.title.clone()).collect()
}

// ============================================================================
// Completion
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_last_keystroke_wins_despite_slower_earlier_queries() {
    let (session, fake) = start(
        FakeProvider::with_gazetteer()
            .with_text_latency("b", Duration::from_millis(900))
            .with_text_latency("bo", Duration::from_millis(600))
            .with_text_latency("bos", Duration::from_millis(300))
            .with_text_latency("bost", Duration::from_millis(20)),
    );

    for text in ["b", "bo", "bos", "bost"] {
        session.text_changed(text).await.unwrap();
    }

    let snapshot = session.settle().await.unwrap();
    assert_eq!(snapshot.search_text, "bost");
    assert_eq!(titles(&snapshot.candidates), vec!["Boston Common"]);

    // The superseded searches land later and must not overwrite anything
    tokio::time::sleep(Duration::from_secs(2)).await;
    let snapshot = session.settle().await.unwrap();
    assert_eq!(titles(&snapshot.candidates), vec!["Boston Common"]);
    assert_eq!(fake.calls(FakeOp::Search), 4);
}

#[tokio::test]
async fn test_empty_text_publishes_empty_list_without_provider_call() {
    let (session, fake) = start(FakeProvider::with_gazetteer());

    session.text_changed("").await.unwrap();
    let snapshot = session.settle().await.unwrap();

    assert!(snapshot.candidates.is_empty());
    assert_eq!(fake.total_calls(), 0);
}

#[tokio::test]
async fn test_clearing_text_drops_previous_candidates() {
    let (session, _) = start(FakeProvider::with_gazetteer());

    session.text_changed("coffee").await.unwrap();
    let snapshot = session.settle().await.unwrap();
    assert_eq!(snapshot.candidates.len(), 2);

    session.text_changed("").await.unwrap();
    let snapshot = session.settle().await.unwrap();
    assert!(snapshot.candidates.is_empty());
    assert_eq!(snapshot.search_text, "");
}

#[tokio::test]
async fn test_search_failure_degrades_to_empty_candidates() {
    let (session, _) = start(
        FakeProvider::with_gazetteer()
            .failing(FakeOp::Search, ProviderError::Unavailable("offline".into())),
    );

    session.text_changed("park").await.unwrap();
    let snapshot = session.settle().await.unwrap();

    assert!(snapshot.candidates.is_empty());
    assert_eq!(
        snapshot.last_error,
        Some(QueryError::ProviderUnavailable("offline".into()))
    );
}

// ============================================================================
// Selection
// ============================================================================

#[tokio::test]
async fn test_selection_highlights_every_item_and_frames_the_last() {
    let (session, _) = start(FakeProvider::with_gazetteer());

    session
        .search_selected(PlaceCandidate::new("Coffee", "", "coffee"))
        .await
        .unwrap();
    let snapshot = session.settle().await.unwrap();

    assert_eq!(snapshot.map_items.len(), 2);
    assert_eq!(snapshot.highlights.len(), 2);
    assert!(snapshot.highlights.iter().all(|h| h.radius_m == 500.0));

    let highlighted = snapshot.highlighted_region.expect("highlighted region");
    assert_eq!(highlighted.center(), JOE_COFFEE);
    assert_eq!(
        highlighted,
        Region::from_meters(JOE_COFFEE, 100.0, 100.0).unwrap()
    );
    assert_eq!(snapshot.focus_region(), highlighted);
}

#[tokio::test]
async fn test_selection_of_typed_candidate() {
    let (session, _) = start(FakeProvider::with_gazetteer());

    session.text_changed("central").await.unwrap();
    let snapshot = session.settle().await.unwrap();
    let candidate = snapshot.candidates[0].clone();
    assert_eq!(candidate.title, "Central Park");

    session.search_selected(candidate).await.unwrap();
    let snapshot = session.settle().await.unwrap();
    assert_eq!(snapshot.highlights.len(), 1);
    assert_eq!(snapshot.highlights[0].center, CENTRAL_PARK);
}

#[tokio::test]
async fn test_failed_selection_clears_highlights() {
    let (session, _) = start(FakeProvider::with_gazetteer().failing_text(
        FakeOp::SearchPlaces,
        "nowhere",
        ProviderError::NotFound,
    ));

    session
        .search_selected(PlaceCandidate::new("Central Park", "", "Central Park"))
        .await
        .unwrap();
    assert_eq!(session.settle().await.unwrap().highlights.len(), 1);

    session
        .search_selected(PlaceCandidate::new("Nowhere", "", "nowhere"))
        .await
        .unwrap();
    let snapshot = session.settle().await.unwrap();
    assert!(snapshot.highlights.is_empty());
    assert_eq!(snapshot.highlighted_region, None);
    assert_eq!(snapshot.last_error, Some(QueryError::NotFound));
}

// ============================================================================
// Estimates, identify, nearby
// ============================================================================

#[tokio::test]
async fn test_estimate_short_circuits_on_unknown_address() {
    let (session, fake) = start(FakeProvider::with_gazetteer());

    let text = session.estimate_travel("nowhere").await.unwrap();

    assert_eq!(text, "Not available");
    assert_eq!(fake.calls(FakeOp::Geocode), 1);
    assert_eq!(fake.calls(FakeOp::Eta), 0);
}

#[tokio::test]
async fn test_estimate_uses_region_center() {
    let (session, _) = start(FakeProvider::with_gazetteer());

    let text = session.estimate_travel("Times Square").await.unwrap();

    let expected = FakeProvider::synthesize_leg(
        NEW_YORK_CITY,
        Coordinate::new(40.7580, -73.9855),
        wayfinder::TransportMode::Automobile,
    )
    .duration;
    assert_eq!(text, wayfinder::estimator::format_duration(expected));
    assert_eq!(session.settle().await.unwrap().last_estimate, Some(text));
}

#[tokio::test(start_paused = true)]
async fn test_superseded_estimate_still_answers_its_caller() {
    let (session, _) = start(
        FakeProvider::with_gazetteer()
            .with_text_latency("central park", Duration::from_millis(500))
            .with_text_latency("nowhere", Duration::from_millis(10)),
    );
    let session = Arc::new(session);

    let slow = {
        let session = session.clone();
        tokio::spawn(async move { session.estimate_travel("central park").await })
    };
    tokio::time::sleep(Duration::from_millis(1)).await;
    let fast = session.estimate_travel("nowhere").await.unwrap();
    let slow = slow.await.unwrap().unwrap();

    assert_eq!(fast, "Not available");
    assert_ne!(slow, "Not available");
    // Only the newest request publishes
    let snapshot = session.settle().await.unwrap();
    assert_eq!(snapshot.last_estimate.as_deref(), Some("Not available"));
}

#[tokio::test]
async fn test_nearby_searches_around_current_region() {
    let (session, _) = start(FakeProvider::with_gazetteer());

    session
        .region_changed(Region::from_meters(CENTRAL_PARK, 2000.0, 2000.0).unwrap())
        .await
        .unwrap();
    session.nearby(vec!["cafe".to_string()]).await.unwrap();
    let snapshot = session.settle().await.unwrap();

    let names: Vec<_> = snapshot.nearby.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["Joe Coffee"]);
}

#[tokio::test]
async fn test_identify_far_from_everything() {
    let (session, _) = start(FakeProvider::with_gazetteer());

    session.identify(Coordinate::new(0.0, 0.0)).await.unwrap();
    let snapshot = session.settle().await.unwrap();

    assert_eq!(snapshot.placemark, None);
    assert_eq!(snapshot.last_error, Some(QueryError::NotFound));
}

// ============================================================================
// Location
// ============================================================================

#[tokio::test]
async fn test_location_fix_replaces_default_region() {
    let fix = Coordinate::new(42.355, -71.0656);
    let session = Session::start(
        config(),
        Arc::new(FakeProvider::new()),
        Arc::new(FixedLocation(fix)),
    )
    .unwrap();

    let snapshot = session.settle().await.unwrap();
    assert_eq!(snapshot.region, Region::from_meters(fix, 1000.0, 1000.0).unwrap());
    assert_eq!(snapshot.device_location, Some(fix));
}

#[tokio::test]
async fn test_location_failure_keeps_default_region() {
    let session = Session::start(
        config(),
        Arc::new(FakeProvider::new()),
        Arc::new(NoLocation(LocationError::PermissionDenied)),
    )
    .unwrap();

    let snapshot = session.settle().await.unwrap();
    assert_eq!(snapshot.region.center(), NEW_YORK_CITY);
    assert_eq!(snapshot.device_location, None);
}

#[tokio::test(start_paused = true)]
async fn test_stalled_location_source_times_out() {
    let session = Session::start(
        config().with_location_timeout(Duration::from_secs(5)),
        Arc::new(FakeProvider::with_gazetteer()),
        Arc::new(StalledLocation),
    )
    .unwrap();

    session.text_changed("park").await.unwrap();
    let snapshot = tokio::time::timeout(Duration::from_secs(3600), session.settle())
        .await
        .expect("settle returns once the location request times out")
        .unwrap();

    assert_eq!(snapshot.pending_queries, 0);
    assert_eq!(snapshot.device_location, None);
    assert_eq!(snapshot.region.center(), NEW_YORK_CITY);
}

#[tokio::test(start_paused = true)]
async fn test_late_fix_keeps_region_chosen_by_user() {
    let fix = Coordinate::new(42.355, -71.0656);
    let session = Session::start(
        config(),
        Arc::new(FakeProvider::new()),
        Arc::new(DelayedLocation {
            fix,
            delay: Duration::from_millis(500),
        }),
    )
    .unwrap();

    let paris = Region::from_meters(Coordinate::new(48.8566, 2.3522), 2000.0, 2000.0).unwrap();
    session.region_changed(paris).await.unwrap();

    let snapshot = session.settle().await.unwrap();
    assert_eq!(snapshot.region, paris);
    assert_eq!(snapshot.device_location, Some(fix));
}

// ============================================================================
// Panel
// ============================================================================

#[tokio::test]
async fn test_panel_hysteresis() {
    let (session, _) = start(FakeProvider::new());

    // Low → Mid with a long upward swipe
    session.drag_ended(-0.4 * PANEL_HEIGHT).await.unwrap();
    assert_eq!(session.settle().await.unwrap().panel, PanelState::Mid);

    // Small nudge springs back
    session.drag_ended(0.05 * PANEL_HEIGHT).await.unwrap();
    assert_eq!(session.settle().await.unwrap().panel, PanelState::Mid);

    // Large downward swipe steps to Low
    session.drag_ended(0.35 * PANEL_HEIGHT).await.unwrap();
    assert_eq!(session.settle().await.unwrap().panel, PanelState::Low);

    // From High a medium swipe jumps straight to Low
    session.search_focus_changed(true).await.unwrap();
    assert_eq!(session.settle().await.unwrap().panel, PanelState::High);
    session.drag_ended(0.32 * PANEL_HEIGHT).await.unwrap();
    assert_eq!(session.settle().await.unwrap().panel, PanelState::Low);
}

#[tokio::test]
async fn test_drag_changes_offset_but_not_state() {
    let (session, _) = start(FakeProvider::new());

    session.drag_changed(-300.0).await.unwrap();
    let snapshot = session.settle().await.unwrap();
    assert_eq!(snapshot.panel, PanelState::Low);
    assert_eq!(snapshot.drag_offset, -300.0);
    assert!((snapshot.panel_offset - (0.81 * PANEL_HEIGHT - 300.0)).abs() < 1e-9);

    session.drag_ended(-100.0).await.unwrap();
    let snapshot = session.settle().await.unwrap();
    assert_eq!(snapshot.panel, PanelState::Low);
    assert_eq!(snapshot.drag_offset, 0.0);
}

#[tokio::test]
async fn test_search_cancel_is_idempotent() {
    let (session, _) = start(FakeProvider::with_gazetteer());

    session.search_focus_changed(true).await.unwrap();
    session.text_changed("park").await.unwrap();
    let snapshot = session.settle().await.unwrap();
    assert_eq!(snapshot.panel, PanelState::High);
    assert!(!snapshot.candidates.is_empty());

    session.search_cancelled().await.unwrap();
    let once = session.settle().await.unwrap();
    session.search_cancelled().await.unwrap();
    let twice = session.settle().await.unwrap();

    assert_eq!(once, twice);
    assert_eq!(twice.panel, PanelState::Low);
    assert_eq!(twice.search_text, "");
    assert!(twice.candidates.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_discards_in_flight_completion() {
    let (session, _) = start(
        FakeProvider::with_gazetteer().with_text_latency("park", Duration::from_millis(200)),
    );

    session.text_changed("park").await.unwrap();
    session.search_cancelled().await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    let snapshot = session.settle().await.unwrap();
    assert!(snapshot.candidates.is_empty());
}
