//! Place lookup commands: `complete`, `search`, `geocode`, `reverse`, `nearby`.

use std::sync::Arc;

use wayfinder::config::ConfigFile;
use wayfinder::coord::Coordinate;
use wayfinder::location::NoLocation;
use wayfinder::provider::{MapItem, PlaceCandidate, Placemark};
use wayfinder::session::{Session, SessionConfig};

use super::common::{query_client, resolve_provider};
use crate::error::CliError;

/// Type `text` one character at a time into a session and print the
/// candidates that survive.
pub async fn run_complete(text: &str, offline: bool, config: &ConfigFile) -> Result<(), CliError> {
    let provider = resolve_provider(offline, config)?;
    let session = Session::start(
        SessionConfig::from_config_file(config),
        provider,
        Arc::new(NoLocation::default()),
    )?;

    for (index, ch) in text.char_indices() {
        session.text_changed(&text[..index + ch.len_utf8()]).await?;
    }
    let snapshot = session.settle().await?;
    session.shutdown().await;

    print_candidates(&snapshot.candidates);
    if let Some(error) = snapshot.last_error {
        eprintln!("Search failed: {}", error);
    }
    Ok(())
}

/// One-shot autocomplete query.
pub async fn run_search(text: &str, offline: bool, config: &ConfigFile) -> Result<(), CliError> {
    let client = query_client(offline, config)?;
    let candidates = client.search(text).await?;
    print_candidates(&candidates);
    Ok(())
}

pub async fn run_geocode(address: &str, offline: bool, config: &ConfigFile) -> Result<(), CliError> {
    let client = query_client(offline, config)?;
    let placemark = client.geocode(address).await?;
    print_placemark(&placemark);
    Ok(())
}

pub async fn run_reverse(
    coordinate: Coordinate,
    offline: bool,
    config: &ConfigFile,
) -> Result<(), CliError> {
    let client = query_client(offline, config)?;
    let placemark = client.reverse_geocode(coordinate).await?;
    print_placemark(&placemark);
    Ok(())
}

pub async fn run_nearby(
    center: Option<Coordinate>,
    radius_m: Option<f64>,
    categories: Vec<String>,
    offline: bool,
    config: &ConfigFile,
) -> Result<(), CliError> {
    let client = query_client(offline, config)?;
    let center = center.unwrap_or_else(|| config.session.initial_center());
    let radius_m = radius_m.unwrap_or(config.session.nearby_radius_m);

    let items = client.nearby(center, radius_m, &categories).await?;
    if items.is_empty() {
        println!("Nothing within {:.0} m of {}", radius_m, center);
        return Ok(());
    }
    for item in &items {
        print_item(item, center);
    }
    Ok(())
}

fn print_candidates(candidates: &[PlaceCandidate]) {
    if candidates.is_empty() {
        println!("No matches");
        return;
    }
    for candidate in candidates {
        if candidate.subtitle.is_empty() {
            println!("{}", candidate.title);
        } else {
            println!("{}  ({})", candidate.title, candidate.subtitle);
        }
    }
}

fn print_placemark(placemark: &Placemark) {
    println!("{}", placemark.name);
    println!("  Location: {}", placemark.coordinate);
    if let Some(address) = &placemark.address {
        println!("  Address:  {}", address);
    }
}

fn print_item(item: &MapItem, center: Coordinate) {
    let distance = item.coordinate.distance_to(&center);
    let category = item.category.as_deref().unwrap_or("place");
    println!("{:>6.0} m  {}  [{}]", distance, item.name, category);
}
