//! Destination enrichment.
//!
//! Each destination name is resolved in its own scoped worker thread: POI,
//! then geocode (needs the POI name), then weather (needs the coordinate).
//! Workers share nothing mutable beyond their own stage marker, which the
//! caller reads only after the join. Handles are joined in spawn order, so the
//! output is index-aligned with the input no matter which worker finishes
//! first.
//!
//! Nothing in here returns an error. A failed or empty lookup degrades only
//! the field it was meant to fill and is recorded as a [`Degradation`]; a
//! worker that panics degrades its whole destination to
//! [`EnrichedDestination::fallback`], recorded against the stage it was in.

use crate::model::{
    EnrichedDestination, GeoCoordinate, PointOfInterest, WeatherObservation, UNKNOWN,
};
use crate::providers::{GeocodingService, PoiQuery, PoiService, WeatherService};
use crate::report::{Degradation, Stage};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::thread;
use std::time::Instant;

/// The three lookup collaborators plus the POI search radius.
#[derive(Clone, Copy)]
pub struct Lookups<'a> {
    pub poi: &'a dyn PoiService,
    pub geocoder: &'a dyn GeocodingService,
    pub weather: &'a dyn WeatherService,
    pub radius_meters: u32,
}

/// Enriched destinations in input order plus every degradation recorded.
#[derive(Debug, Clone, Default)]
pub struct Enrichment {
    pub destinations: Vec<EnrichedDestination>,
    pub degradations: Vec<Degradation>,
}

#[derive(Debug)]
struct DestinationOutcome {
    destination: EnrichedDestination,
    degradations: Vec<Degradation>,
}

impl DestinationOutcome {
    fn panicked(name: &str, stage: Stage, payload: Box<dyn Any + Send>) -> Self {
        Self {
            destination: EnrichedDestination::fallback(name),
            degradations: vec![Degradation::lookup(
                name,
                stage,
                format!("enrichment worker panicked: {}", panic_message(&*payload)),
            )],
        }
    }
}

/// The lookup a destination's worker is currently in.
struct StageMarker(AtomicU8);

impl StageMarker {
    fn new() -> Self {
        Self(AtomicU8::new(Self::encode(Stage::Poi)))
    }

    fn enter(&self, stage: Stage) {
        self.0.store(Self::encode(stage), Ordering::Release);
    }

    fn current(&self) -> Stage {
        match self.0.load(Ordering::Acquire) {
            0 => Stage::Poi,
            1 => Stage::Geocode,
            2 => Stage::Weather,
            _ => Stage::Routing,
        }
    }

    fn encode(stage: Stage) -> u8 {
        match stage {
            Stage::Poi => 0,
            Stage::Geocode => 1,
            Stage::Weather => 2,
            Stage::Routing => 3,
        }
    }
}

enum Unit<'scope> {
    Spawned(thread::ScopedJoinHandle<'scope, DestinationOutcome>),
    Inline(DestinationOutcome),
}

/// Enrich every name concurrently. Always returns one destination per name.
pub fn enrich_destinations(lookups: Lookups<'_>, names: &[String], city: &str) -> Enrichment {
    let start = Instant::now();
    let markers: Vec<StageMarker> = names.iter().map(|_| StageMarker::new()).collect();
    let outcomes: Vec<DestinationOutcome> = thread::scope(|scope| {
        let units: Vec<Unit<'_>> = names
            .iter()
            .zip(&markers)
            .enumerate()
            .map(|(index, (name, marker))| {
                let spawned = thread::Builder::new()
                    .name(format!("enrich-{index}"))
                    .spawn_scoped(scope, move || enrich_one(lookups, name, city, marker));
                match spawned {
                    Ok(handle) => Unit::Spawned(handle),
                    Err(err) => {
                        tracing::warn!(index, error = %err, "spawn failed; enriching inline");
                        Unit::Inline(enrich_inline(lookups, name, city, marker))
                    }
                }
            })
            .collect();

        units
            .into_iter()
            .zip(names.iter().zip(&markers))
            .map(|(unit, (name, marker))| match unit {
                Unit::Spawned(handle) => handle.join().unwrap_or_else(|payload| {
                    DestinationOutcome::panicked(name, marker.current(), payload)
                }),
                Unit::Inline(outcome) => outcome,
            })
            .collect()
    });

    let mut enrichment = Enrichment {
        destinations: Vec::with_capacity(outcomes.len()),
        degradations: Vec::new(),
    };
    for outcome in outcomes {
        enrichment.destinations.push(outcome.destination);
        enrichment.degradations.extend(outcome.degradations);
    }
    tracing::info!(
        elapsed_ms = start.elapsed().as_millis(),
        destinations = enrichment.destinations.len(),
        degraded = enrichment.degradations.len(),
        "enrichment complete"
    );
    enrichment
}

/// Enrich on the calling thread, catching a panic the way a join would.
fn enrich_inline(
    lookups: Lookups<'_>,
    name: &str,
    city: &str,
    marker: &StageMarker,
) -> DestinationOutcome {
    panic::catch_unwind(AssertUnwindSafe(|| enrich_one(lookups, name, city, marker)))
        .unwrap_or_else(|payload| DestinationOutcome::panicked(name, marker.current(), payload))
}

fn enrich_one(
    lookups: Lookups<'_>,
    name: &str,
    city: &str,
    marker: &StageMarker,
) -> DestinationOutcome {
    let mut degradations = Vec::new();

    marker.enter(Stage::Poi);
    let poi = resolve_poi(lookups, name, city, &mut degradations);
    marker.enter(Stage::Geocode);
    let coordinate = resolve_coordinate(lookups, name, &poi, city, &mut degradations);
    let weather = match coordinate {
        Some(at) => {
            marker.enter(Stage::Weather);
            resolve_weather(lookups, name, at, &mut degradations)
        }
        None => WeatherObservation::Unknown,
    };

    tracing::debug!(
        destination = name,
        resolved = %poi.display_name,
        located = coordinate.is_some(),
        weather = %weather,
        "destination enriched"
    );

    DestinationOutcome {
        destination: EnrichedDestination {
            name: poi.display_name,
            address: poi.address.unwrap_or_else(|| UNKNOWN.to_string()),
            coordinate,
            weather,
        },
        degradations,
    }
}

fn resolve_poi(
    lookups: Lookups<'_>,
    name: &str,
    city: &str,
    degradations: &mut Vec<Degradation>,
) -> PointOfInterest {
    let query = PoiQuery {
        name,
        city,
        radius_meters: lookups.radius_meters,
    };
    let poi = match lookups.poi.search(&query) {
        Ok(pois) => match pois.into_iter().next() {
            Some(poi) => poi,
            None => {
                degradations.push(Degradation::lookup(name, Stage::Poi, "no matching POI"));
                PointOfInterest::placeholder(name)
            }
        },
        Err(err) => {
            degradations.push(Degradation::lookup(name, Stage::Poi, format!("{err:#}")));
            PointOfInterest::placeholder(name)
        }
    };
    if poi.display_name.trim().is_empty() {
        return PointOfInterest {
            display_name: name.to_string(),
            address: poi.address,
        };
    }
    poi
}

fn resolve_coordinate(
    lookups: Lookups<'_>,
    name: &str,
    poi: &PointOfInterest,
    city: &str,
    degradations: &mut Vec<Degradation>,
) -> Option<GeoCoordinate> {
    let query = format!("{}, {}", poi.display_name, city);
    match lookups.geocoder.geocode(&query) {
        Ok(coordinates) => {
            let first = coordinates.into_iter().next();
            if first.is_none() {
                degradations.push(Degradation::lookup(
                    name,
                    Stage::Geocode,
                    format!("no results for {query:?}"),
                ));
            }
            first
        }
        Err(err) => {
            degradations.push(Degradation::lookup(name, Stage::Geocode, format!("{err:#}")));
            None
        }
    }
}

fn resolve_weather(
    lookups: Lookups<'_>,
    name: &str,
    at: GeoCoordinate,
    degradations: &mut Vec<Degradation>,
) -> WeatherObservation {
    match lookups.weather.current(at) {
        Ok(Some(observation)) => observation,
        Ok(None) => {
            degradations.push(Degradation::lookup(
                name,
                Stage::Weather,
                "no current weather reported",
            ));
            WeatherObservation::Unknown
        }
        Err(err) => {
            degradations.push(Degradation::lookup(name, Stage::Weather, format!("{err:#}")));
            WeatherObservation::Unknown
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "unknown panic".to_string()
}

#[cfg(test)]
#[path = "enrich_tests.rs"]
mod tests;
