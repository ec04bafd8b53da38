//! Shared test infrastructure for integration tests.
//!
//! `TestWorld` scripts every collaborator from in-memory tables and counts
//! the calls each one receives, so tests can assert both the itinerary and
//! which stages ran.

use anyhow::{anyhow, Result};
use daytrip::model::{GeoCoordinate, PointOfInterest, Route, RouteLeg, WeatherObservation};
use daytrip::providers::{
    GeocodingService, LanguageService, PoiQuery, PoiService, RoutingService, WeatherService,
};
use daytrip::Planner;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Scripted responses for one planner run.
#[derive(Default)]
pub struct TestWorld {
    pub lm_reply: Option<String>,
    pub pois: HashMap<String, PointOfInterest>,
    pub poi_failures: Vec<String>,
    pub coordinates: HashMap<String, GeoCoordinate>,
    pub geocode_failures: Vec<String>,
    pub weather: HashMap<String, i64>,
    pub route: Option<Route>,
    pub route_failure: bool,
    pub calls: Calls,
}

/// Per-collaborator call counters.
#[derive(Default)]
pub struct Calls {
    pub lm: AtomicUsize,
    pub poi: AtomicUsize,
    pub geocode: AtomicUsize,
    pub weather: AtomicUsize,
    pub route: AtomicUsize,
}

impl Calls {
    pub fn lm(&self) -> usize {
        self.lm.load(Ordering::SeqCst)
    }

    /// Calls to any provider other than the language service.
    pub fn lookups(&self) -> usize {
        self.poi.load(Ordering::SeqCst)
            + self.geocode.load(Ordering::SeqCst)
            + self.weather.load(Ordering::SeqCst)
            + self.route.load(Ordering::SeqCst)
    }

    pub fn route(&self) -> usize {
        self.route.load(Ordering::SeqCst)
    }
}

impl TestWorld {
    pub fn with_reply(reply: &str) -> Self {
        Self {
            lm_reply: Some(reply.to_string()),
            ..Self::default()
        }
    }

    /// The Lisbon castle + aquarium scenario with every lookup succeeding.
    pub fn lisbon() -> Self {
        let mut world = Self::with_reply(
            r#"{"city": "Lisbon", "destinations": ["Castle", "Aquarium"], "endTime": "18:00"}"#,
        );
        world.poi("Castle", "Castelo de S. Jorge", Some("Rua de Santa Cruz do Castelo"));
        world.poi("Aquarium", "Oceanário de Lisboa", Some("Esplanada Dom Carlos I"));
        world.locate("Castelo de S. Jorge, Lisbon", 38.7139, -9.1334);
        world.locate("Oceanário de Lisboa, Lisbon", 38.7635, -9.0937);
        world.weather.insert("38.7139,-9.1334".to_string(), 1);
        world.weather.insert("38.7635,-9.0937".to_string(), 3);
        world.route = Some(route(&[600.0, 900.0], 5000.0));
        world
    }

    pub fn poi(&mut self, name: &str, display_name: &str, address: Option<&str>) {
        self.pois.insert(
            name.to_string(),
            PointOfInterest {
                display_name: display_name.to_string(),
                address: address.map(str::to_string),
            },
        );
    }

    pub fn locate(&mut self, query: &str, lat: f64, lng: f64) {
        self.coordinates
            .insert(query.to_string(), GeoCoordinate::new(lat, lng));
    }

    /// Build a planner whose collaborators all read from this world.
    pub fn planner(self) -> (Planner, Arc<TestWorld>) {
        let world = Arc::new(self);
        let planner = Planner::new(
            Box::new(Fake(world.clone())),
            Box::new(Fake(world.clone())),
            Box::new(Fake(world.clone())),
            Box::new(Fake(world.clone())),
            Box::new(Fake(world.clone())),
        );
        (planner, world)
    }
}

pub fn route(durations: &[f64], distance: f64) -> Route {
    Route {
        legs: durations
            .iter()
            .map(|&duration_seconds| RouteLeg { duration_seconds })
            .collect(),
        total_distance_meters: distance,
    }
}

struct Fake(Arc<TestWorld>);

impl LanguageService for Fake {
    fn complete(&self, _system: &str, _prompt: &str) -> Result<String> {
        self.0.calls.lm.fetch_add(1, Ordering::SeqCst);
        self.0
            .lm_reply
            .clone()
            .ok_or_else(|| anyhow!("language service unavailable"))
    }
}

impl PoiService for Fake {
    fn search(&self, query: &PoiQuery<'_>) -> Result<Vec<PointOfInterest>> {
        self.0.calls.poi.fetch_add(1, Ordering::SeqCst);
        if self.0.poi_failures.iter().any(|name| name == query.name) {
            return Err(anyhow!("overpass returned 504"));
        }
        Ok(self.0.pois.get(query.name).cloned().into_iter().collect())
    }
}

impl GeocodingService for Fake {
    fn geocode(&self, query: &str) -> Result<Vec<GeoCoordinate>> {
        self.0.calls.geocode.fetch_add(1, Ordering::SeqCst);
        if self.0.geocode_failures.iter().any(|failing| failing == query) {
            return Err(anyhow!("nominatim rate limited"));
        }
        Ok(self.0.coordinates.get(query).copied().into_iter().collect())
    }
}

impl WeatherService for Fake {
    fn current(&self, at: GeoCoordinate) -> Result<Option<WeatherObservation>> {
        self.0.calls.weather.fetch_add(1, Ordering::SeqCst);
        let key = format!("{},{}", at.latitude, at.longitude);
        Ok(self
            .0
            .weather
            .get(&key)
            .copied()
            .map(WeatherObservation::from_code))
    }
}

impl RoutingService for Fake {
    fn route(&self, _waypoints: &[GeoCoordinate]) -> Result<Vec<Route>> {
        self.0.calls.route.fetch_add(1, Ordering::SeqCst);
        if self.0.route_failure {
            return Err(anyhow!("osrm unreachable"));
        }
        Ok(self.0.route.clone().into_iter().collect())
    }
}
