//! External collaborators.
//!
//! The pipeline only sees these traits. Each method is one outbound call and
//! returns `Ok(None)` or an empty list when the provider answered but had
//! nothing usable; transport, status and decoding problems are `Err`. The
//! pipeline treats both the same way, but the distinction shows up in the
//! recorded degradation cause.
//!
//! Concrete implementations live in [`http`] (OpenStreetMap-ecosystem
//! services and chat-completions LMs) and [`lm`] (a local LM command).

pub mod http;
pub mod lm;

use crate::model::{GeoCoordinate, PointOfInterest, Route, WeatherObservation};
use anyhow::Result;

pub use http::{
    ChatLanguageService, NominatimGeocoder, OpenMeteoWeather, OsrmRouter, OverpassPoiService,
};
pub use lm::CommandLanguageService;

/// Turns an instruction plus user prompt into a text reply.
pub trait LanguageService: Send + Sync {
    fn complete(&self, system: &str, prompt: &str) -> Result<String>;
}

/// Parameters for a fuzzy POI search around a city.
#[derive(Debug, Clone, PartialEq)]
pub struct PoiQuery<'a> {
    pub name: &'a str,
    pub city: &'a str,
    pub radius_meters: u32,
}

pub trait PoiService: Send + Sync {
    fn search(&self, query: &PoiQuery<'_>) -> Result<Vec<PointOfInterest>>;
}

pub trait GeocodingService: Send + Sync {
    /// Free-text search; results in provider relevance order.
    fn geocode(&self, query: &str) -> Result<Vec<GeoCoordinate>>;
}

pub trait WeatherService: Send + Sync {
    fn current(&self, at: GeoCoordinate) -> Result<Option<WeatherObservation>>;
}

pub trait RoutingService: Send + Sync {
    /// Route alternatives through `waypoints` in order, best first.
    fn route(&self, waypoints: &[GeoCoordinate]) -> Result<Vec<Route>>;
}
