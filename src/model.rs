//! Itinerary data model.
//!
//! Every fallback literal the pipeline emits is defined here once, so the
//! enricher, the assembler, and the renderers agree on what "degraded" looks
//! like.
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Placeholder for any field whose lookup failed.
pub const UNKNOWN: &str = "Unknown";
/// Timeline label for a leg with no following destination.
pub const RETURN_LABEL: &str = "Return";
/// Fixed dwell estimate per stop.
pub const DWELL_TIME: &str = "1 hour";
/// Distance label for a degenerate route.
pub const ZERO_DISTANCE: &str = "0";

/// Raw user input handed to the request interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TravelRequest {
    raw_text: String,
}

impl TravelRequest {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
        }
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn is_blank(&self) -> bool {
        self.raw_text.trim().is_empty()
    }
}

/// Structured intent extracted from a travel request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedIntent {
    pub city: String,
    pub destination_names: Vec<String>,
    pub end_time: String,
}

/// A point of interest resolved for one destination name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointOfInterest {
    pub display_name: String,
    pub address: Option<String>,
}

impl PointOfInterest {
    /// Placeholder used when the POI lookup yields nothing.
    pub fn placeholder(name: &str) -> Self {
        Self {
            display_name: name.to_string(),
            address: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lng")]
    pub longitude: f64,
}

impl GeoCoordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Render as the `lng,lat` pair routing services expect.
    pub fn lng_lat(&self) -> String {
        format!("{},{}", self.longitude, self.latitude)
    }
}

/// Current conditions as a WMO weather interpretation code.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WeatherObservation {
    Code(String),
    #[default]
    Unknown,
}

impl WeatherObservation {
    pub fn from_code(code: i64) -> Self {
        Self::Code(code.to_string())
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Self::Code(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Code(code) => code,
            Self::Unknown => UNKNOWN,
        }
    }

    /// Short human label for the WMO code, when the code is recognized.
    pub fn describe(&self) -> Option<&'static str> {
        let code: u32 = match self {
            Self::Code(code) => code.parse().ok()?,
            Self::Unknown => return None,
        };
        let label = match code {
            0 => "Clear sky",
            1 => "Mainly clear",
            2 => "Partly cloudy",
            3 => "Overcast",
            45 | 48 => "Fog",
            51 | 53 | 55 => "Drizzle",
            56 | 57 => "Freezing drizzle",
            61 | 63 | 65 => "Rain",
            66 | 67 => "Freezing rain",
            71 | 73 | 75 => "Snow",
            77 => "Snow grains",
            80..=82 => "Rain showers",
            85 | 86 => "Snow showers",
            95 => "Thunderstorm",
            96 | 99 => "Thunderstorm with hail",
            _ => return None,
        };
        Some(label)
    }
}

impl fmt::Display for WeatherObservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for WeatherObservation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One destination after POI, geocode and weather lookups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedDestination {
    pub name: String,
    pub address: String,
    #[serde(rename = "coordinates", skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<GeoCoordinate>,
    pub weather: WeatherObservation,
}

impl EnrichedDestination {
    /// The most degraded valid destination for a raw name.
    pub fn fallback(name: &str) -> Self {
        Self {
            name: name.to_string(),
            address: UNKNOWN.to_string(),
            coordinate: None,
            weather: WeatherObservation::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteLeg {
    pub duration_seconds: f64,
}

impl RouteLeg {
    /// Whole minutes, rounded half up.
    pub fn minutes(&self) -> i64 {
        (self.duration_seconds / 60.0).round() as i64
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Route {
    pub legs: Vec<RouteLeg>,
    pub total_distance_meters: f64,
}

impl Route {
    /// Zero legs and zero distance.
    pub fn degenerate() -> Self {
        Self::default()
    }

    pub fn is_degenerate(&self) -> bool {
        self.legs.is_empty() && self.total_distance_meters == 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub destination: String,
    pub transit_time: String,
    pub dwell_time: String,
    pub weather: String,
}

/// Final plan for one request. Built once by the assembler and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    city: String,
    destinations: Vec<EnrichedDestination>,
    timeline: Vec<TimelineEntry>,
    total_distance_km: String,
    end_time: String,
}

impl Itinerary {
    pub(crate) fn new(
        city: String,
        destinations: Vec<EnrichedDestination>,
        timeline: Vec<TimelineEntry>,
        total_distance_km: String,
        end_time: String,
    ) -> Self {
        Self {
            city,
            destinations,
            timeline,
            total_distance_km,
            end_time,
        }
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn destinations(&self) -> &[EnrichedDestination] {
        &self.destinations
    }

    pub fn timeline(&self) -> &[TimelineEntry] {
        &self.timeline
    }

    pub fn total_distance_km(&self) -> &str {
        &self.total_distance_km
    }

    pub fn end_time(&self) -> &str {
        &self.end_time
    }
}
