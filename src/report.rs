//! Degradable failure records.
//!
//! Each POI, geocode, weather or routing failure becomes one [`Degradation`].
//! Records are collected alongside the itinerary so callers can see what was
//! filled in with fallbacks; they never change control flow.
use crate::model::Itinerary;
use serde::Serialize;
use std::fmt;

/// Pipeline stage a degradable failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Poi,
    Geocode,
    Weather,
    Routing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Poi => write!(f, "poi"),
            Self::Geocode => write!(f, "geocode"),
            Self::Weather => write!(f, "weather"),
            Self::Routing => write!(f, "routing"),
        }
    }
}

/// A failure that was absorbed into a fallback value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Degradation {
    /// Raw destination name; `None` for route-wide failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    pub stage: Stage,
    pub cause: String,
}

impl Degradation {
    /// A lookup failure scoped to one destination.
    pub fn lookup(destination: &str, stage: Stage, cause: impl Into<String>) -> Self {
        let record = Self {
            destination: Some(destination.to_string()),
            stage,
            cause: cause.into(),
        };
        tracing::warn!(
            destination,
            stage = %stage,
            cause = %record.cause,
            "lookup degraded"
        );
        record
    }

    /// A routing failure; applies to the whole route.
    pub fn routing(cause: impl Into<String>) -> Self {
        let record = Self {
            destination: None,
            stage: Stage::Routing,
            cause: cause.into(),
        };
        tracing::warn!(cause = %record.cause, "routing degraded");
        record
    }
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.destination {
            Some(destination) => write!(f, "[{}] {}: {}", self.stage, destination, self.cause),
            None => write!(f, "[{}] {}", self.stage, self.cause),
        }
    }
}

/// How much of the itinerary came back without fallbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Every lookup and the route succeeded.
    Complete,
    /// Some fields were filled with fallbacks.
    Partial,
    /// No destination was geocoded and no route was computed.
    Degraded,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Complete => write!(f, "complete"),
            Self::Partial => write!(f, "partial"),
            Self::Degraded => write!(f, "degraded"),
        }
    }
}

/// An itinerary plus every degradation recorded while building it.
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub itinerary: Itinerary,
    pub degradations: Vec<Degradation>,
}

impl PlanReport {
    pub fn outcome(&self) -> Outcome {
        if self.degradations.is_empty() {
            return Outcome::Complete;
        }
        let any_located = self
            .itinerary
            .destinations()
            .iter()
            .any(|destination| destination.coordinate.is_some());
        if !any_located && self.itinerary.timeline().is_empty() {
            Outcome::Degraded
        } else {
            Outcome::Partial
        }
    }

    /// Degradations recorded against one destination name.
    pub fn for_destination<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Degradation> {
        self.degradations
            .iter()
            .filter(move |record| record.destination.as_deref() == Some(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_destination_and_stage() {
        let record = Degradation::lookup("Castle", Stage::Geocode, "no results");
        assert_eq!(record.to_string(), "[geocode] Castle: no results");
        let route = Degradation::routing("fewer than 2 coordinates");
        assert_eq!(route.to_string(), "[routing] fewer than 2 coordinates");
    }

    #[test]
    fn routing_record_serializes_without_destination() {
        let value = serde_json::to_value(Degradation::routing("timeout")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"stage": "routing", "cause": "timeout"})
        );
    }
}
