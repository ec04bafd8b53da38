//! Day-trip itinerary planning.
//!
//! A free-text request goes through an LM to get a city, destinations and an
//! end time; each destination is resolved against POI, geocoding and weather
//! providers; the located destinations are routed; and everything is merged
//! into an [`Itinerary`]. Lookup and routing failures degrade fields instead of
//! failing the request.

pub mod assemble;
pub mod config;
pub mod enrich;
pub mod error;
pub mod interpret;
pub mod model;
pub mod pipeline;
pub mod providers;
pub mod report;
pub mod route;

pub use config::{load_config, validate_config, PlannerConfig};
pub use error::{PlanError, PlanResult};
pub use model::{EnrichedDestination, GeoCoordinate, Itinerary, TimelineEntry, WeatherObservation};
pub use pipeline::Planner;
pub use report::{Degradation, Outcome, PlanReport, Stage};
