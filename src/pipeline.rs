//! End-to-end itinerary planning.
//!
//! ```text
//! interpret ──▶ enrich (fan-out per destination) ──▶ route ──▶ assemble
//! ```
//!
//! Only interpretation can fail the request. Enrichment and routing always
//! produce something, recording a [`Degradation`] for each fallback they use.

use crate::assemble::assemble;
use crate::config::PlannerConfig;
use crate::enrich::{enrich_destinations, Lookups};
use crate::error::PlanResult;
use crate::interpret::interpret;
use crate::model::{Itinerary, TravelRequest};
use crate::providers::http::{http_agent, lm_agent};
use crate::providers::{
    ChatLanguageService, CommandLanguageService, GeocodingService, LanguageService,
    NominatimGeocoder, OpenMeteoWeather, OsrmRouter, OverpassPoiService, PoiService,
    RoutingService, WeatherService,
};
use crate::report::{Degradation, PlanReport};
use crate::route::plan_route;
use std::time::Instant;

/// Stateless planner over a fixed set of collaborators.
pub struct Planner {
    language: Box<dyn LanguageService>,
    poi: Box<dyn PoiService>,
    geocoder: Box<dyn GeocodingService>,
    weather: Box<dyn WeatherService>,
    router: Box<dyn RoutingService>,
    poi_radius_meters: u32,
}

impl Planner {
    pub fn new(
        language: Box<dyn LanguageService>,
        poi: Box<dyn PoiService>,
        geocoder: Box<dyn GeocodingService>,
        weather: Box<dyn WeatherService>,
        router: Box<dyn RoutingService>,
    ) -> Self {
        Self {
            language,
            poi,
            geocoder,
            weather,
            router,
            poi_radius_meters: PlannerConfig::default().poi_radius_meters,
        }
    }

    pub fn with_poi_radius(mut self, radius_meters: u32) -> Self {
        self.poi_radius_meters = radius_meters;
        self
    }

    /// Wire the HTTP collaborators described by `config`.
    ///
    /// A configured LM command wins over the chat endpoint; the chat API key
    /// is read from the env var named in config.
    pub fn from_config(config: &PlannerConfig) -> Self {
        let agent = http_agent(config);
        let language: Box<dyn LanguageService> = match config.lm.command.as_deref() {
            Some(command) => Box::new(CommandLanguageService::new(command)),
            None => {
                let api_key = std::env::var(&config.lm.api_key_env)
                    .ok()
                    .filter(|key| !key.trim().is_empty());
                Box::new(ChatLanguageService::new(lm_agent(config), config, api_key))
            }
        };
        Self::new(
            language,
            Box::new(OverpassPoiService::new(agent.clone(), config)),
            Box::new(NominatimGeocoder::new(agent.clone(), config)),
            Box::new(OpenMeteoWeather::new(agent.clone(), config)),
            Box::new(OsrmRouter::new(agent, config)),
        )
        .with_poi_radius(config.poi_radius_meters)
    }

    /// Plan an itinerary for `raw_prompt`.
    pub fn plan_itinerary(&self, raw_prompt: &str) -> PlanResult<Itinerary> {
        self.plan_with_report(raw_prompt).map(|report| report.itinerary)
    }

    /// Plan an itinerary and keep every degradation recorded along the way.
    pub fn plan_with_report(&self, raw_prompt: &str) -> PlanResult<PlanReport> {
        let start = Instant::now();
        let request = TravelRequest::new(raw_prompt);
        let intent = interpret(self.language.as_ref(), &request)?;

        let lookups = Lookups {
            poi: self.poi.as_ref(),
            geocoder: self.geocoder.as_ref(),
            weather: self.weather.as_ref(),
            radius_meters: self.poi_radius_meters,
        };
        let enrichment = enrich_destinations(lookups, &intent.destination_names, &intent.city);
        let route_plan = plan_route(self.router.as_ref(), &enrichment.destinations);

        let mut degradations: Vec<Degradation> = enrichment.degradations;
        degradations.extend(route_plan.degradation);

        let itinerary = assemble(
            &intent.city,
            enrichment.destinations,
            &route_plan.route,
            &intent.end_time,
        );
        let report = PlanReport {
            itinerary,
            degradations,
        };
        tracing::info!(
            elapsed_ms = start.elapsed().as_millis(),
            city = %intent.city,
            outcome = %report.outcome(),
            degradations = report.degradations.len(),
            "itinerary planned"
        );
        Ok(report)
    }
}
