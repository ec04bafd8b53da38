//! HTTP collaborators.
//!
//! One blocking `ureq::Agent` is shared by the lookup providers and a second
//! one serves the chat-completions LM; each agent's global timeout bounds a
//! call, and an expired call is an ordinary `Err`. Responses are
//! read as text and decoded into typed structs so a shape mismatch fails at
//! the boundary with the offending body in the log, never as a missing field
//! deeper in the pipeline.

use super::{
    GeocodingService, LanguageService, PoiQuery, PoiService, RoutingService, WeatherService,
};
use crate::config::PlannerConfig;
use crate::model::{GeoCoordinate, PointOfInterest, Route, RouteLeg, WeatherObservation};
use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;
use ureq::Agent;

/// Build the shared lookup agent from config.
pub fn http_agent(config: &PlannerConfig) -> Agent {
    agent_with_timeout(lookup_timeout(config))
}

/// Build the agent for chat-completion calls; LM replies routinely take
/// longer than a lookup, so it carries its own timeout.
pub fn lm_agent(config: &PlannerConfig) -> Agent {
    agent_with_timeout(lm_timeout(config))
}

fn lookup_timeout(config: &PlannerConfig) -> Duration {
    Duration::from_secs(config.http_timeout_secs)
}

fn lm_timeout(config: &PlannerConfig) -> Duration {
    Duration::from_secs(config.lm.timeout_secs)
}

fn agent_with_timeout(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .into()
}

fn read_body(response: &mut ureq::http::Response<ureq::Body>, url: &str) -> Result<String> {
    response
        .body_mut()
        .read_to_string()
        .with_context(|| format!("read response body from {url}"))
}

fn decode<T: DeserializeOwned>(text: &str, url: &str, what: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|err| {
        tracing::error!(
            url,
            error = %err,
            body = %truncate(text, 500),
            "failed to parse {what}"
        );
        anyhow!("parse {what} from {url}: {err}")
    })
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

// ============================================================================
// Overpass (points of interest)
// ============================================================================

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(default)]
    tags: BTreeMap<String, String>,
}

impl OverpassElement {
    fn into_poi(self) -> PointOfInterest {
        let display_name = self.tags.get("name").cloned().unwrap_or_default();
        let address = self.tags.get("address").cloned().or_else(|| {
            let street = self.tags.get("addr:street")?;
            Some(match self.tags.get("addr:housenumber") {
                Some(number) => format!("{street} {number}"),
                None => street.clone(),
            })
        });
        PointOfInterest {
            display_name,
            address,
        }
    }
}

pub struct OverpassPoiService {
    agent: Agent,
    url: String,
    user_agent: String,
    categories: String,
}

impl OverpassPoiService {
    pub fn new(agent: Agent, config: &PlannerConfig) -> Self {
        Self {
            agent,
            url: config.endpoints.overpass.clone(),
            user_agent: config.user_agent.clone(),
            categories: config.tourism_categories.join("|"),
        }
    }
}

/// Escape text for use inside a double-quoted Overpass QL string.
fn ql_string(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Build an Overpass QL query for tourism nodes whose name fuzzily matches
/// `query.name`, within `query.radius_meters` of the named city or town.
///
/// The city is matched on either its local `name` or its `name:en` tag: the
/// language service answers with English names ("Lisbon") while OSM stores
/// the local one ("Lisboa").
fn overpass_query(query: &PoiQuery<'_>, categories: &str) -> String {
    let city = ql_string(query.city);
    format!(
        "[out:json];\
         (node[\"place\"~\"city|town\"][\"name\"=\"{city}\"];\
         node[\"place\"~\"city|town\"][\"name:en\"=\"{city}\"];)->.center;\
         node[\"tourism\"~\"{categories}\"][\"name\"~\"{name}\",i](around.center:{radius});out;",
        categories = ql_string(categories),
        name = ql_string(&regex::escape(query.name)),
        radius = query.radius_meters,
    )
}

fn decode_overpass(text: &str, url: &str) -> Result<Vec<PointOfInterest>> {
    let response: OverpassResponse = decode(text, url, "Overpass response")?;
    Ok(response
        .elements
        .into_iter()
        .map(OverpassElement::into_poi)
        .collect())
}

impl PoiService for OverpassPoiService {
    fn search(&self, query: &PoiQuery<'_>) -> Result<Vec<PointOfInterest>> {
        let data = overpass_query(query, &self.categories);
        tracing::debug!(name = query.name, city = query.city, "[PROVIDER] overpass search");
        let mut response = self
            .agent
            .get(&self.url)
            .query("data", &data)
            .header("User-Agent", self.user_agent.as_str())
            .call()
            .with_context(|| format!("overpass search for {:?}", query.name))?;
        let text = read_body(&mut response, &self.url)?;
        decode_overpass(&text, &self.url)
    }
}

// ============================================================================
// Nominatim (geocoding)
// ============================================================================

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

impl NominatimPlace {
    fn coordinate(&self) -> Result<GeoCoordinate> {
        let latitude: f64 = self
            .lat
            .trim()
            .parse()
            .with_context(|| format!("parse latitude {:?}", self.lat))?;
        let longitude: f64 = self
            .lon
            .trim()
            .parse()
            .with_context(|| format!("parse longitude {:?}", self.lon))?;
        Ok(GeoCoordinate::new(latitude, longitude))
    }
}

pub struct NominatimGeocoder {
    agent: Agent,
    url: String,
    user_agent: String,
}

impl NominatimGeocoder {
    pub fn new(agent: Agent, config: &PlannerConfig) -> Self {
        Self {
            agent,
            url: config.endpoints.nominatim.clone(),
            user_agent: config.user_agent.clone(),
        }
    }
}

fn decode_nominatim(text: &str, url: &str) -> Result<Vec<GeoCoordinate>> {
    let places: Vec<NominatimPlace> = decode(text, url, "Nominatim response")?;
    places.iter().map(NominatimPlace::coordinate).collect()
}

impl GeocodingService for NominatimGeocoder {
    fn geocode(&self, query: &str) -> Result<Vec<GeoCoordinate>> {
        tracing::debug!(query, "[PROVIDER] nominatim search");
        let mut response = self
            .agent
            .get(&self.url)
            .query("q", query)
            .query("format", "json")
            .query("limit", "1")
            .header("User-Agent", self.user_agent.as_str())
            .call()
            .with_context(|| format!("nominatim search for {query:?}"))?;
        let text = read_body(&mut response, &self.url)?;
        decode_nominatim(&text, &self.url)
    }
}

// ============================================================================
// Open-Meteo (weather)
// ============================================================================

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    current_weather: Option<CurrentWeather>,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    #[serde(default, alias = "weather_code")]
    weathercode: Option<f64>,
}

pub struct OpenMeteoWeather {
    agent: Agent,
    url: String,
    user_agent: String,
}

impl OpenMeteoWeather {
    pub fn new(agent: Agent, config: &PlannerConfig) -> Self {
        Self {
            agent,
            url: config.endpoints.open_meteo.clone(),
            user_agent: config.user_agent.clone(),
        }
    }
}

fn decode_forecast(text: &str, url: &str) -> Result<Option<WeatherObservation>> {
    let response: ForecastResponse = decode(text, url, "Open-Meteo response")?;
    Ok(response
        .current_weather
        .and_then(|current| current.weathercode)
        .map(|code| WeatherObservation::from_code(code.round() as i64)))
}

impl WeatherService for OpenMeteoWeather {
    fn current(&self, at: GeoCoordinate) -> Result<Option<WeatherObservation>> {
        let latitude = at.latitude.to_string();
        let longitude = at.longitude.to_string();
        tracing::debug!(%latitude, %longitude, "[PROVIDER] open-meteo current weather");
        let mut response = self
            .agent
            .get(&self.url)
            .query("latitude", &latitude)
            .query("longitude", &longitude)
            .query("current_weather", "true")
            .header("User-Agent", self.user_agent.as_str())
            .call()
            .with_context(|| format!("open-meteo forecast at {latitude},{longitude}"))?;
        let text = read_body(&mut response, &self.url)?;
        decode_forecast(&text, &self.url)
    }
}

// ============================================================================
// OSRM (routing)
// ============================================================================

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    legs: Vec<OsrmLeg>,
}

#[derive(Debug, Deserialize)]
struct OsrmLeg {
    duration: f64,
}

pub struct OsrmRouter {
    agent: Agent,
    base_url: String,
    profile: String,
    user_agent: String,
}

impl OsrmRouter {
    pub fn new(agent: Agent, config: &PlannerConfig) -> Self {
        Self {
            agent,
            base_url: config.endpoints.osrm.trim_end_matches('/').to_string(),
            profile: config.routing_profile.clone(),
            user_agent: config.user_agent.clone(),
        }
    }

    fn route_url(&self, waypoints: &[GeoCoordinate]) -> String {
        let coordinates = waypoints
            .iter()
            .map(GeoCoordinate::lng_lat)
            .collect::<Vec<_>>()
            .join(";");
        format!("{}/route/v1/{}/{}", self.base_url, self.profile, coordinates)
    }
}

fn decode_osrm(text: &str, url: &str) -> Result<Vec<Route>> {
    let response: OsrmResponse = decode(text, url, "OSRM response")?;
    if response.code != "Ok" {
        return Err(anyhow!(
            "OSRM returned {}: {}",
            response.code,
            response.message.unwrap_or_default()
        ));
    }
    Ok(response
        .routes
        .into_iter()
        .map(|route| Route {
            legs: route
                .legs
                .into_iter()
                .map(|leg| RouteLeg {
                    duration_seconds: leg.duration,
                })
                .collect(),
            total_distance_meters: route.distance,
        })
        .collect())
}

impl RoutingService for OsrmRouter {
    fn route(&self, waypoints: &[GeoCoordinate]) -> Result<Vec<Route>> {
        let url = self.route_url(waypoints);
        tracing::debug!(waypoints = waypoints.len(), "[PROVIDER] osrm route");
        let mut response = self
            .agent
            .get(&url)
            .query("overview", "full")
            .query("steps", "true")
            .header("User-Agent", self.user_agent.as_str())
            .call()
            .with_context(|| format!("osrm route through {} waypoints", waypoints.len()))?;
        let text = read_body(&mut response, &url)?;
        decode_osrm(&text, &url)
    }
}

// ============================================================================
// Chat completions (language understanding)
// ============================================================================

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible chat completions client (xAI by default).
pub struct ChatLanguageService {
    agent: Agent,
    url: String,
    model: String,
    api_key: Option<String>,
    api_key_env: String,
}

impl ChatLanguageService {
    /// `api_key` is usually read from the env var named in config; a missing
    /// key surfaces as an error on the first call.
    pub fn new(agent: Agent, config: &PlannerConfig, api_key: Option<String>) -> Self {
        Self {
            agent,
            url: config.lm.url.clone(),
            model: config.lm.model.clone(),
            api_key,
            api_key_env: config.lm.api_key_env.clone(),
        }
    }
}

fn decode_chat(text: &str, url: &str) -> Result<String> {
    let response: ChatResponse = decode(text, url, "chat completion")?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| anyhow!("chat completion from {url} has no message content"))
}

impl LanguageService for ChatLanguageService {
    fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("{} is not set", self.api_key_env))?;
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": prompt},
            ],
        });
        let start = std::time::Instant::now();
        let mut response = self
            .agent
            .post(&self.url)
            .header("Authorization", format!("Bearer {api_key}"))
            .send_json(&body)
            .with_context(|| format!("chat completion request to {}", self.url))?;
        let text = read_body(&mut response, &self.url)?;
        tracing::info!(
            elapsed_ms = start.elapsed().as_millis(),
            prompt_bytes = prompt.len(),
            response_bytes = text.len(),
            model = %self.model,
            "lm invoke complete"
        );
        decode_chat(&text, &self.url)
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
