//! Planner configuration.
//!
//! Loads, validates, and normalizes the JSON config so every collaborator is
//! built from one checked source. Missing fields take defaults; env vars win
//! over the file for the LM settings.
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Env var holding a local LM command line; overrides `lm.command`.
pub const LM_COMMAND_ENV: &str = "DAYTRIP_LM_COMMAND";

const CONFIG_FILE_NAME: &str = "config.json";
const ROUTING_PROFILES: &[&str] = &["driving", "walking", "cycling", "foot", "bike", "car"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlannerConfig {
    pub lm: LmConfig,
    pub endpoints: Endpoints,
    /// POI search radius around the city.
    pub poi_radius_meters: u32,
    /// Overpass `tourism` tag values, joined as a regex alternation.
    pub tourism_categories: Vec<String>,
    /// Sent on every provider request; Nominatim rejects anonymous clients.
    pub user_agent: String,
    /// Per-call timeout applied by the HTTP lookup collaborators.
    pub http_timeout_secs: u64,
    /// OSRM profile segment, e.g. `driving`.
    pub routing_profile: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LmConfig {
    /// Local LM command (parsed via shell-words). Takes precedence over HTTP.
    pub command: Option<String>,
    /// OpenAI-compatible chat completions endpoint.
    pub url: String,
    pub model: String,
    /// Name of the env var holding the API key.
    pub api_key_env: String,
    /// Timeout for one chat-completion call; separate from the lookup
    /// timeout because LM replies are slow.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Endpoints {
    pub overpass: String,
    pub nominatim: String,
    pub open_meteo: String,
    pub osrm: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            lm: LmConfig::default(),
            endpoints: Endpoints::default(),
            poi_radius_meters: 10_000,
            tourism_categories: vec!["attraction".to_string(), "museum".to_string()],
            user_agent: "DayTripApp/1.0".to_string(),
            http_timeout_secs: 15,
            routing_profile: "driving".to_string(),
        }
    }
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            command: None,
            url: "https://api.x.ai/v1/chat/completions".to_string(),
            model: "grok-3".to_string(),
            api_key_env: "XAI_API_KEY".to_string(),
            timeout_secs: 120,
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            overpass: "http://overpass-api.de/api/interpreter".to_string(),
            nominatim: "https://nominatim.openstreetmap.org/search".to_string(),
            open_meteo: "https://api.open-meteo.com/v1/forecast".to_string(),
            osrm: "http://router.project-osrm.org".to_string(),
        }
    }
}

/// `$XDG_CONFIG_HOME/daytrip/config.json` or the platform equivalent.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("daytrip").join(CONFIG_FILE_NAME))
}

/// Render the default config as pretty JSON, e.g. for `daytrip config`.
pub fn config_stub() -> Result<String> {
    serde_json::to_string_pretty(&PlannerConfig::default()).context("serialize config stub")
}

/// Load config from `path`, or from the default location when it exists.
///
/// An explicit path must exist; a missing default file means defaults.
pub fn load_config(path: Option<&Path>) -> Result<PlannerConfig> {
    let config = match path {
        Some(path) => read_config(path)?,
        None => match default_config_path().filter(|path| path.is_file()) {
            Some(path) => read_config(&path)?,
            None => PlannerConfig::default(),
        },
    };
    Ok(apply_env_overrides(config, |key| env::var(key).ok()))
}

fn read_config(path: &Path) -> Result<PlannerConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: PlannerConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse config JSON {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Apply env overrides using `lookup`; split out so tests avoid the process env.
pub fn apply_env_overrides(
    mut config: PlannerConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> PlannerConfig {
    if let Some(command) = lookup(LM_COMMAND_ENV).filter(|value| !value.trim().is_empty()) {
        config.lm.command = Some(command);
    }
    config
}

/// Validate everything the collaborators will rely on.
pub fn validate_config(config: &PlannerConfig) -> Result<()> {
    for (label, url) in [
        ("endpoints.overpass", &config.endpoints.overpass),
        ("endpoints.nominatim", &config.endpoints.nominatim),
        ("endpoints.open_meteo", &config.endpoints.open_meteo),
        ("endpoints.osrm", &config.endpoints.osrm),
    ] {
        validate_url(url, label)?;
    }
    if config.poi_radius_meters == 0 {
        return Err(anyhow!("poi_radius_meters must be positive"));
    }
    if config.http_timeout_secs == 0 {
        return Err(anyhow!("http_timeout_secs must be positive"));
    }
    if config.user_agent.trim().is_empty() {
        return Err(anyhow!("user_agent must be non-empty"));
    }
    if config.tourism_categories.is_empty()
        || config
            .tourism_categories
            .iter()
            .any(|category| category.trim().is_empty())
    {
        return Err(anyhow!("tourism_categories must be non-empty strings"));
    }
    if !ROUTING_PROFILES.contains(&config.routing_profile.as_str()) {
        return Err(anyhow!(
            "routing_profile must be one of {} (got {:?})",
            ROUTING_PROFILES.join(", "),
            config.routing_profile
        ));
    }
    validate_lm(&config.lm)
}

fn validate_lm(lm: &LmConfig) -> Result<()> {
    if let Some(command) = lm.command.as_deref() {
        let args = shell_words::split(command)
            .with_context(|| format!("parse LM command: {command}"))?;
        let program = args
            .first()
            .ok_or_else(|| anyhow!("LM command is empty"))?;
        which::which(program)
            .with_context(|| format!("LM command {program:?} not found on PATH"))?;
        return Ok(());
    }
    validate_url(&lm.url, "lm.url")?;
    if lm.timeout_secs == 0 {
        return Err(anyhow!("lm.timeout_secs must be positive"));
    }
    if lm.model.trim().is_empty() {
        return Err(anyhow!("lm.model must be non-empty"));
    }
    if lm.api_key_env.trim().is_empty() {
        return Err(anyhow!("lm.api_key_env must be non-empty"));
    }
    Ok(())
}

fn validate_url(url: &str, label: &str) -> Result<()> {
    let trimmed = url.trim();
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(anyhow!("{label} must be an http(s) URL (got {url:?})"));
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
