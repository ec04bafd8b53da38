use super::{
    apply_env_overrides, config_stub, load_config, validate_config, PlannerConfig, LM_COMMAND_ENV,
};
use std::io::Write;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create temp config");
    file.write_all(contents.as_bytes()).expect("write temp config");
    file
}

#[test]
fn default_config_validates() {
    validate_config(&PlannerConfig::default()).expect("defaults are valid");
}

#[test]
fn stub_round_trips_to_defaults() {
    let stub = config_stub().expect("stub");
    let parsed: PlannerConfig = serde_json::from_str(&stub).expect("parse stub");
    assert_eq!(parsed, PlannerConfig::default());
}

#[test]
fn partial_file_fills_defaults() {
    let file = write_config(r#"{"poi_radius_meters": 2500, "routing_profile": "walking"}"#);
    let config = load_config(Some(file.path())).expect("load config");
    assert_eq!(config.poi_radius_meters, 2500);
    assert_eq!(config.routing_profile, "walking");
    assert_eq!(config.user_agent, "DayTripApp/1.0");
    assert_eq!(config.http_timeout_secs, 15);
    assert_eq!(config.lm.timeout_secs, 120);
}

#[test]
fn lm_timeout_is_configured_apart_from_lookups() {
    let file = write_config(r#"{"http_timeout_secs": 10, "lm": {"timeout_secs": 300}}"#);
    let config = load_config(Some(file.path())).expect("load config");
    assert_eq!(config.http_timeout_secs, 10);
    assert_eq!(config.lm.timeout_secs, 300);
    assert_eq!(config.lm.model, "grok-3");
    validate_config(&config).expect("valid config");
}

#[test]
fn rejects_zero_lm_timeout() {
    let mut config = PlannerConfig::default();
    config.lm.timeout_secs = 0;
    let err = validate_config(&config).unwrap_err();
    assert!(err.to_string().contains("lm.timeout_secs"));
}

#[test]
fn unknown_fields_are_rejected() {
    let file = write_config(r#"{"radius": 10}"#);
    let err = load_config(Some(file.path())).unwrap_err();
    assert!(format!("{err:#}").contains("parse config JSON"));
}

#[test]
fn explicit_missing_path_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("nope.json");
    let err = load_config(Some(&missing)).unwrap_err();
    assert!(err.to_string().contains("read config"));
}

#[test]
fn env_override_sets_lm_command() {
    let config = apply_env_overrides(PlannerConfig::default(), |key| {
        (key == LM_COMMAND_ENV).then(|| "llm -m local".to_string())
    });
    assert_eq!(config.lm.command.as_deref(), Some("llm -m local"));
}

#[test]
fn blank_env_override_is_ignored() {
    let config = apply_env_overrides(PlannerConfig::default(), |_| Some("  ".to_string()));
    assert_eq!(config.lm.command, None);
}

#[test]
fn rejects_zero_radius_and_timeout() {
    let config = PlannerConfig {
        poi_radius_meters: 0,
        ..PlannerConfig::default()
    };
    assert!(validate_config(&config).is_err());

    let config = PlannerConfig {
        http_timeout_secs: 0,
        ..PlannerConfig::default()
    };
    assert!(validate_config(&config).is_err());
}

#[test]
fn rejects_unknown_routing_profile() {
    let config = PlannerConfig {
        routing_profile: "teleport".to_string(),
        ..PlannerConfig::default()
    };
    let err = validate_config(&config).unwrap_err();
    assert!(err.to_string().contains("routing_profile"));
}

#[test]
fn rejects_non_http_endpoint() {
    let mut config = PlannerConfig::default();
    config.endpoints.osrm = "router.project-osrm.org".to_string();
    let err = validate_config(&config).unwrap_err();
    assert!(err.to_string().contains("endpoints.osrm"));
}

#[test]
fn rejects_lm_command_missing_from_path() {
    let mut config = PlannerConfig::default();
    config.lm.command = Some("definitely-not-an-lm-binary-4b1f --json".to_string());
    let err = validate_config(&config).unwrap_err();
    assert!(err.to_string().contains("not found on PATH"));
}
