use std::collections::HashMap;
use std::env::VarError;
use std::path::PathBuf;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn parse_environment_development() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
}

#[test]
fn parse_environment_production() {
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "LEADSCAN_ENV"));
}

#[test]
fn build_app_config_uses_defaults_for_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.scan_config_path, PathBuf::from("./config/scan.yaml"));
    assert_eq!(cfg.ledger_path, PathBuf::from("./data/seen_urls.json"));
    assert_eq!(cfg.request_timeout_secs, 10);
    assert_eq!(cfg.source_timeout_secs, 120);
    assert_eq!(cfg.max_retries, 3);
    assert_eq!(cfg.retry_backoff_base_ms, 1000);
    assert!(cfg.twitter_bearer_token.is_none());
}

#[test]
fn build_app_config_reads_overrides() {
    let mut map = HashMap::new();
    map.insert("LEADSCAN_LEDGER_PATH", "/var/lib/leadscan/ledger.json");
    map.insert("LEADSCAN_SOURCE_TIMEOUT_SECS", "30");
    map.insert("LEADSCAN_USER_AGENT", "custom-agent/2.0");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(
        cfg.ledger_path,
        PathBuf::from("/var/lib/leadscan/ledger.json")
    );
    assert_eq!(cfg.source_timeout_secs, 30);
    assert_eq!(cfg.user_agent, "custom-agent/2.0");
}

#[test]
fn build_app_config_rejects_invalid_number() {
    let mut map = HashMap::new();
    map.insert("LEADSCAN_MAX_RETRIES", "not-a-number");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "LEADSCAN_MAX_RETRIES"),
        "expected InvalidEnvVar(LEADSCAN_MAX_RETRIES), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_zero_source_timeout() {
    let mut map = HashMap::new();
    map.insert("LEADSCAN_SOURCE_TIMEOUT_SECS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "LEADSCAN_SOURCE_TIMEOUT_SECS"),
        "expected InvalidEnvVar(LEADSCAN_SOURCE_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn blank_optional_tokens_are_treated_as_absent() {
    let mut map = HashMap::new();
    map.insert("LEADSCAN_TWITTER_BEARER_TOKEN", "   ");
    map.insert("LEADSCAN_MOLTBOOK_API_KEY", "moltbook-key");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.twitter_bearer_token.is_none());
    assert_eq!(cfg.moltbook_api_key.as_deref(), Some("moltbook-key"));
}

#[test]
fn debug_output_redacts_secrets() {
    let mut map = HashMap::new();
    map.insert("LEADSCAN_GITHUB_TOKEN", "ghp_secret");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("ghp_secret"));
    assert!(rendered.contains("[redacted]"));
}

#[test]
fn credential_var_names_are_the_ones_read() {
    assert_eq!(TWITTER_BEARER_TOKEN_VAR, "LEADSCAN_TWITTER_BEARER_TOKEN");
    assert_eq!(MOLTBOOK_API_KEY_VAR, "LEADSCAN_MOLTBOOK_API_KEY");

    let mut map = HashMap::new();
    map.insert(TWITTER_BEARER_TOKEN_VAR, "tw-token");
    map.insert(MOLTBOOK_API_KEY_VAR, "mb-key");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.twitter_bearer_token.as_deref(), Some("tw-token"));
    assert_eq!(cfg.moltbook_api_key.as_deref(), Some("mb-key"));
}
