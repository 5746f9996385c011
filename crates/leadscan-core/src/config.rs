use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Env var holding the Twitter API bearer token.
pub const TWITTER_BEARER_TOKEN_VAR: &str = "LEADSCAN_TWITTER_BEARER_TOKEN";
/// Env var holding the Moltbook API key.
pub const MOLTBOOK_API_KEY_VAR: &str = "LEADSCAN_MOLTBOOK_API_KEY";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let env = parse_environment(&or_default("LEADSCAN_ENV", "development"))?;
    let log_level = or_default("LEADSCAN_LOG_LEVEL", "info");
    let scan_config_path = PathBuf::from(or_default(
        "LEADSCAN_SCAN_CONFIG_PATH",
        "./config/scan.yaml",
    ));
    let ledger_path = PathBuf::from(or_default("LEADSCAN_LEDGER_PATH", "./data/seen_urls.json"));
    let user_agent = or_default("LEADSCAN_USER_AGENT", "leadscan/0.1 (lead-digest)");

    let request_timeout_secs = parse_u64("LEADSCAN_REQUEST_TIMEOUT_SECS", "10")?;
    let source_timeout_secs = parse_u64("LEADSCAN_SOURCE_TIMEOUT_SECS", "120")?;
    let max_retries = parse_u32("LEADSCAN_MAX_RETRIES", "3")?;
    let retry_backoff_base_ms = parse_u64("LEADSCAN_RETRY_BACKOFF_BASE_MS", "1000")?;

    if source_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "LEADSCAN_SOURCE_TIMEOUT_SECS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }

    Ok(AppConfig {
        env,
        log_level,
        scan_config_path,
        ledger_path,
        user_agent,
        request_timeout_secs,
        source_timeout_secs,
        max_retries,
        retry_backoff_base_ms,
        twitter_bearer_token: optional(TWITTER_BEARER_TOKEN_VAR),
        moltbook_api_key: optional(MOLTBOOK_API_KEY_VAR),
        github_token: optional("LEADSCAN_GITHUB_TOKEN"),
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than
/// `development`, `test` or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "LEADSCAN_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
