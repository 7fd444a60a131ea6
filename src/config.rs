//! Session configuration parsed from environment variables.

use std::time::Duration;

pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.facebook.com";

/// Scopes requested from the social provider's permission dialog.
pub const SOCIAL_PERMISSIONS: &[&str] = &["public_profile", "email"];
/// Fields requested by the social profile fetch.
pub const SOCIAL_PROFILE_FIELDS: &[&str] = &["name", "email", "picture"];
/// Scopes requested from the search-engine provider.
pub const SEARCH_ENGINE_SCOPES: &[&str] = &["email"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse failed: {0}")]
    Parse(String),
}

/// What a failed search-engine sign-in does to the current session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Leave the session as it was before the attempt.
    #[default]
    Preserve,
    /// Reset to signed out, as the social flow does.
    Reset,
}

/// Registration handed to the search-engine adapter's `configure`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchEngineConfig {
    pub scopes: Vec<String>,
    pub web_client_id: String,
    pub offline_access: bool,
}

impl Default for SearchEngineConfig {
    fn default() -> Self {
        Self {
            scopes: SEARCH_ENGINE_SCOPES.iter().map(ToString::to_string).collect(),
            web_client_id: String::new(),
            offline_access: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub search_engine: SearchEngineConfig,
    pub provider_timeout: Duration,
    pub search_engine_failure_policy: FailurePolicy,
    pub graph_base_url: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            search_engine: SearchEngineConfig::default(),
            provider_timeout: Duration::from_secs(DEFAULT_PROVIDER_TIMEOUT_SECS),
            search_engine_failure_policy: FailurePolicy::default(),
            graph_base_url: DEFAULT_GRAPH_BASE_URL.to_string(),
        }
    }
}

impl AuthConfig {
    /// Build typed session config from environment variables.
    ///
    /// Optional:
    /// - `AUTH_SEARCH_ENGINE_WEB_CLIENT_ID`: default empty
    /// - `AUTH_SEARCH_ENGINE_OFFLINE_ACCESS`: default true
    /// - `AUTH_PROVIDER_TIMEOUT_SECS`: default 60
    /// - `AUTH_SEARCH_ENGINE_FAILURE_POLICY`: `preserve` (default) or `reset`
    /// - `AUTH_GRAPH_BASE_URL`: default `https://graph.facebook.com`
    ///
    /// # Errors
    ///
    /// Returns an error if a set variable holds an unparseable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let web_client_id = std::env::var("AUTH_SEARCH_ENGINE_WEB_CLIENT_ID").unwrap_or_default();
        let offline_access = match std::env::var("AUTH_SEARCH_ENGINE_OFFLINE_ACCESS").ok() {
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| ConfigError::Parse(format!("invalid AUTH_SEARCH_ENGINE_OFFLINE_ACCESS: {raw}")))?,
            None => true,
        };
        let timeout_secs = match std::env::var("AUTH_PROVIDER_TIMEOUT_SECS").ok() {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| ConfigError::Parse(format!("invalid AUTH_PROVIDER_TIMEOUT_SECS: {raw}")))?,
            None => DEFAULT_PROVIDER_TIMEOUT_SECS,
        };
        let search_engine_failure_policy =
            parse_failure_policy(std::env::var("AUTH_SEARCH_ENGINE_FAILURE_POLICY").ok().as_deref())?;
        let graph_base_url = std::env::var("AUTH_GRAPH_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_GRAPH_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            search_engine: SearchEngineConfig { web_client_id, offline_access, ..SearchEngineConfig::default() },
            provider_timeout: Duration::from_secs(timeout_secs),
            search_engine_failure_policy,
            graph_base_url,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_failure_policy(raw: Option<&str>) -> Result<FailurePolicy, ConfigError> {
    match raw.unwrap_or("preserve") {
        "preserve" => Ok(FailurePolicy::Preserve),
        "reset" => Ok(FailurePolicy::Reset),
        other => Err(ConfigError::Parse(format!(
            "unknown AUTH_SEARCH_ENGINE_FAILURE_POLICY '{other}' (expected 'preserve' or 'reset')"
        ))),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
