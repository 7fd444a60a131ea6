//! Social provider Graph API client — field-scoped `/me` profile fetch.
//!
//! Thin HTTP wrapper a `SocialAdapter` can reuse for `fetch_profile` when
//! the SDK hands over an access token. Pure parsing in `parse_profile`
//! for testability.

use std::time::Duration;

use super::GraphProfile;
use crate::config::AuthConfig;
use crate::error::ProviderError;

const CONNECT_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = "auth-session";

// =============================================================================
// CLIENT
// =============================================================================

pub struct GraphClient {
    http: reqwest::Client,
    base_url: String,
}

impl GraphClient {
    /// Build a client against `base_url` (e.g. `https://graph.facebook.com`).
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Transport` if the HTTP client fails to build.
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    /// Build a client against `graph_base_url`, bounded by `provider_timeout`.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Transport` if the HTTP client fails to build.
    pub fn from_config(config: &AuthConfig) -> Result<Self, ProviderError> {
        Self::new(config.graph_base_url.clone(), config.provider_timeout)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/me?fields=a,b,c`
    #[must_use]
    pub fn me_url(&self, fields: &[&str]) -> String {
        format!("{}/me?fields={}", self.base_url, fields.join(","))
    }

    /// Fetch the token owner's profile restricted to `fields`.
    ///
    /// # Errors
    ///
    /// Transport failures, non-success statuses and undecodable bodies are
    /// mapped onto the matching `ProviderError` variant.
    pub async fn fetch_me(&self, access_token: &str, fields: &[&str]) -> Result<GraphProfile, ProviderError> {
        let url = self.me_url(fields);
        tracing::debug!(%url, "graph profile fetch");

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ProviderError::Status { status: status.as_u16(), body: text });
        }

        parse_profile(&text)
    }
}

// =============================================================================
// PARSING
// =============================================================================

pub(crate) fn parse_profile(text: &str) -> Result<GraphProfile, ProviderError> {
    serde_json::from_str(text).map_err(|e| ProviderError::Decode(e.to_string()))
}

#[cfg(test)]
#[path = "graph_test.rs"]
mod tests;
