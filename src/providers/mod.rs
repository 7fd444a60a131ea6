//! Provider adapters — contracts for the two identity SDKs.
//!
//! DESIGN
//! ======
//! The vendor SDKs own the actual login protocol. This module only fixes
//! the shape of what they hand back, so the session manager can be driven
//! by any implementation (native bridge, HTTP, or a test double).

pub mod graph;

use serde::{Deserialize, Serialize};

use crate::config::SearchEngineConfig;
use crate::error::ProviderError;
use crate::session::Profile;

// =============================================================================
// SOCIAL PROVIDER
// =============================================================================

/// Result of the social provider's permission dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginResult {
    Cancelled,
    /// Permissions granted. The token is present when the SDK exposes it.
    Granted { access_token: Option<String> },
}

/// Field-scoped `/me` response: `{ name, email, picture: { data: { url } } }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub picture: Option<GraphPicture>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphPicture {
    #[serde(default)]
    pub data: Option<GraphPictureData>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphPictureData {
    #[serde(default)]
    pub url: Option<String>,
}

impl GraphProfile {
    /// Flatten into a session profile. `name` is required; the nested
    /// picture URL and email default to empty.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Decode` when `name` is absent.
    pub fn into_profile(self) -> Result<Profile, ProviderError> {
        let name = self
            .name
            .ok_or_else(|| ProviderError::Decode("profile response missing name".into()))?;
        let photo = self
            .picture
            .and_then(|p| p.data)
            .and_then(|d| d.url)
            .unwrap_or_default();
        Ok(Profile { name, photo, email: self.email.unwrap_or_default() })
    }
}

#[async_trait::async_trait]
pub trait SocialAdapter: Send + Sync {
    /// Show the permission dialog for `scopes`.
    ///
    /// # Errors
    ///
    /// SDK or network failure before the dialog produced a result.
    async fn log_in_with_permissions(&self, scopes: &[&str]) -> Result<LoginResult, ProviderError>;

    /// Fetch the logged-in user's profile restricted to `fields`.
    ///
    /// # Errors
    ///
    /// Transport, status or decode failure of the profile request.
    async fn fetch_profile(&self, fields: &[&str]) -> Result<GraphProfile, ProviderError>;

    /// Forget the local login. No network call.
    fn log_out(&self);
}

// =============================================================================
// SEARCH-ENGINE PROVIDER
// =============================================================================

/// Response of the search-engine `signIn` call: `{ user: { name, photo, email } }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchEngineSignIn {
    #[serde(default)]
    pub user: Option<SearchEngineUser>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchEngineUser {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl SearchEngineSignIn {
    /// Pull the profile straight from the `user` object.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Decode` when the response has no `user`.
    pub fn into_profile(self) -> Result<Profile, ProviderError> {
        let user = self
            .user
            .ok_or_else(|| ProviderError::Decode("sign-in response missing user".into()))?;
        Ok(Profile {
            name: user.name.unwrap_or_default(),
            photo: user.photo.unwrap_or_default(),
            email: user.email.unwrap_or_default(),
        })
    }
}

#[async_trait::async_trait]
pub trait SearchEngineAdapter: Send + Sync {
    /// Register scopes, client id and offline access with the SDK.
    ///
    /// # Errors
    ///
    /// The SDK rejected the registration.
    fn configure(&self, config: &SearchEngineConfig) -> Result<(), ProviderError>;

    /// Check the platform services the SDK depends on.
    ///
    /// # Errors
    ///
    /// `ProviderError::Unavailable` when the services are missing.
    async fn has_play_services(&self) -> Result<bool, ProviderError>;

    /// # Errors
    ///
    /// SDK failure during the sign-in dialog.
    async fn sign_in(&self) -> Result<SearchEngineSignIn, ProviderError>;

    /// # Errors
    ///
    /// The provider could not revoke the access token.
    async fn revoke_access(&self) -> Result<(), ProviderError>;

    /// # Errors
    ///
    /// The SDK could not clear the local sign-in.
    async fn sign_out(&self) -> Result<(), ProviderError>;
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
