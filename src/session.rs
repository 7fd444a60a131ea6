//! Session state for the current user.
//!
//! DESIGN
//! ======
//! The session is a closed enum: either signed out, or signed in through
//! exactly one provider with a populated profile. The three consumer-facing
//! fields (`isSigned`, `userInfo`, `loginType`) are derived from it, so the
//! "signed in implies provider and profile" invariant cannot be broken.

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// PROVIDER
// =============================================================================

/// Identity provider that authenticated the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provider {
    /// Social network native login.
    Social,
    /// Search-engine vendor sign-in.
    SearchEngine,
}

impl Provider {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Social => "social",
            Self::SearchEngine => "search-engine",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// PROFILE
// =============================================================================

/// Identity fields retrieved from the provider on sign-in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    /// Avatar URL.
    pub photo: String,
    pub email: String,
}

// =============================================================================
// SESSION STATE
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    SignedOut,
    SignedIn { provider: Provider, profile: Profile },
}

impl SessionState {
    #[must_use]
    pub fn signed_in(provider: Provider, profile: Profile) -> Self {
        Self::SignedIn { provider, profile }
    }

    #[must_use]
    pub fn is_signed(&self) -> bool {
        matches!(self, Self::SignedIn { .. })
    }

    /// Profile of the signed-in user; `None` when signed out.
    #[must_use]
    pub fn user_info(&self) -> Option<&Profile> {
        match self {
            Self::SignedIn { profile, .. } => Some(profile),
            Self::SignedOut => None,
        }
    }

    /// Active provider tag; `None` when signed out.
    #[must_use]
    pub fn login_type(&self) -> Option<Provider> {
        match self {
            Self::SignedIn { provider, .. } => Some(*provider),
            Self::SignedOut => None,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::from(self)
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// JSON view handed to UI consumers: `{ isSigned, userInfo, loginType }`.
///
/// `userInfo` serializes as `{}` and `loginType` as `null` when signed out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub is_signed: bool,
    pub user_info: UserInfo,
    pub login_type: Option<Provider>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserInfo {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.photo.is_none() && self.email.is_none()
    }
}

impl From<&Profile> for UserInfo {
    fn from(profile: &Profile) -> Self {
        Self {
            name: Some(profile.name.clone()),
            photo: Some(profile.photo.clone()),
            email: Some(profile.email.clone()),
        }
    }
}

impl From<&SessionState> for SessionSnapshot {
    fn from(state: &SessionState) -> Self {
        Self {
            is_signed: state.is_signed(),
            user_info: state.user_info().map(UserInfo::from).unwrap_or_default(),
            login_type: state.login_type(),
        }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
