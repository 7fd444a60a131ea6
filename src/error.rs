//! Error types for provider adapters and session operations.
//!
//! DESIGN
//! ======
//! Adapters report `ProviderError`. The session manager classifies those
//! into `AuthError` at its boundary; action methods never return `Err`,
//! they log the error and hand it back inside `Outcome::Failed`.

use crate::session::Provider;

// =============================================================================
// ERROR CODES
// =============================================================================

/// Grepable error code and retryable flag for structured log fields.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

// =============================================================================
// PROVIDER ERROR
// =============================================================================

/// Errors reported by a provider adapter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The provider's platform services are missing or disabled.
    #[error("provider services unavailable: {0}")]
    Unavailable(String),

    /// The SDK or network call failed before a result was produced.
    #[error("provider request failed: {0}")]
    Transport(String),

    /// The provider answered with a non-success status.
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The provider response could not be decoded.
    #[error("provider response decode failed: {0}")]
    Decode(String),

    /// The adapter was used before `configure` succeeded.
    #[error("provider adapter not configured")]
    NotConfigured,
}

// =============================================================================
// AUTH ERROR
// =============================================================================

/// Classified failure of a session operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The user dismissed the social login dialog.
    #[error("login cancelled by user")]
    UserCancelled,

    /// The search-engine provider's services check failed.
    #[error("{provider} provider unavailable: {reason}")]
    ProviderUnavailable { provider: Provider, reason: String },

    /// Permission was granted but the profile could not be retrieved.
    #[error("profile fetch failed: {0}")]
    ProfileFetchFailed(ProviderError),

    /// Generic SDK or network failure during a sign-in flow.
    #[error("{provider} sign-in failed: {source}")]
    FlowError { provider: Provider, source: ProviderError },

    /// The provider returned a result missing required fields.
    #[error("{provider} returned a malformed response: {reason}")]
    MalformedResponse { provider: Provider, reason: String },

    /// An adapter call exceeded the configured provider timeout.
    #[error("{provider} call timed out after {secs}s")]
    TimedOut { provider: Provider, secs: u64 },

    /// Revoke or sign-out failed on the provider side.
    #[error("{provider} sign-out failed: {source}")]
    SignOutFailed { provider: Provider, source: ProviderError },

    /// The search-engine adapter was used before initialization.
    #[error("{0} adapter not configured")]
    NotConfigured(Provider),

    /// A setter that requires a session was called while signed out.
    #[error("no active session")]
    NotSignedIn,

    /// The context handle is not attached to a session manager.
    #[error("auth context is not attached to a session manager")]
    Detached,
}

impl AuthError {
    /// Whether this failure counts as a flow-level error for the
    /// search-engine failure policy.
    #[must_use]
    pub fn is_flow_failure(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable { .. }
                | Self::FlowError { .. }
                | Self::MalformedResponse { .. }
                | Self::TimedOut { .. }
                | Self::ProfileFetchFailed(_)
        )
    }
}

impl ErrorCode for AuthError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UserCancelled => "E_USER_CANCELLED",
            Self::ProviderUnavailable { .. } => "E_PROVIDER_UNAVAILABLE",
            Self::ProfileFetchFailed(_) => "E_PROFILE_FETCH_FAILED",
            Self::FlowError { .. } => "E_FLOW_ERROR",
            Self::MalformedResponse { .. } => "E_MALFORMED_RESPONSE",
            Self::TimedOut { .. } => "E_TIMED_OUT",
            Self::SignOutFailed { .. } => "E_SIGN_OUT_FAILED",
            Self::NotConfigured(_) => "E_NOT_CONFIGURED",
            Self::NotSignedIn => "E_NOT_SIGNED_IN",
            Self::Detached => "E_DETACHED",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::ProviderUnavailable { .. } | Self::TimedOut { .. } => true,
            Self::FlowError { source, .. } | Self::SignOutFailed { source, .. } => {
                matches!(source, ProviderError::Transport(_) | ProviderError::Status { status: 429 | 500..=599, .. })
            }
            Self::ProfileFetchFailed(source) => {
                matches!(source, ProviderError::Transport(_) | ProviderError::Status { status: 429 | 500..=599, .. })
            }
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
