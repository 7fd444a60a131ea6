//! Auth context — the handle UI components hold to read and drive the session.
//!
//! SYSTEM CONTEXT
//! ==============
//! The application root owns one `SessionManager` and hands out
//! `AuthContext` clones to every consumer. A default-constructed context is
//! detached: reads report a signed-out session and every action or setter
//! reports `Detached` instead of silently doing nothing.

use std::sync::Arc;

use tokio::sync::watch;

use crate::error::AuthError;
use crate::manager::{Outcome, SessionManager};
use crate::session::{Profile, Provider, SessionSnapshot, SessionState};

#[derive(Clone, Default)]
pub struct AuthContext {
    manager: Option<Arc<SessionManager>>,
}

impl AuthContext {
    #[must_use]
    pub fn new(manager: Arc<SessionManager>) -> Self {
        Self { manager: Some(manager) }
    }

    /// Context with no manager behind it.
    #[must_use]
    pub fn detached() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.manager.is_some()
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.manager.as_ref().map(|m| m.state()).unwrap_or_default()
    }

    #[must_use]
    pub fn is_signed(&self) -> bool {
        self.state().is_signed()
    }

    #[must_use]
    pub fn user_info(&self) -> Option<Profile> {
        self.state().user_info().cloned()
    }

    #[must_use]
    pub fn login_type(&self) -> Option<Provider> {
        self.state().login_type()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state().snapshot()
    }

    /// Change feed. A detached context yields a receiver pinned to
    /// `SignedOut` that never changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        match &self.manager {
            Some(manager) => manager.subscribe(),
            None => watch::channel(SessionState::SignedOut).1,
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.manager.as_ref().is_some_and(|m| m.is_pending())
    }

    // -------------------------------------------------------------------------
    // Actions
    // -------------------------------------------------------------------------

    pub async fn sign_in_social(&self) -> Outcome {
        match &self.manager {
            Some(manager) => manager.sign_in_social().await,
            None => detached("sign_in_social"),
        }
    }

    pub async fn sign_in_search_engine(&self) -> Outcome {
        match &self.manager {
            Some(manager) => manager.sign_in_search_engine().await,
            None => detached("sign_in_search_engine"),
        }
    }

    pub async fn sign_out(&self) -> Outcome {
        match &self.manager {
            Some(manager) => manager.sign_out().await,
            None => detached("sign_out"),
        }
    }

    pub fn cancel_pending(&self) {
        match &self.manager {
            Some(manager) => manager.cancel_pending(),
            None => {
                detached("cancel_pending");
            }
        }
    }

    // -------------------------------------------------------------------------
    // Setters
    // -------------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns `AuthError::Detached` without a manager.
    pub fn set_signed_in(&self, provider: Provider, profile: Profile) -> Result<(), AuthError> {
        self.attached()?.set_signed_in(provider, profile);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `AuthError::Detached` without a manager.
    pub fn set_signed_out(&self) -> Result<(), AuthError> {
        self.attached()?.set_signed_out();
        Ok(())
    }

    /// # Errors
    ///
    /// `Detached` without a manager, `NotSignedIn` without a session.
    pub fn set_user_info(&self, profile: Profile) -> Result<(), AuthError> {
        self.attached()?.set_user_info(profile)
    }

    /// # Errors
    ///
    /// `Detached` without a manager, `NotSignedIn` without a session.
    pub fn set_login_type(&self, provider: Provider) -> Result<(), AuthError> {
        self.attached()?.set_login_type(provider)
    }

    fn attached(&self) -> Result<&SessionManager, AuthError> {
        self.manager.as_deref().ok_or(AuthError::Detached)
    }
}

fn detached(action: &'static str) -> Outcome {
    tracing::warn!(action, "auth context used outside a session manager");
    Outcome::Detached
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
