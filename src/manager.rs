//! Session manager — sign-in/sign-out state machine over two providers.
//!
//! DESIGN
//! ======
//! The manager owns the session in a `watch` channel so every consumer
//! sees whole-state replacements. Each action drives one provider adapter,
//! classifies its failures into `AuthError`, and decides whether the
//! session is reset:
//!
//! - social: cancel leaves state alone, every failure resets;
//! - search-engine: failures follow `FailurePolicy` (default preserve);
//! - sign-out: failures leave state alone.
//!
//! Every adapter await is bounded by `provider_timeout` and raced against
//! a `CancellationToken` that `cancel_pending` trips.
//!
//! TRADE-OFFS
//! ==========
//! Concurrent sign-ins are not serialized. The last one to resolve wins;
//! callers that care gate their triggers on `is_pending`.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::config::{AuthConfig, FailurePolicy, SOCIAL_PERMISSIONS, SOCIAL_PROFILE_FIELDS};
use crate::error::{AuthError, ErrorCode, ProviderError};
use crate::providers::{LoginResult, SearchEngineAdapter, SocialAdapter};
use crate::session::{Profile, Provider, SessionState};

// =============================================================================
// OUTCOME
// =============================================================================

/// What an action did. Actions never return `Err`; failures land here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    SignedIn(Provider),
    SignedOut,
    /// The user dismissed the provider dialog.
    Cancelled,
    /// Interrupted by `cancel_pending`.
    Aborted,
    /// Nothing to do (sign-out while signed out).
    NoOp,
    /// The context handle has no manager behind it.
    Detached,
    /// `reset` reports whether the session was cleared as a result.
    Failed { error: AuthError, reset: bool },
}

impl Outcome {
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Why a guarded adapter call did not produce a provider result.
enum CallError {
    Provider(ProviderError),
    TimedOut,
    Aborted,
}

// =============================================================================
// SESSION MANAGER
// =============================================================================

pub struct SessionManager {
    config: AuthConfig,
    social: Arc<dyn SocialAdapter>,
    search_engine: Arc<dyn SearchEngineAdapter>,
    state: watch::Sender<SessionState>,
    configured: Mutex<bool>,
    cancel: Mutex<CancellationToken>,
    pending: AtomicUsize,
}

impl SessionManager {
    #[must_use]
    pub fn new(
        config: AuthConfig,
        social: Arc<dyn SocialAdapter>,
        search_engine: Arc<dyn SearchEngineAdapter>,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::SignedOut);
        Self {
            config,
            social,
            search_engine,
            state,
            configured: Mutex::new(false),
            cancel: Mutex::new(CancellationToken::new()),
            pending: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    // -------------------------------------------------------------------------
    // Initialization
    // -------------------------------------------------------------------------

    /// Register the search-engine adapter. Only the first successful call
    /// reaches the adapter; a failed attempt may be retried.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::FlowError` if the adapter rejects the registration.
    pub fn initialize(&self) -> Result<(), AuthError> {
        let mut configured = self.configured.lock().unwrap_or_else(PoisonError::into_inner);
        if *configured {
            tracing::debug!("search-engine adapter already configured");
            return Ok(());
        }

        self.search_engine
            .configure(&self.config.search_engine)
            .map_err(|source| AuthError::FlowError { provider: Provider::SearchEngine, source })?;
        *configured = true;
        tracing::info!(
            scopes = ?self.config.search_engine.scopes,
            offline_access = self.config.search_engine.offline_access,
            "search-engine adapter configured"
        );
        Ok(())
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        *self.configured.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state replacement.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// True while any action is awaiting a provider.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst) > 0
    }

    // -------------------------------------------------------------------------
    // Actions
    // -------------------------------------------------------------------------

    /// Social login: permission dialog, then field-scoped profile fetch.
    pub async fn sign_in_social(&self) -> Outcome {
        let provider = Provider::Social;
        let _pending = PendingGuard::enter(&self.pending);
        let token = self.current_token();

        let login = match self.guard(&token, self.social.log_in_with_permissions(SOCIAL_PERMISSIONS)).await {
            Ok(login) => login,
            Err(CallError::Aborted) => return aborted(provider),
            Err(CallError::TimedOut) => return self.fail_sign_in(provider, self.timed_out(provider)),
            Err(CallError::Provider(source)) => {
                return self.fail_sign_in(provider, AuthError::FlowError { provider, source });
            }
        };

        if login == LoginResult::Cancelled {
            let error = AuthError::UserCancelled;
            tracing::info!(%provider, code = error.error_code(), "{error}");
            return Outcome::Cancelled;
        }

        let profile = match self.guard(&token, self.social.fetch_profile(SOCIAL_PROFILE_FIELDS)).await {
            Ok(graph) => graph.into_profile().map_err(AuthError::ProfileFetchFailed),
            Err(CallError::Aborted) => return aborted(provider),
            Err(CallError::TimedOut) => Err(self.timed_out(provider)),
            Err(CallError::Provider(source)) => Err(AuthError::ProfileFetchFailed(source)),
        };

        match profile {
            Ok(profile) => self.complete_sign_in(provider, profile),
            Err(error) => self.fail_sign_in(provider, error),
        }
    }

    /// Search-engine sign-in: services check, then the SDK sign-in flow.
    pub async fn sign_in_search_engine(&self) -> Outcome {
        let provider = Provider::SearchEngine;
        if !self.is_configured() {
            return self.fail_sign_in(provider, AuthError::NotConfigured(provider));
        }

        let _pending = PendingGuard::enter(&self.pending);
        let token = self.current_token();

        match self.guard(&token, self.search_engine.has_play_services()).await {
            Ok(true) => {}
            Ok(false) => {
                let reason = "services not installed".to_string();
                return self.fail_sign_in(provider, AuthError::ProviderUnavailable { provider, reason });
            }
            Err(CallError::Aborted) => return aborted(provider),
            Err(CallError::TimedOut) => return self.fail_sign_in(provider, self.timed_out(provider)),
            Err(CallError::Provider(source)) => {
                let reason = match source {
                    ProviderError::Unavailable(reason) => reason,
                    other => other.to_string(),
                };
                return self.fail_sign_in(provider, AuthError::ProviderUnavailable { provider, reason });
            }
        }

        let response = match self.guard(&token, self.search_engine.sign_in()).await {
            Ok(response) => response,
            Err(CallError::Aborted) => return aborted(provider),
            Err(CallError::TimedOut) => return self.fail_sign_in(provider, self.timed_out(provider)),
            Err(CallError::Provider(source)) => {
                return self.fail_sign_in(provider, AuthError::FlowError { provider, source });
            }
        };

        match response.into_profile() {
            Ok(profile) => self.complete_sign_in(provider, profile),
            Err(e) => {
                let reason = e.to_string();
                self.fail_sign_in(provider, AuthError::MalformedResponse { provider, reason })
            }
        }
    }

    /// Sign out of whichever provider authenticated the session.
    pub async fn sign_out(&self) -> Outcome {
        let Some(provider) = self.state().login_type() else {
            tracing::debug!("sign-out with no active session");
            return Outcome::NoOp;
        };

        match provider {
            Provider::Social => {
                self.social.log_out();
                self.complete_sign_out(provider)
            }
            Provider::SearchEngine => {
                if !self.is_configured() {
                    return self.report(AuthError::NotConfigured(provider), false);
                }

                let _pending = PendingGuard::enter(&self.pending);
                let token = self.current_token();
                let search_engine = &self.search_engine;
                let revoke_then_sign_out = async {
                    search_engine.revoke_access().await?;
                    search_engine.sign_out().await
                };

                match self.guard(&token, revoke_then_sign_out).await {
                    Ok(()) => self.complete_sign_out(provider),
                    Err(CallError::Aborted) => aborted(provider),
                    Err(CallError::TimedOut) => self.report(self.timed_out(provider), false),
                    Err(CallError::Provider(source)) => {
                        self.report(AuthError::SignOutFailed { provider, source }, false)
                    }
                }
            }
        }
    }

    /// Abort every in-flight action. Later actions get a fresh token.
    pub fn cancel_pending(&self) {
        let mut token = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        token.cancel();
        *token = CancellationToken::new();
        tracing::info!("pending provider calls cancelled");
    }

    // -------------------------------------------------------------------------
    // Checked setters
    // -------------------------------------------------------------------------

    pub fn set_signed_in(&self, provider: Provider, profile: Profile) {
        self.state.send_replace(SessionState::signed_in(provider, profile));
    }

    pub fn set_signed_out(&self) {
        self.state.send_replace(SessionState::SignedOut);
    }

    /// Replace the profile of the active session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotSignedIn` when there is no session.
    pub fn set_user_info(&self, profile: Profile) -> Result<(), AuthError> {
        let mut result = Err(AuthError::NotSignedIn);
        self.state.send_if_modified(|state| match state {
            SessionState::SignedIn { profile: current, .. } => {
                result = Ok(());
                *current = profile;
                true
            }
            SessionState::SignedOut => false,
        });
        result
    }

    /// Re-tag the active session with another provider.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotSignedIn` when there is no session.
    pub fn set_login_type(&self, provider: Provider) -> Result<(), AuthError> {
        let mut result = Err(AuthError::NotSignedIn);
        self.state.send_if_modified(|state| match state {
            SessionState::SignedIn { provider: current, .. } => {
                result = Ok(());
                *current = provider;
                true
            }
            SessionState::SignedOut => false,
        });
        result
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn current_token(&self) -> CancellationToken {
        self.cancel.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    async fn guard<T, F>(&self, token: &CancellationToken, call: F) -> Result<T, CallError>
    where
        F: Future<Output = Result<T, ProviderError>>,
    {
        tokio::select! {
            () = token.cancelled() => Err(CallError::Aborted),
            res = tokio::time::timeout(self.config.provider_timeout, call) => match res {
                Ok(inner) => inner.map_err(CallError::Provider),
                Err(_) => Err(CallError::TimedOut),
            },
        }
    }

    fn timed_out(&self, provider: Provider) -> AuthError {
        AuthError::TimedOut { provider, secs: self.config.provider_timeout.as_secs() }
    }

    fn complete_sign_in(&self, provider: Provider, profile: Profile) -> Outcome {
        tracing::info!(%provider, name = %profile.name, "signed in");
        self.state.send_replace(SessionState::signed_in(provider, profile));
        Outcome::SignedIn(provider)
    }

    fn complete_sign_out(&self, provider: Provider) -> Outcome {
        tracing::info!(%provider, "signed out");
        self.state.send_replace(SessionState::SignedOut);
        Outcome::SignedOut
    }

    /// Flow failures reset a social attempt unconditionally and a
    /// search-engine attempt only under `FailurePolicy::Reset`.
    fn resets_on(&self, provider: Provider, error: &AuthError) -> bool {
        if !error.is_flow_failure() {
            return false;
        }
        match provider {
            Provider::Social => true,
            Provider::SearchEngine => self.config.search_engine_failure_policy == FailurePolicy::Reset,
        }
    }

    fn fail_sign_in(&self, provider: Provider, error: AuthError) -> Outcome {
        let reset = self.resets_on(provider, &error);
        self.report(error, reset)
    }

    fn report(&self, error: AuthError, reset: bool) -> Outcome {
        tracing::error!(
            error = %error,
            code = error.error_code(),
            retryable = error.retryable(),
            reset,
            "auth action failed"
        );
        if reset {
            self.state.send_replace(SessionState::SignedOut);
        }
        Outcome::Failed { error, reset }
    }
}

fn aborted(provider: Provider) -> Outcome {
    tracing::info!(%provider, "provider call aborted");
    Outcome::Aborted
}

/// Counts an action as in flight until dropped.
struct PendingGuard<'a>(&'a AtomicUsize);

impl<'a> PendingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "manager_test.rs"]
mod tests;
