use super::test_helpers::*;
use super::*;
use std::time::Duration;

use serde_json::json;

use crate::providers::SearchEngineSignIn;

fn short_timeout_config() -> AuthConfig {
    AuthConfig { provider_timeout: Duration::from_millis(50), ..AuthConfig::default() }
}

// =========================================================================
// initialize
// =========================================================================

#[test]
fn initialize_passes_scopes_client_id_and_offline_flag() {
    let mut config = test_config();
    config.search_engine.web_client_id = "web-123".into();
    let (manager, _, search) = test_manager_with(config, MockSocial::granting(), MockSearchEngine::signing_in());

    manager.initialize().unwrap();

    let registered = search.last_config.lock().unwrap().clone().unwrap();
    assert_eq!(registered.scopes, vec!["email".to_string()]);
    assert_eq!(registered.web_client_id, "web-123");
    assert!(registered.offline_access);
    assert!(manager.is_configured());
}

#[tokio::test]
async fn initialize_twice_configures_once_and_signs_in_normally() {
    let (manager, _, search) = test_manager();

    manager.initialize().unwrap();
    manager.initialize().unwrap();
    assert_eq!(search.configures(), 1);

    assert_eq!(manager.sign_in_search_engine().await, Outcome::SignedIn(Provider::SearchEngine));
    assert_eq!(manager.state().user_info(), Some(&cy()));
}

#[test]
fn failed_initialize_can_be_retried() {
    let search = MockSearchEngine::signing_in();
    *search.configure_result.lock().unwrap() = Err(ProviderError::Transport("bridge down".into()));
    let (manager, _, search) = test_manager_with(test_config(), MockSocial::granting(), search);

    assert!(matches!(manager.initialize(), Err(AuthError::FlowError { .. })));
    assert!(!manager.is_configured());

    *search.configure_result.lock().unwrap() = Ok(());
    manager.initialize().unwrap();
    assert!(manager.is_configured());
    assert_eq!(search.configures(), 2);
}

// =========================================================================
// sign_in_social
// =========================================================================

#[tokio::test]
async fn social_sign_in_populates_session() {
    let (manager, social, _) = test_manager();

    let outcome = manager.sign_in_social().await;

    assert_eq!(outcome, Outcome::SignedIn(Provider::Social));
    let state = manager.state();
    assert!(state.is_signed());
    assert_eq!(state.login_type(), Some(Provider::Social));
    assert_eq!(state.user_info(), Some(&ana()));
    assert_eq!(social.logins(), 1);
    assert_eq!(social.fetches(), 1);
    assert_eq!(*social.last_scopes.lock().unwrap(), vec!["public_profile", "email"]);
    assert_eq!(*social.last_fields.lock().unwrap(), vec!["name", "email", "picture"]);
}

#[tokio::test]
async fn social_sign_in_example_snapshot() {
    let (manager, _, _) = test_manager();

    manager.sign_in_social().await;

    let value = serde_json::to_value(manager.state().snapshot()).unwrap();
    assert_eq!(
        value,
        json!({
            "isSigned": true,
            "loginType": "social",
            "userInfo": { "name": "Ana", "email": "ana@x.com", "photo": "http://x/p.jpg" },
        })
    );
}

#[tokio::test]
async fn social_cancel_from_signed_out_stays_signed_out() {
    let social = MockSocial::new(Script::ok(LoginResult::Cancelled), Script::ok(ana_graph()));
    let (manager, social, _) = test_manager_with(test_config(), social, MockSearchEngine::signing_in());

    assert_eq!(manager.sign_in_social().await, Outcome::Cancelled);

    assert_eq!(manager.state(), SessionState::SignedOut);
    assert_eq!(social.fetches(), 0);
}

#[tokio::test]
async fn social_cancel_keeps_existing_session() {
    let (manager, social, _) = test_manager();
    manager.sign_in_search_engine().await;
    *social.login.lock().unwrap() = Script::ok(LoginResult::Cancelled);

    assert_eq!(manager.sign_in_social().await, Outcome::Cancelled);

    assert_eq!(manager.state(), SessionState::signed_in(Provider::SearchEngine, cy()));
}

#[tokio::test]
async fn social_profile_fetch_failure_fully_resets() {
    let (manager, social, _) = test_manager();
    manager.sign_in_social().await;
    *social.profile.lock().unwrap() =
        Script::err(ProviderError::Status { status: 400, body: "bad token".into() });

    let outcome = manager.sign_in_social().await;

    assert!(matches!(
        outcome,
        Outcome::Failed { error: AuthError::ProfileFetchFailed(ProviderError::Status { status: 400, .. }), reset: true }
    ));
    assert_eq!(manager.state(), SessionState::SignedOut);
    assert!(manager.state().snapshot().user_info.is_empty());
}

#[tokio::test]
async fn social_profile_without_name_counts_as_fetch_failure() {
    let social = MockSocial::new(
        Script::ok(LoginResult::Granted { access_token: Some("tok".into()) }),
        Script::ok(crate::providers::GraphProfile::default()),
    );
    let (manager, _, _) = test_manager_with(test_config(), social, MockSearchEngine::signing_in());

    let outcome = manager.sign_in_social().await;

    assert!(matches!(outcome, Outcome::Failed { error: AuthError::ProfileFetchFailed(ProviderError::Decode(_)), .. }));
    assert!(!manager.state().is_signed());
}

#[tokio::test]
async fn social_flow_error_resets_existing_session() {
    let (manager, social, _) = test_manager();
    manager.sign_in_social().await;
    *social.login.lock().unwrap() = Script::err(ProviderError::Transport("offline".into()));

    let outcome = manager.sign_in_social().await;

    assert!(matches!(
        outcome,
        Outcome::Failed { error: AuthError::FlowError { provider: Provider::Social, .. }, reset: true }
    ));
    assert_eq!(manager.state(), SessionState::SignedOut);
    assert_eq!(social.fetches(), 1);
}

// =========================================================================
// sign_in_search_engine
// =========================================================================

#[tokio::test]
async fn search_engine_sign_in_populates_session() {
    let (manager, _, search) = test_manager();

    let outcome = manager.sign_in_search_engine().await;

    assert_eq!(outcome, Outcome::SignedIn(Provider::SearchEngine));
    let snapshot = manager.state().snapshot();
    assert!(snapshot.is_signed);
    assert_eq!(snapshot.login_type, Some(Provider::SearchEngine));
    assert_eq!(snapshot.user_info.name.as_deref(), Some("Cy"));
    assert_eq!(snapshot.user_info.photo.as_deref(), Some("http://g/c.png"));
    assert_eq!(snapshot.user_info.email.as_deref(), Some("cy@g.com"));
    assert_eq!(search.sign_ins(), 1);
}

#[tokio::test]
async fn search_engine_without_initialize_is_not_configured() {
    let (manager, _, search) =
        test_manager_with(test_config(), MockSocial::granting(), MockSearchEngine::signing_in());

    let outcome = manager.sign_in_search_engine().await;

    assert_eq!(
        outcome,
        Outcome::Failed { error: AuthError::NotConfigured(Provider::SearchEngine), reset: false }
    );
    assert_eq!(search.sign_ins(), 0);
}

#[tokio::test]
async fn search_engine_unavailable_preserves_session_by_default() {
    let (manager, _, search) = test_manager();
    manager.sign_in_social().await;
    *search.play_services.lock().unwrap() = Script::ok(false);

    let outcome = manager.sign_in_search_engine().await;

    assert!(matches!(
        outcome,
        Outcome::Failed { error: AuthError::ProviderUnavailable { .. }, reset: false }
    ));
    assert_eq!(manager.state(), SessionState::signed_in(Provider::Social, ana()));
    assert_eq!(search.sign_ins(), 0);
}

#[tokio::test]
async fn search_engine_services_error_carries_reason() {
    let (manager, _, search) = test_manager();
    *search.play_services.lock().unwrap() = Script::err(ProviderError::Unavailable("outdated".into()));

    let outcome = manager.sign_in_search_engine().await;

    match outcome {
        Outcome::Failed { error: AuthError::ProviderUnavailable { reason, .. }, .. } => assert_eq!(reason, "outdated"),
        other => panic!("expected unavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn search_engine_failure_resets_under_reset_policy() {
    let config = AuthConfig { search_engine_failure_policy: FailurePolicy::Reset, ..test_config() };
    let (manager, _, search) = test_manager_with(config, MockSocial::granting(), MockSearchEngine::signing_in());
    manager.initialize().unwrap();
    manager.sign_in_social().await;
    *search.sign_in.lock().unwrap() = Script::err(ProviderError::Transport("dialog crashed".into()));

    let outcome = manager.sign_in_search_engine().await;

    assert!(matches!(outcome, Outcome::Failed { error: AuthError::FlowError { .. }, reset: true }));
    assert_eq!(manager.state(), SessionState::SignedOut);
}

fn reset_policy_manager() -> (Arc<SessionManager>, Arc<MockSocial>, Arc<MockSearchEngine>) {
    let config = AuthConfig {
        search_engine_failure_policy: FailurePolicy::Reset,
        provider_timeout: Duration::from_millis(50),
        ..AuthConfig::default()
    };
    let (manager, social, search) = test_manager_with(config, MockSocial::granting(), MockSearchEngine::signing_in());
    manager.initialize().unwrap();
    (manager, social, search)
}

#[tokio::test]
async fn search_engine_timeout_counts_as_flow_failure_under_reset_policy() {
    let (manager, _, search) = reset_policy_manager();
    manager.sign_in_social().await;
    *search.sign_in.lock().unwrap() = Script::Hang;

    let outcome = manager.sign_in_search_engine().await;

    assert!(matches!(outcome, Outcome::Failed { error: AuthError::TimedOut { .. }, reset: true }));
    assert_eq!(manager.state(), SessionState::SignedOut);
}

#[tokio::test]
async fn search_engine_malformed_response_resets_under_reset_policy() {
    let (manager, _, search) = reset_policy_manager();
    manager.sign_in_social().await;
    *search.sign_in.lock().unwrap() = Script::ok(SearchEngineSignIn { user: None });

    let outcome = manager.sign_in_search_engine().await;

    assert!(matches!(outcome, Outcome::Failed { error: AuthError::MalformedResponse { .. }, reset: true }));
    assert!(!manager.state().is_signed());
}

#[tokio::test]
async fn not_configured_never_resets_even_under_reset_policy() {
    let config = AuthConfig { search_engine_failure_policy: FailurePolicy::Reset, ..test_config() };
    let (manager, _, _) = test_manager_with(config, MockSocial::granting(), MockSearchEngine::signing_in());
    manager.sign_in_social().await;

    let outcome = manager.sign_in_search_engine().await;

    assert_eq!(
        outcome,
        Outcome::Failed { error: AuthError::NotConfigured(Provider::SearchEngine), reset: false }
    );
    assert_eq!(manager.state(), SessionState::signed_in(Provider::Social, ana()));
}

#[tokio::test]
async fn sign_out_timeout_keeps_session_under_reset_policy() {
    let (manager, _, search) = reset_policy_manager();
    manager.sign_in_search_engine().await;
    *search.revoke.lock().unwrap() = Script::Hang;

    let outcome = manager.sign_out().await;

    assert!(matches!(outcome, Outcome::Failed { error: AuthError::TimedOut { .. }, reset: false }));
    assert!(manager.state().is_signed());
}

#[test]
fn reset_decision_follows_provider_and_policy() {
    let (preserve, _, _) = test_manager();
    let (reset, _, _) = reset_policy_manager();
    let timed_out = AuthError::TimedOut { provider: Provider::SearchEngine, secs: 1 };

    assert!(preserve.resets_on(Provider::Social, &timed_out));
    assert!(!preserve.resets_on(Provider::SearchEngine, &timed_out));
    assert!(reset.resets_on(Provider::SearchEngine, &timed_out));
    assert!(!reset.resets_on(Provider::Social, &AuthError::UserCancelled));
    assert!(!reset.resets_on(Provider::SearchEngine, &AuthError::NotConfigured(Provider::SearchEngine)));
}

#[tokio::test]
async fn search_engine_response_without_user_is_malformed() {
    let (manager, _, search) = test_manager();
    *search.sign_in.lock().unwrap() = Script::ok(SearchEngineSignIn { user: None });

    let outcome = manager.sign_in_search_engine().await;

    assert!(matches!(
        outcome,
        Outcome::Failed { error: AuthError::MalformedResponse { provider: Provider::SearchEngine, .. }, reset: false }
    ));
    assert!(!manager.state().is_signed());
}

// =========================================================================
// sign_out
// =========================================================================

#[tokio::test]
async fn social_sign_out_resets_and_clears_provider() {
    let (manager, social, search) = test_manager();
    manager.sign_in_social().await;

    assert_eq!(manager.sign_out().await, Outcome::SignedOut);

    let state = manager.state();
    assert!(!state.is_signed());
    assert!(state.user_info().is_none());
    assert!(state.login_type().is_none());
    assert_eq!(social.logouts(), 1);
    assert_eq!(search.revokes(), 0);
}

#[tokio::test]
async fn search_engine_sign_out_revokes_then_signs_out() {
    let (manager, social, search) = test_manager();
    manager.sign_in_search_engine().await;

    assert_eq!(manager.sign_out().await, Outcome::SignedOut);

    assert_eq!(manager.state(), SessionState::SignedOut);
    assert_eq!(search.revokes(), 1);
    assert_eq!(search.sign_outs(), 1);
    assert_eq!(social.logouts(), 0);
}

#[tokio::test]
async fn search_engine_revoke_failure_keeps_session() {
    let (manager, _, search) = test_manager();
    manager.sign_in_search_engine().await;
    *search.revoke.lock().unwrap() = Script::err(ProviderError::Transport("offline".into()));

    let outcome = manager.sign_out().await;

    assert!(matches!(
        outcome,
        Outcome::Failed { error: AuthError::SignOutFailed { provider: Provider::SearchEngine, .. }, reset: false }
    ));
    assert_eq!(manager.state(), SessionState::signed_in(Provider::SearchEngine, cy()));
    assert_eq!(search.sign_outs(), 0);
}

#[tokio::test]
async fn sign_out_when_signed_out_is_noop() {
    let (manager, social, search) = test_manager();
    let rx = manager.subscribe();

    assert_eq!(manager.sign_out().await, Outcome::NoOp);

    assert_eq!(social.logouts(), 0);
    assert_eq!(search.revokes(), 0);
    assert_eq!(search.sign_outs(), 0);
    assert!(!rx.has_changed().unwrap());
}

// =========================================================================
// timeouts and cancellation
// =========================================================================

#[tokio::test]
async fn hung_social_login_times_out_and_resets() {
    let social = MockSocial::new(Script::Hang, Script::ok(ana_graph()));
    let (manager, _, _) = test_manager_with(short_timeout_config(), social, MockSearchEngine::signing_in());

    let outcome = manager.sign_in_social().await;

    assert!(matches!(
        outcome,
        Outcome::Failed { error: AuthError::TimedOut { provider: Provider::Social, .. }, reset: true }
    ));
    assert!(!manager.is_pending());
}

#[tokio::test]
async fn hung_search_engine_sign_out_times_out_and_keeps_session() {
    let (manager, _, search) =
        test_manager_with(short_timeout_config(), MockSocial::granting(), MockSearchEngine::signing_in());
    manager.initialize().unwrap();
    manager.sign_in_search_engine().await;
    *search.sign_out.lock().unwrap() = Script::Hang;

    let outcome = manager.sign_out().await;

    assert!(matches!(outcome, Outcome::Failed { error: AuthError::TimedOut { .. }, reset: false }));
    assert!(manager.state().is_signed());
}

#[tokio::test]
async fn cancel_pending_aborts_in_flight_sign_in() {
    let social = MockSocial::new(Script::Hang, Script::ok(ana_graph()));
    let (manager, _, _) = test_manager_with(test_config(), social, MockSearchEngine::signing_in());

    let task = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.sign_in_social().await })
    };
    while !manager.is_pending() {
        tokio::task::yield_now().await;
    }

    manager.cancel_pending();
    let outcome = task.await.unwrap();

    assert_eq!(outcome, Outcome::Aborted);
    assert_eq!(manager.state(), SessionState::SignedOut);
    assert!(!manager.is_pending());
}

#[tokio::test]
async fn actions_after_cancel_use_a_fresh_token() {
    let (manager, _, _) = test_manager();

    manager.cancel_pending();

    assert_eq!(manager.sign_in_social().await, Outcome::SignedIn(Provider::Social));
}

// =========================================================================
// subscription and setters
// =========================================================================

#[tokio::test]
async fn subscribers_observe_each_transition() {
    let (manager, _, _) = test_manager();
    let mut rx = manager.subscribe();

    manager.sign_in_social().await;
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().login_type(), Some(Provider::Social));

    manager.sign_out().await;
    rx.changed().await.unwrap();
    assert!(!rx.borrow_and_update().is_signed());
}

#[test]
fn set_user_info_requires_session() {
    let (manager, _, _) = test_manager();

    assert_eq!(manager.set_user_info(cy()), Err(AuthError::NotSignedIn));
    assert_eq!(manager.set_login_type(Provider::Social), Err(AuthError::NotSignedIn));
    assert_eq!(manager.state(), SessionState::SignedOut);
}

#[test]
fn setters_replace_fields_of_active_session() {
    let (manager, _, _) = test_manager();
    manager.set_signed_in(Provider::Social, ana());

    manager.set_user_info(cy()).unwrap();
    manager.set_login_type(Provider::SearchEngine).unwrap();
    assert_eq!(manager.state(), SessionState::signed_in(Provider::SearchEngine, cy()));

    manager.set_signed_out();
    assert_eq!(manager.state(), SessionState::SignedOut);
}
