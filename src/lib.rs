//! Authentication session state over a social login provider and a
//! search-engine sign-in provider.
//!
//! ARCHITECTURE
//! ============
//! - `providers`: adapter traits the vendor SDK bridges implement, plus a
//!   Graph API client for the social profile fetch.
//! - `manager`: the sign-in/sign-out state machine.
//! - `context`: the clonable handle consumers hold.
//! - `session`: the session enum and its JSON snapshot.

pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod manager;
pub mod providers;
pub mod session;

pub use config::{AuthConfig, FailurePolicy, SearchEngineConfig};
pub use context::AuthContext;
pub use error::{AuthError, ErrorCode, ProviderError};
pub use manager::{Outcome, SessionManager};
pub use providers::{SearchEngineAdapter, SocialAdapter};
pub use session::{Profile, Provider, SessionSnapshot, SessionState};
