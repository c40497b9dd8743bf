//! # Authstate
//!
//! Client-side authentication state: one observable record of who is signed
//! in, kept consistent with an external identity provider.
//!
//! ## Features
//!
//! - **Startup check**: resolves the loading phase exactly once per session
//! - **Operations**: sign-in, sign-up and sign-out with user-facing errors
//! - **Observable**: every state change is published before the operation
//!   that caused it returns
//! - **Testable**: the state machine is a pure reducer; providers are traits
//!   with in-memory mocks
//!
//! ## Architecture
//!
//! Authentication is implemented as reducers and effects:
//!
//! ```text
//! Action → Reducer → (State, Effects) → Effect Execution → More Actions
//! ```
//!
//! The only way [`AuthState`] changes is [`AuthState::apply`] with a
//! [`Transition`]. Provider calls run inside effects and report back with
//! events; [`AuthSession`] matches each caller to its own result.
//!
//! ## Example
//!
//! ```rust
//! use authstate::mocks::{MockFlagStore, MockIdentityProvider};
//! use authstate::AuthSession;
//!
//! # tokio_test::block_on(async {
//! let provider = MockIdentityProvider::new().with_user("a@b.com", "password1");
//! let session = AuthSession::new(provider, MockFlagStore::new());
//!
//! session.ensure_initialized().await;
//! assert!(!session.is_loading().await);
//!
//! session.sign_in("a@b.com", "password1").await?;
//! assert!(session.is_authenticated().await);
//!
//! session.sign_out().await;
//! assert!(session.user().await.is_none());
//! # Ok::<(), authstate::AuthError>(())
//! # }).unwrap();
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod actions;
pub mod config;
pub mod constants;
pub mod environment;
pub mod error;
pub mod probe;
pub mod providers;
pub mod reducers;
pub mod session;
pub mod state;

#[cfg(feature = "test-utils")]
pub mod mocks;

// Re-export main types for convenience
pub use actions::AuthAction;
pub use config::AuthConfig;
pub use environment::AuthEnvironment;
pub use error::{AuthError, ProviderError, RecoveredFailure, Result};
pub use probe::probe_session;
pub use providers::{FlagStore, IdentityProvider, SessionFlagStore, SignUpRequest, SignUpResult};
pub use reducers::AuthReducer;
pub use session::{AuthSession, AuthStore};
pub use state::{AuthState, AuthStatus, AuthUser, Transition};
