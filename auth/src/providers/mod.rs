//! Provider traits for external dependencies.
//!
//! These traits abstract over the identity service and local persistence so
//! the session logic can be tested without either.
//!
//! # Implementation Notes
//!
//! - Each call either succeeds or fails outright; implementations do not
//!   retry on behalf of the session
//! - Returned futures must be `Send` so they can run in spawned effects

pub mod flag_store;

pub use crate::error::ProviderError;
pub use flag_store::SessionFlagStore;

use crate::state::AuthUser;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::future::Future;

/// Result type for provider calls.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

// ═══════════════════════════════════════════════════════════════════════
// Identity Provider
// ═══════════════════════════════════════════════════════════════════════

/// Registration request sent to the identity provider.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct SignUpRequest {
    /// Provider username (the account email).
    pub username: String,

    /// Account password.
    pub password: String,

    /// Profile attributes (`email`, `name`).
    pub attributes: Map<String, Value>,
}

impl std::fmt::Debug for SignUpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignUpRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("attributes", &self.attributes)
            .finish()
    }
}

/// Registration outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignUpResult {
    /// The newly created identity.
    pub user: AuthUser,
}

/// Remote identity service.
///
/// Mirrors the four calls a hosted user pool offers a client.
pub trait IdentityProvider: Send + Sync {
    /// Fetch the currently signed-in user.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::NoSession`] when nobody is signed in or the session expired
    /// - [`ProviderError::Network`] when the provider cannot be reached
    fn current_session(&self) -> impl Future<Output = ProviderResult<AuthUser>> + Send;

    /// Authenticate with email and password.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::NotAuthorized`] for a bad email/password pair
    /// - [`ProviderError::Network`] when the provider cannot be reached
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = ProviderResult<AuthUser>> + Send;

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::UsernameExists`] if the account already exists
    /// - [`ProviderError::InvalidParameter`] for rejected input
    /// - [`ProviderError::Network`] when the provider cannot be reached
    fn sign_up(
        &self,
        request: SignUpRequest,
    ) -> impl Future<Output = ProviderResult<SignUpResult>> + Send;

    /// End the remote session.
    ///
    /// # Errors
    ///
    /// Returns error if the provider cannot be reached.
    fn sign_out(&self) -> impl Future<Output = ProviderResult<()>> + Send;
}

// ═══════════════════════════════════════════════════════════════════════
// Flag Store
// ═══════════════════════════════════════════════════════════════════════

/// Small key/value persistence for session flags.
pub trait FlagStore: Send + Sync {
    /// Write a flag.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Storage`] if the write fails.
    fn set_flag(&self, key: &str, value: &str) -> impl Future<Output = ProviderResult<()>> + Send;
}
