//! Error types for authentication operations.
//!
//! Only [`AuthError`] ever reaches a caller. Everything the session recovers
//! from locally is logged under a [`RecoveredFailure`] tag instead.

use crate::constants::messages;
use authstate_runtime::StoreError;
use thiserror::Error;

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Caller-visible failure of a session operation.
///
/// Display strings are meant for end users. Provider detail is logged, never
/// placed in the message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The provider rejected the email/password pair (or the sign-in call
    /// failed for any other reason).
    #[error("Please check your email and password")]
    InvalidCredentials,

    /// Registration failed.
    #[error("There was an error signing up")]
    SignUpFailed,

    /// The session can no longer process operations.
    #[error("Authentication is unavailable: {0}")]
    Unavailable(#[from] StoreError),
}

impl AuthError {
    /// Message shown to the user.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => messages::INVALID_CREDENTIALS,
            Self::SignUpFailed => messages::SIGN_UP_FAILED,
            Self::Unavailable(_) => messages::UNAVAILABLE,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Provider Errors
// ═══════════════════════════════════════════════════════════════════════

/// Failure reported by an [`IdentityProvider`](crate::providers::IdentityProvider)
/// or a [`FlagStore`](crate::providers::FlagStore).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// No current session exists (or it expired).
    #[error("No current session")]
    NoSession,

    /// Credentials were rejected.
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    /// Registration collided with an existing account.
    #[error("Username already exists: {0}")]
    UsernameExists(String),

    /// The request was malformed (e.g. weak password).
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The provider could not be reached.
    #[error("Network error: {0}")]
    Network(String),

    /// Local persistence failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

// ═══════════════════════════════════════════════════════════════════════
// Recovered Failures
// ═══════════════════════════════════════════════════════════════════════

/// Failures handled locally and never surfaced to callers.
///
/// Used as the `failure` field on the log record for the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecoveredFailure {
    /// The startup session check failed; treated as "no session".
    Probe,
    /// Remote sign-out failed; local state signs out anyway.
    SignOutRemote,
    /// The post-sign-in flag write failed; sign-in still succeeds.
    PersistenceWrite,
}

impl RecoveredFailure {
    /// Tag value for the `failure` log field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Probe => "probe",
            Self::SignOutRemote => "sign_out_remote",
            Self::PersistenceWrite => "persistence_write",
        }
    }
}

impl std::fmt::Display for RecoveredFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
