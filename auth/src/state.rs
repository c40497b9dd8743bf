//! Authentication state types.
//!
//! [`AuthState`] is the single record consumers read. It only changes
//! through [`AuthState::apply`], which maps a [`Transition`] onto a new
//! state without side effects.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ═══════════════════════════════════════════════════════════════════════
// Identity
// ═══════════════════════════════════════════════════════════════════════

/// Identity record returned by the identity provider.
///
/// The state machine only cares whether a user is present; the attribute
/// map is carried through untouched for consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Provider username (the email address for email sign-in).
    pub username: String,

    /// Provider attributes (e.g. `email`, `name`).
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl AuthUser {
    /// Create a user with no attributes.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            attributes: Map::new(),
        }
    }

    /// Add an attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Look up a string attribute.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// State
// ═══════════════════════════════════════════════════════════════════════

/// Root authentication state.
///
/// Invariants, held after every transition:
/// - `is_authenticated == user.is_some()`
/// - `is_loading` starts `true` and becomes `false` on the first
///   [`Transition::Initialize`]; it never goes back to `true`
///
/// # Examples
///
/// ```
/// # use authstate::AuthState;
/// let state = AuthState::default();
/// assert!(state.is_loading);
/// assert!(!state.is_authenticated);
/// assert!(state.user.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthState {
    /// Whether a user is signed in.
    pub is_authenticated: bool,

    /// Whether the startup session check is still outstanding.
    pub is_loading: bool,

    /// The signed-in user.
    pub user: Option<AuthUser>,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            is_authenticated: false,
            is_loading: true,
            user: None,
        }
    }
}

/// Coarse view of [`AuthState`] for consumers that branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthStatus {
    /// Startup session check has not finished.
    Loading,
    /// A user is signed in.
    Authenticated,
    /// Nobody is signed in.
    Unauthenticated,
}

impl AuthStatus {
    /// Status name for logs and metrics labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Authenticated => "authenticated",
            Self::Unauthenticated => "unauthenticated",
        }
    }
}

/// A state transition.
///
/// Transitions are the only way [`AuthState`] changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Transition {
    /// Startup session check finished, with the user it found (if any).
    Initialize(Option<AuthUser>),

    /// A user signed in (or registered, or re-identified).
    SignedIn(AuthUser),

    /// The user signed out.
    SignedOut,
}

impl AuthState {
    /// Apply a transition, returning the new state.
    ///
    /// - `Initialize(Some(user))`: authenticated as `user`, loading finished
    /// - `Initialize(None)`: loading finished, authentication untouched
    /// - `SignedIn(user)`: authenticated as `user` (overwrites any previous user)
    /// - `SignedOut`: no user
    ///
    /// # Examples
    ///
    /// ```
    /// # use authstate::{AuthState, AuthUser, Transition};
    /// let state = AuthState::default().apply(Transition::Initialize(None));
    /// assert!(!state.is_loading);
    ///
    /// let state = state.apply(Transition::SignedIn(AuthUser::new("a@b.com")));
    /// assert!(state.is_authenticated);
    /// ```
    #[must_use]
    pub fn apply(&self, transition: Transition) -> Self {
        match transition {
            Transition::Initialize(Some(user)) => Self {
                is_authenticated: true,
                is_loading: false,
                user: Some(user),
            },
            Transition::Initialize(None) => Self {
                is_loading: false,
                ..self.clone()
            },
            Transition::SignedIn(user) => Self {
                is_authenticated: true,
                user: Some(user),
                ..self.clone()
            },
            Transition::SignedOut => Self {
                is_authenticated: false,
                user: None,
                ..self.clone()
            },
        }
    }

    /// Current coarse status.
    #[must_use]
    pub const fn status(&self) -> AuthStatus {
        if self.is_loading {
            AuthStatus::Loading
        } else if self.is_authenticated {
            AuthStatus::Authenticated
        } else {
            AuthStatus::Unauthenticated
        }
    }
}
