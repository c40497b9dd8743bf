//! Authentication session: the consumer-facing entry point.
//!
//! An [`AuthSession`] owns one [`AuthState`] (through a store) and exposes
//! the startup check, the sign-in/sign-up/sign-out operations and read
//! access. Clones share the same state and the same initialization latch.
//!
//! ```text
//! caller ── sign_in ──► SignIn{id} ──► reducer ──► effect (provider call)
//!    ▲                                                  │
//!    └──────── terminal event with the same id ◄────────┘
//! ```

use crate::actions::AuthAction;
use crate::config::AuthConfig;
use crate::environment::AuthEnvironment;
use crate::error::{AuthError, Result};
use crate::providers::{FlagStore, IdentityProvider};
use crate::reducers::AuthReducer;
use crate::state::{AuthState, AuthUser};
use authstate_runtime::Store;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use uuid::Uuid;

/// Store type backing an [`AuthSession`].
pub type AuthStore<P, F> = Store<AuthState, AuthAction, AuthEnvironment<P, F>, AuthReducer<P, F>>;

/// Authentication session root.
pub struct AuthSession<P, F>
where
    P: IdentityProvider + 'static,
    F: FlagStore + 'static,
{
    store: AuthStore<P, F>,
    initialized: Arc<AtomicBool>,
    config: Arc<AuthConfig>,
}

impl<P, F> Clone for AuthSession<P, F>
where
    P: IdentityProvider + 'static,
    F: FlagStore + 'static,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            initialized: Arc::clone(&self.initialized),
            config: Arc::clone(&self.config),
        }
    }
}

impl<P, F> AuthSession<P, F>
where
    P: IdentityProvider + 'static,
    F: FlagStore + 'static,
{
    /// Create a session with default configuration.
    ///
    /// The state starts in its loading phase; call
    /// [`AuthSession::ensure_initialized`] to resolve it.
    #[must_use]
    pub fn new(provider: P, flags: F) -> Self {
        Self::with_config(provider, flags, AuthConfig::default())
    }

    /// Create a session with custom configuration.
    #[must_use]
    pub fn with_config(provider: P, flags: F, config: AuthConfig) -> Self {
        let environment = AuthEnvironment::new(provider, flags).with_flag_key(&config.flag_key);
        let store = Store::with_config(
            AuthState::default(),
            AuthReducer::new(),
            environment,
            config.store_config(),
        );

        Self {
            store,
            initialized: Arc::new(AtomicBool::new(false)),
            config: Arc::new(config),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Startup
    // ═══════════════════════════════════════════════════════════════════════

    /// Run the startup session check, once per session.
    ///
    /// The first call claims the latch before it awaits anything, runs the
    /// check and returns `true` once the state has left its loading phase.
    /// Every other call, including one made while the first check is still
    /// running, returns `false` immediately. Use
    /// [`AuthSession::wait_until_loaded`] to wait for the result instead.
    ///
    /// After shutdown no check can start: the latch is released again and
    /// the call returns `false`.
    #[tracing::instrument(skip_all, name = "auth_ensure_initialized")]
    pub async fn ensure_initialized(&self) -> bool {
        if self.initialized.swap(true, Ordering::AcqRel) {
            tracing::trace!("Session check already started");
            return false;
        }

        let mut handle = match self.store.send(AuthAction::ProbeSession).await {
            Ok(handle) => handle,
            Err(error) => {
                tracing::error!(%error, "Could not start session check");
                self.initialized.store(false, Ordering::Release);
                return false;
            },
        };

        match self.config.operation_timeout {
            Some(limit) => {
                if let Err(error) = handle.wait_with_timeout(limit).await {
                    tracing::warn!(%error, "Session check still running");
                }
            },
            None => handle.wait().await,
        }

        true
    }

    /// Wait until the startup check has resolved, without triggering it.
    ///
    /// Returns the first state observed with `is_loading == false`.
    pub async fn wait_until_loaded(&self) -> AuthState {
        let mut rx = self.store.subscribe();
        let loaded = rx
            .wait_for(|state| !state.is_loading)
            .await
            .map(|state| AuthState::clone(&state));

        match loaded {
            Ok(state) => state,
            Err(_) => self.state().await,
        }
    }

    /// Whether [`AuthSession::ensure_initialized`] has been called.
    #[must_use]
    pub fn initialization_started(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Operations
    // ═══════════════════════════════════════════════════════════════════════

    /// Sign in with email and password.
    ///
    /// On success the state holds the signed-in user before this returns.
    /// The sign-in flag is written afterwards in the background; a slow or
    /// failing flag store never delays or undoes the sign-in.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidCredentials`] if the provider rejected the sign-in;
    ///   state is unchanged
    /// - [`AuthError::Unavailable`] if the session is shut down or the
    ///   configured operation timeout expired
    #[tracing::instrument(skip_all, name = "auth_sign_in")]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<()> {
        let correlation_id = Uuid::new_v4();
        tracing::debug!(%correlation_id, "Signing in");

        let outcome = self
            .request(
                AuthAction::SignIn {
                    correlation_id,
                    email: email.to_string(),
                    password: password.to_string(),
                },
                correlation_id,
            )
            .await?;

        match outcome {
            AuthAction::SignedIn { .. } => Ok(()),
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    /// Register a new account and sign in as it.
    ///
    /// The provider receives `email` as the username and `email` and `name`
    /// as attributes.
    ///
    /// # Errors
    ///
    /// - [`AuthError::SignUpFailed`] if the provider rejected the registration
    /// - [`AuthError::Unavailable`] if the session is shut down or the
    ///   configured operation timeout expired
    #[tracing::instrument(skip_all, name = "auth_sign_up")]
    pub async fn sign_up(&self, email: &str, name: &str, password: &str) -> Result<()> {
        let correlation_id = Uuid::new_v4();
        tracing::debug!(%correlation_id, "Signing up");

        let outcome = self
            .request(
                AuthAction::SignUp {
                    correlation_id,
                    email: email.to_string(),
                    name: name.to_string(),
                    password: password.to_string(),
                },
                correlation_id,
            )
            .await?;

        match outcome {
            AuthAction::SignedIn { .. } => Ok(()),
            _ => Err(AuthError::SignUpFailed),
        }
    }

    /// Sign out.
    ///
    /// Local state always ends signed out, even if the provider call fails.
    /// Nothing is returned to the caller; failures are logged.
    #[tracing::instrument(skip_all, name = "auth_sign_out")]
    pub async fn sign_out(&self) {
        let correlation_id = Uuid::new_v4();
        tracing::debug!(%correlation_id, "Signing out");

        if let Err(error) = self
            .request(AuthAction::SignOut { correlation_id }, correlation_id)
            .await
        {
            tracing::error!(%correlation_id, %error, "Sign-out did not complete");
        }
    }

    async fn request(&self, action: AuthAction, correlation_id: Uuid) -> Result<AuthAction> {
        self.store
            .send_and_wait_for(
                action,
                move |candidate| candidate.is_terminal_for(correlation_id),
                self.config.operation_timeout,
            )
            .await
            .map_err(AuthError::from)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Read access
    // ═══════════════════════════════════════════════════════════════════════

    /// Current state.
    pub async fn state(&self) -> AuthState {
        self.store.state(AuthState::clone).await
    }

    /// Latest published state, without waiting on the store lock.
    #[must_use]
    pub fn snapshot(&self) -> AuthState {
        self.store.subscribe().borrow().clone()
    }

    /// Whether a user is signed in.
    pub async fn is_authenticated(&self) -> bool {
        self.store.state(|s| s.is_authenticated).await
    }

    /// Whether the startup check is still outstanding.
    pub async fn is_loading(&self) -> bool {
        self.store.state(|s| s.is_loading).await
    }

    /// The signed-in user.
    pub async fn user(&self) -> Option<AuthUser> {
        self.store.state(|s| s.user.clone()).await
    }

    /// Receive every state change.
    ///
    /// The receiver is updated before the operation that caused the change
    /// returns.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.store.subscribe()
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Lifecycle
    // ═══════════════════════════════════════════════════════════════════════

    /// Stop accepting operations and wait for running ones.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unavailable`] if operations are still running
    /// when `timeout` expires.
    pub async fn shutdown(&self, timeout: Duration) -> Result<()> {
        self.store.shutdown(timeout).await.map_err(AuthError::from)
    }

    /// [`AuthSession::shutdown`] with the configured shutdown timeout.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unavailable`] on timeout.
    pub async fn close(&self) -> Result<()> {
        self.shutdown(self.config.shutdown_timeout).await
    }
}
