//! Mock identity provider for testing.

use crate::constants::attributes;
use crate::providers::{IdentityProvider, ProviderError, ProviderResult, SignUpRequest, SignUpResult};
use crate::state::AuthUser;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug)]
struct Account {
    password: String,
    user: AuthUser,
}

#[derive(Debug, Default)]
struct Switches {
    fail_probe: AtomicBool,
    fail_sign_in: AtomicBool,
    fail_sign_up: AtomicBool,
    fail_sign_out: AtomicBool,
}

#[derive(Debug, Default)]
struct Counters {
    probe: AtomicUsize,
    sign_in: AtomicUsize,
    sign_up: AtomicUsize,
    sign_out: AtomicUsize,
}

#[derive(Debug, Clone, Default)]
struct Delays {
    probe: Option<Duration>,
    sign_in: Option<Duration>,
    sign_in_by_email: HashMap<String, Duration>,
}

/// Mock identity provider.
///
/// Keeps accounts and the current session in memory. Failures can be
/// switched on per call kind, calls can be delayed, and every call is
/// counted. Clones share all state.
#[derive(Debug, Clone, Default)]
pub struct MockIdentityProvider {
    accounts: Arc<Mutex<HashMap<String, Account>>>,
    current: Arc<Mutex<Option<AuthUser>>>,
    switches: Arc<Switches>,
    counters: Arc<Counters>,
    delays: Arc<Delays>,
}

fn lock_failed() -> ProviderError {
    ProviderError::Storage("Mutex lock failed".to_string())
}

async fn pause(delay: Option<Duration>) {
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
}

impl MockIdentityProvider {
    /// Create a provider with no accounts and no session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account. The user carries an `email` attribute.
    #[must_use]
    pub fn with_user(self, email: &str, password: &str) -> Self {
        let user = AuthUser::new(email).with_attribute(attributes::EMAIL, email);
        self.insert_account(user, password);
        self
    }

    /// Register an account with a prepared user record.
    #[must_use]
    pub fn with_account(self, user: AuthUser, password: &str) -> Self {
        self.insert_account(user, password);
        self
    }

    /// Start with `user` already signed in.
    #[must_use]
    pub fn with_current_session(self, user: AuthUser) -> Self {
        if let Ok(mut current) = self.current.lock() {
            *current = Some(user);
        }
        self
    }

    /// Delay every session check.
    #[must_use]
    pub fn with_probe_delay(mut self, delay: Duration) -> Self {
        self.delays_mut().probe = Some(delay);
        self
    }

    /// Delay every sign-in.
    #[must_use]
    pub fn with_sign_in_delay(mut self, delay: Duration) -> Self {
        self.delays_mut().sign_in = Some(delay);
        self
    }

    /// Delay sign-ins for one email, overriding [`Self::with_sign_in_delay`].
    #[must_use]
    pub fn with_sign_in_delay_for(mut self, email: &str, delay: Duration) -> Self {
        self.delays_mut()
            .sign_in_by_email
            .insert(email.to_string(), delay);
        self
    }

    /// Make session checks fail with a network error.
    #[must_use]
    pub fn failing_probe(self) -> Self {
        self.switches.fail_probe.store(true, Ordering::SeqCst);
        self
    }

    /// Make sign-ins fail with a network error.
    #[must_use]
    pub fn failing_sign_in(self) -> Self {
        self.set_fail_sign_in(true);
        self
    }

    /// Make registrations fail with a network error.
    #[must_use]
    pub fn failing_sign_up(self) -> Self {
        self.set_fail_sign_up(true);
        self
    }

    /// Make sign-outs fail with a network error.
    #[must_use]
    pub fn failing_sign_out(self) -> Self {
        self.set_fail_sign_out(true);
        self
    }

    /// Toggle sign-in failure.
    pub fn set_fail_sign_in(&self, fail: bool) {
        self.switches.fail_sign_in.store(fail, Ordering::SeqCst);
    }

    /// Toggle registration failure.
    pub fn set_fail_sign_up(&self, fail: bool) {
        self.switches.fail_sign_up.store(fail, Ordering::SeqCst);
    }

    /// Toggle sign-out failure.
    pub fn set_fail_sign_out(&self, fail: bool) {
        self.switches.fail_sign_out.store(fail, Ordering::SeqCst);
    }

    /// Number of session checks.
    #[must_use]
    pub fn probe_calls(&self) -> usize {
        self.counters.probe.load(Ordering::SeqCst)
    }

    /// Number of sign-in calls.
    #[must_use]
    pub fn sign_in_calls(&self) -> usize {
        self.counters.sign_in.load(Ordering::SeqCst)
    }

    /// Number of registration calls.
    #[must_use]
    pub fn sign_up_calls(&self) -> usize {
        self.counters.sign_up.load(Ordering::SeqCst)
    }

    /// Number of sign-out calls.
    #[must_use]
    pub fn sign_out_calls(&self) -> usize {
        self.counters.sign_out.load(Ordering::SeqCst)
    }

    /// Whether an account exists (for testing).
    #[must_use]
    pub fn has_account(&self, email: &str) -> bool {
        self.accounts
            .lock()
            .map(|accounts| accounts.contains_key(email))
            .unwrap_or(false)
    }

    /// The provider-side signed-in user (for testing).
    #[must_use]
    pub fn current_user(&self) -> Option<AuthUser> {
        self.current.lock().ok().and_then(|current| current.clone())
    }

    fn insert_account(&self, user: AuthUser, password: &str) {
        if let Ok(mut accounts) = self.accounts.lock() {
            accounts.insert(
                user.username.clone(),
                Account {
                    password: password.to_string(),
                    user,
                },
            );
        }
    }

    fn delays_mut(&mut self) -> &mut Delays {
        Arc::make_mut(&mut self.delays)
    }
}

impl IdentityProvider for MockIdentityProvider {
    fn current_session(&self) -> impl Future<Output = ProviderResult<AuthUser>> + Send {
        let this = self.clone();

        async move {
            this.counters.probe.fetch_add(1, Ordering::SeqCst);
            pause(this.delays.probe).await;

            if this.switches.fail_probe.load(Ordering::SeqCst) {
                return Err(ProviderError::Network("Session check failed".to_string()));
            }

            this.current
                .lock()
                .map_err(|_| lock_failed())?
                .clone()
                .ok_or(ProviderError::NoSession)
        }
    }

    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = ProviderResult<AuthUser>> + Send {
        let this = self.clone();
        let email = email.to_string();
        let password = password.to_string();

        async move {
            this.counters.sign_in.fetch_add(1, Ordering::SeqCst);
            let delay = this
                .delays
                .sign_in_by_email
                .get(&email)
                .copied()
                .or(this.delays.sign_in);
            pause(delay).await;

            if this.switches.fail_sign_in.load(Ordering::SeqCst) {
                return Err(ProviderError::Network("Sign-in request failed".to_string()));
            }

            let user = {
                let accounts = this.accounts.lock().map_err(|_| lock_failed())?;
                match accounts.get(&email) {
                    Some(account) if account.password == password => account.user.clone(),
                    _ => {
                        return Err(ProviderError::NotAuthorized(
                            "Incorrect username or password".to_string(),
                        ));
                    },
                }
            };

            *this.current.lock().map_err(|_| lock_failed())? = Some(user.clone());
            Ok(user)
        }
    }

    fn sign_up(
        &self,
        request: SignUpRequest,
    ) -> impl Future<Output = ProviderResult<SignUpResult>> + Send {
        let this = self.clone();

        async move {
            this.counters.sign_up.fetch_add(1, Ordering::SeqCst);

            if this.switches.fail_sign_up.load(Ordering::SeqCst) {
                return Err(ProviderError::Network("Sign-up request failed".to_string()));
            }

            if request.password.len() < 8 {
                return Err(ProviderError::InvalidParameter(
                    "Password did not conform with policy".to_string(),
                ));
            }

            let mut accounts = this.accounts.lock().map_err(|_| lock_failed())?;
            if accounts.contains_key(&request.username) {
                return Err(ProviderError::UsernameExists(request.username));
            }

            let user = AuthUser {
                username: request.username.clone(),
                attributes: request.attributes,
            };
            accounts.insert(
                request.username,
                Account {
                    password: request.password,
                    user: user.clone(),
                },
            );

            Ok(SignUpResult { user })
        }
    }

    fn sign_out(&self) -> impl Future<Output = ProviderResult<()>> + Send {
        let this = self.clone();

        async move {
            this.counters.sign_out.fetch_add(1, Ordering::SeqCst);

            if this.switches.fail_sign_out.load(Ordering::SeqCst) {
                return Err(ProviderError::Network("Sign-out request failed".to_string()));
            }

            *this.current.lock().map_err(|_| lock_failed())? = None;
            Ok(())
        }
    }
}
