//! Authentication environment.
//!
//! Dependencies injected into the auth reducer.

use crate::constants::flags::AUTHENTICATED_KEY;
use crate::providers::{FlagStore, IdentityProvider};
use std::sync::Arc;

/// Authentication environment.
///
/// # Type Parameters
///
/// - `P`: Identity provider
/// - `F`: Flag store
pub struct AuthEnvironment<P, F>
where
    P: IdentityProvider,
    F: FlagStore,
{
    /// Identity provider.
    pub provider: Arc<P>,

    /// Flag store written after sign-in.
    pub flags: Arc<F>,

    /// Key of the sign-in flag.
    pub flag_key: Arc<str>,
}

impl<P, F> AuthEnvironment<P, F>
where
    P: IdentityProvider,
    F: FlagStore,
{
    /// Create a new environment using the default flag key.
    #[must_use]
    pub fn new(provider: P, flags: F) -> Self {
        Self {
            provider: Arc::new(provider),
            flags: Arc::new(flags),
            flag_key: Arc::from(AUTHENTICATED_KEY),
        }
    }

    /// Use a different sign-in flag key.
    #[must_use]
    pub fn with_flag_key(mut self, key: &str) -> Self {
        self.flag_key = Arc::from(key);
        self
    }
}

impl<P, F> Clone for AuthEnvironment<P, F>
where
    P: IdentityProvider,
    F: FlagStore,
{
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            flags: Arc::clone(&self.flags),
            flag_key: Arc::clone(&self.flag_key),
        }
    }
}
