//! Startup reducer.
//!
//! Runs the session check. The loading phase itself is resolved by
//! [`AuthReducer`](super::AuthReducer) when it applies `Initialized`.

use crate::actions::AuthAction;
use crate::environment::AuthEnvironment;
use crate::probe::probe_session;
use crate::providers::{FlagStore, IdentityProvider};
use crate::state::AuthState;
use authstate_core::{async_effect, effect::Effect, reducer::Reducer, smallvec, SmallVec};
use std::marker::PhantomData;
use std::sync::Arc;

/// Handles `ProbeSession` and `Initialized`.
pub struct StartupReducer<P, F> {
    _phantom: PhantomData<fn() -> (P, F)>,
}

impl<P, F> StartupReducer<P, F> {
    /// Create a new startup reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<P, F> Default for StartupReducer<P, F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, F> Clone for StartupReducer<P, F> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<P, F> std::fmt::Debug for StartupReducer<P, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StartupReducer")
    }
}

impl<P, F> Reducer for StartupReducer<P, F>
where
    P: IdentityProvider + 'static,
    F: FlagStore + 'static,
{
    type State = AuthState;
    type Action = AuthAction;
    type Environment = AuthEnvironment<P, F>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            AuthAction::ProbeSession => {
                tracing::debug!("Checking for an existing session");
                let provider = Arc::clone(&env.provider);

                smallvec![async_effect! {
                    let user = probe_session(provider.as_ref()).await;
                    Some(AuthAction::Initialized { user })
                }]
            },

            AuthAction::Initialized { .. } => {
                tracing::info!(status = state.status().as_str(), "Session initialized");
                smallvec![Effect::None]
            },

            // Other actions belong to the credentials reducer
            _ => smallvec![Effect::None],
        }
    }
}
