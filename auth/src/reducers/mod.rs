//! Authentication reducers.
//!
//! Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.
//! Provider calls only happen inside the returned effects.

pub mod credentials;
pub mod startup;

use crate::actions::AuthAction;
use crate::environment::AuthEnvironment;
use crate::providers::{FlagStore, IdentityProvider};
use crate::state::AuthState;
use authstate_core::{effect::Effect, reducer::Reducer, SmallVec};

pub use credentials::CredentialsReducer;
pub use startup::StartupReducer;

/// Unified authentication reducer.
///
/// Applies the state change of every event through
/// [`AuthAction::transition`], then routes the action to the sub-reducer
/// that owns its effects.
pub struct AuthReducer<P, F> {
    startup: StartupReducer<P, F>,
    credentials: CredentialsReducer<P, F>,
}

impl<P, F> AuthReducer<P, F> {
    /// Create a new unified auth reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            startup: StartupReducer::new(),
            credentials: CredentialsReducer::new(),
        }
    }
}

impl<P, F> Default for AuthReducer<P, F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, F> Clone for AuthReducer<P, F> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<P, F> std::fmt::Debug for AuthReducer<P, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthReducer")
            .field("startup", &self.startup)
            .field("credentials", &self.credentials)
            .finish()
    }
}

impl<P, F> Reducer for AuthReducer<P, F>
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
        tracing::trace!(action = action.name(), "Reducing auth action");

        if let Some(transition) = action.transition() {
            *state = state.apply(transition);
        }

        match action {
            AuthAction::ProbeSession | AuthAction::Initialized { .. } => {
                self.startup.reduce(state, action, env)
            },

            AuthAction::SignIn { .. }
            | AuthAction::SignUp { .. }
            | AuthAction::SignOut { .. }
            | AuthAction::SignedIn { .. }
            | AuthAction::SignedOut { .. }
            | AuthAction::SignInRejected { .. }
            | AuthAction::SignUpRejected { .. } => self.credentials.reduce(state, action, env),
        }
    }
}
