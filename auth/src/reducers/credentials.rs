//! Credentials reducer.
//!
//! Sign-in, sign-up and sign-out. Each command starts one provider call and
//! always ends in exactly one terminal event carrying the command's
//! correlation id. State changes for those events are applied by
//! [`AuthReducer`](super::AuthReducer); this reducer only returns effects.

use crate::actions::AuthAction;
use crate::constants::{attributes, flags};
use crate::environment::AuthEnvironment;
use crate::error::RecoveredFailure;
use crate::providers::{FlagStore, IdentityProvider, SignUpRequest};
use crate::state::AuthState;
use authstate_core::{async_effect, effect::Effect, reducer::Reducer, smallvec, SmallVec};
use serde_json::{Map, Value};
use std::marker::PhantomData;
use std::sync::Arc;

/// Handles sign-in, sign-up and sign-out commands and their events.
pub struct CredentialsReducer<P, F> {
    _phantom: PhantomData<fn() -> (P, F)>,
}

impl<P, F> CredentialsReducer<P, F> {
    /// Create a new credentials reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<P, F> Default for CredentialsReducer<P, F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, F> Clone for CredentialsReducer<P, F> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<P, F> std::fmt::Debug for CredentialsReducer<P, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CredentialsReducer")
    }
}

fn sign_up_request(email: String, name: String, password: String) -> SignUpRequest {
    let mut attrs = Map::new();
    attrs.insert(attributes::EMAIL.to_string(), Value::from(email.clone()));
    attrs.insert(attributes::NAME.to_string(), Value::from(name));

    SignUpRequest {
        username: email,
        password,
        attributes: attrs,
    }
}

impl<P, F> Reducer for CredentialsReducer<P, F>
where
    P: IdentityProvider + 'static,
    F: FlagStore + 'static,
{
    type State = AuthState;
    type Action = AuthAction;
    type Environment = AuthEnvironment<P, F>;

    #[allow(clippy::too_many_lines)] // One arm per action
    fn reduce(
        &self,
        _state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ═══════════════════════════════════════════════════════════════
            // Commands
            // ═══════════════════════════════════════════════════════════════
            AuthAction::SignIn {
                correlation_id,
                email,
                password,
            } => {
                let provider = Arc::clone(&env.provider);

                smallvec![async_effect! {
                    match provider.sign_in(&email, &password).await {
                        Ok(user) => {
                            tracing::info!(%correlation_id, username = %user.username, "Signed in");
                            metrics::counter!("auth.sign_in.success").increment(1);
                            Some(AuthAction::SignedIn {
                                correlation_id,
                                user,
                                persist_flag: true,
                            })
                        },
                        Err(error) => {
                            tracing::warn!(%correlation_id, %error, "Sign-in rejected");
                            metrics::counter!("auth.sign_in.failure").increment(1);
                            Some(AuthAction::SignInRejected { correlation_id })
                        },
                    }
                }]
            },

            AuthAction::SignUp {
                correlation_id,
                email,
                name,
                password,
            } => {
                let provider = Arc::clone(&env.provider);
                let request = sign_up_request(email, name, password);

                smallvec![async_effect! {
                    match provider.sign_up(request).await {
                        Ok(result) => {
                            tracing::info!(%correlation_id, username = %result.user.username, "Signed up");
                            metrics::counter!("auth.sign_up.success").increment(1);
                            Some(AuthAction::SignedIn {
                                correlation_id,
                                user: result.user,
                                persist_flag: false,
                            })
                        },
                        Err(error) => {
                            tracing::warn!(%correlation_id, %error, "Sign-up rejected");
                            metrics::counter!("auth.sign_up.failure").increment(1);
                            Some(AuthAction::SignUpRejected { correlation_id })
                        },
                    }
                }]
            },

            AuthAction::SignOut { correlation_id } => {
                let provider = Arc::clone(&env.provider);

                smallvec![async_effect! {
                    // Local state signs out whether or not the remote call worked
                    if let Err(error) = provider.sign_out().await {
                        tracing::error!(
                            %correlation_id,
                            failure = RecoveredFailure::SignOutRemote.as_str(),
                            %error,
                            "Remote sign-out failed, signing out locally"
                        );
                        metrics::counter!("auth.sign_out.remote_failure").increment(1);
                    }
                    metrics::counter!("auth.sign_out.completed").increment(1);
                    Some(AuthAction::SignedOut { correlation_id })
                }]
            },

            // ═══════════════════════════════════════════════════════════════
            // Events
            // ═══════════════════════════════════════════════════════════════
            AuthAction::SignedIn {
                correlation_id,
                persist_flag,
                ..
            } => {
                tracing::debug!(%correlation_id, "Applied sign-in");
                if !persist_flag {
                    return smallvec![Effect::None];
                }

                let flag_store = Arc::clone(&env.flags);
                let flag_key = Arc::clone(&env.flag_key);

                // Runs after the state change, so a slow store never holds it back
                smallvec![async_effect! {
                    if let Err(error) = flag_store
                        .set_flag(&flag_key, flags::AUTHENTICATED_VALUE)
                        .await
                    {
                        tracing::warn!(
                            %correlation_id,
                            failure = RecoveredFailure::PersistenceWrite.as_str(),
                            %error,
                            "Could not persist sign-in flag"
                        );
                    }
                    None
                }]
            },

            AuthAction::SignedOut { correlation_id } => {
                tracing::debug!(%correlation_id, "Applied sign-out");
                smallvec![Effect::None]
            },

            // Rejections leave state untouched
            AuthAction::SignInRejected { .. } | AuthAction::SignUpRejected { .. } => {
                smallvec![Effect::None]
            },

            // Startup actions belong to the startup reducer
            AuthAction::ProbeSession | AuthAction::Initialized { .. } => smallvec![Effect::None],
        }
    }
}
