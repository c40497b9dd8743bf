//! Startup session check.
//!
//! Asks the identity provider whether a session already exists. Any failure
//! counts as "no session": the caller always gets an answer, so the state
//! can leave its loading phase.

use crate::error::{ProviderError, RecoveredFailure};
use crate::providers::IdentityProvider;
use crate::state::AuthUser;

/// Look up the current session.
///
/// Returns the signed-in user, or `None` if there is no session or the
/// lookup failed. Failures are logged, never returned.
pub async fn probe_session<P>(provider: &P) -> Option<AuthUser>
where
    P: IdentityProvider,
{
    match provider.current_session().await {
        Ok(user) => {
            tracing::info!(username = %user.username, "Existing session found");
            metrics::counter!("auth.probe.completed", "outcome" => "session").increment(1);
            Some(user)
        },
        Err(ProviderError::NoSession) => {
            tracing::info!(
                failure = RecoveredFailure::Probe.as_str(),
                "No existing session"
            );
            metrics::counter!("auth.probe.completed", "outcome" => "none").increment(1);
            None
        },
        Err(error) => {
            tracing::error!(
                failure = RecoveredFailure::Probe.as_str(),
                %error,
                "Session check failed, continuing signed out"
            );
            metrics::counter!("auth.probe.completed", "outcome" => "error").increment(1);
            None
        },
    }
}
