//! Authentication actions.
//!
//! Actions are the only input to the auth reducer. They follow the
//! command/event split:
//! - **Commands** ask for work (`ProbeSession`, `SignIn`, `SignUp`, `SignOut`)
//! - **Events** report what happened (`Initialized`, `SignedIn`, ...)
//!
//! Commands issued through [`AuthSession`](crate::AuthSession) carry a
//! `correlation_id`. The terminal event of that command echoes it back, so a
//! caller can find its own result among concurrent operations.

use crate::state::{AuthUser, Transition};
use std::fmt;
use uuid::Uuid;

/// Authentication action.
#[derive(Clone, PartialEq)]
pub enum AuthAction {
    // ═══════════════════════════════════════════════════════════════════════
    // Startup
    // ═══════════════════════════════════════════════════════════════════════
    /// Ask the identity provider for an existing session.
    ///
    /// Always ends in [`AuthAction::Initialized`].
    ProbeSession,

    /// The startup session check finished.
    Initialized {
        /// User from the existing session, if there was one.
        user: Option<AuthUser>,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Commands
    // ═══════════════════════════════════════════════════════════════════════
    /// Sign in with email and password.
    SignIn {
        /// Matches the terminal event.
        correlation_id: Uuid,
        /// Account email (used as the provider username).
        email: String,
        /// Account password.
        password: String,
    },

    /// Register a new account.
    SignUp {
        /// Matches the terminal event.
        correlation_id: Uuid,
        /// Account email (used as the provider username).
        email: String,
        /// Display name.
        name: String,
        /// Account password.
        password: String,
    },

    /// Sign out.
    ///
    /// Always ends in [`AuthAction::SignedOut`].
    SignOut {
        /// Matches the terminal event.
        correlation_id: Uuid,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Events
    // ═══════════════════════════════════════════════════════════════════════
    /// A user signed in or registered.
    ///
    /// The state change is applied first. When `persist_flag` is set the
    /// sign-in flag is written afterwards, off the caller's path.
    SignedIn {
        /// Command this answers.
        correlation_id: Uuid,
        /// Signed-in user.
        user: AuthUser,
        /// Write the sign-in flag after applying (password sign-in only).
        persist_flag: bool,
    },

    /// The user signed out locally.
    SignedOut {
        /// Command this answers.
        correlation_id: Uuid,
    },

    /// The provider rejected a sign-in. State is unchanged.
    SignInRejected {
        /// Command this answers.
        correlation_id: Uuid,
    },

    /// The provider rejected a registration. State is unchanged.
    SignUpRejected {
        /// Command this answers.
        correlation_id: Uuid,
    },
}

impl AuthAction {
    /// State transition this action causes, if any.
    ///
    /// Commands and rejections map to `None`: the reducer leaves state alone.
    #[must_use]
    pub fn transition(&self) -> Option<Transition> {
        match self {
            Self::Initialized { user } => Some(Transition::Initialize(user.clone())),
            Self::SignedIn { user, .. } => Some(Transition::SignedIn(user.clone())),
            Self::SignedOut { .. } => Some(Transition::SignedOut),
            Self::ProbeSession
            | Self::SignIn { .. }
            | Self::SignUp { .. }
            | Self::SignOut { .. }
            | Self::SignInRejected { .. }
            | Self::SignUpRejected { .. } => None,
        }
    }

    /// Correlation id carried by this action.
    ///
    /// Startup actions are not correlated.
    #[must_use]
    pub const fn correlation_id(&self) -> Option<Uuid> {
        match self {
            Self::SignIn { correlation_id, .. }
            | Self::SignUp { correlation_id, .. }
            | Self::SignOut { correlation_id }
            | Self::SignedIn { correlation_id, .. }
            | Self::SignedOut { correlation_id }
            | Self::SignInRejected { correlation_id }
            | Self::SignUpRejected { correlation_id } => Some(*correlation_id),
            Self::ProbeSession | Self::Initialized { .. } => None,
        }
    }

    /// Whether this is the terminal event for the command `correlation_id`.
    #[must_use]
    pub fn is_terminal_for(&self, correlation_id: Uuid) -> bool {
        match self {
            Self::SignedIn { .. }
            | Self::SignedOut { .. }
            | Self::SignInRejected { .. }
            | Self::SignUpRejected { .. } => self.correlation_id() == Some(correlation_id),
            _ => false,
        }
    }

    /// Short action name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ProbeSession => "probe_session",
            Self::Initialized { .. } => "initialized",
            Self::SignIn { .. } => "sign_in",
            Self::SignUp { .. } => "sign_up",
            Self::SignOut { .. } => "sign_out",
            Self::SignedIn { .. } => "signed_in",
            Self::SignedOut { .. } => "signed_out",
            Self::SignInRejected { .. } => "sign_in_rejected",
            Self::SignUpRejected { .. } => "sign_up_rejected",
        }
    }
}

// Passwords never reach log output.
impl fmt::Debug for AuthAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProbeSession => f.write_str("ProbeSession"),
            Self::Initialized { user } => f.debug_struct("Initialized").field("user", user).finish(),
            Self::SignIn {
                correlation_id,
                email,
                ..
            } => f
                .debug_struct("SignIn")
                .field("correlation_id", correlation_id)
                .field("email", email)
                .field("password", &"<redacted>")
                .finish(),
            Self::SignUp {
                correlation_id,
                email,
                name,
                ..
            } => f
                .debug_struct("SignUp")
                .field("correlation_id", correlation_id)
                .field("email", email)
                .field("name", name)
                .field("password", &"<redacted>")
                .finish(),
            Self::SignOut { correlation_id } => f
                .debug_struct("SignOut")
                .field("correlation_id", correlation_id)
                .finish(),
            Self::SignedIn {
                correlation_id,
                user,
                persist_flag,
            } => f
                .debug_struct("SignedIn")
                .field("correlation_id", correlation_id)
                .field("user", user)
                .field("persist_flag", persist_flag)
                .finish(),
            Self::SignedOut { correlation_id } => f
                .debug_struct("SignedOut")
                .field("correlation_id", correlation_id)
                .finish(),
            Self::SignInRejected { correlation_id } => f
                .debug_struct("SignInRejected")
                .field("correlation_id", correlation_id)
                .finish(),
            Self::SignUpRejected { correlation_id } => f
                .debug_struct("SignUpRejected")
                .field("correlation_id", correlation_id)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_passwords() {
        let sign_in = AuthAction::SignIn {
            correlation_id: Uuid::new_v4(),
            email: "a@b.com".to_string(),
            password: "hunter2".to_string(),
        };
        let sign_up = AuthAction::SignUp {
            correlation_id: Uuid::new_v4(),
            email: "a@b.com".to_string(),
            name: "A".to_string(),
            password: "hunter2".to_string(),
        };

        for action in [sign_in, sign_up] {
            let rendered = format!("{action:?}");
            assert!(!rendered.contains("hunter2"));
            assert!(rendered.contains("<redacted>"));
            assert!(rendered.contains("a@b.com"));
        }
    }

    #[test]
    fn test_transitions() {
        let id = Uuid::new_v4();
        let user = AuthUser::new("a@b.com");

        assert_eq!(
            AuthAction::Initialized { user: None }.transition(),
            Some(Transition::Initialize(None))
        );
        assert_eq!(
            AuthAction::SignedIn {
                correlation_id: id,
                user: user.clone(),
                persist_flag: true,
            }
            .transition(),
            Some(Transition::SignedIn(user))
        );
        assert_eq!(
            AuthAction::SignedOut { correlation_id: id }.transition(),
            Some(Transition::SignedOut)
        );
        assert_eq!(AuthAction::ProbeSession.transition(), None);
        assert_eq!(AuthAction::SignInRejected { correlation_id: id }.transition(), None);
        assert_eq!(AuthAction::SignOut { correlation_id: id }.transition(), None);
    }

    #[test]
    fn test_terminal_matching() {
        let mine = Uuid::new_v4();
        let theirs = Uuid::new_v4();

        assert!(AuthAction::SignInRejected { correlation_id: mine }.is_terminal_for(mine));
        assert!(!AuthAction::SignInRejected { correlation_id: theirs }.is_terminal_for(mine));
        assert!(AuthAction::SignedOut { correlation_id: mine }.is_terminal_for(mine));

        // Commands are never terminal, even with a matching id
        assert!(!AuthAction::SignOut { correlation_id: mine }.is_terminal_for(mine));
        assert!(!AuthAction::Initialized { user: None }.is_terminal_for(mine));
    }

    #[test]
    fn test_correlation_ids() {
        let id = Uuid::new_v4();
        assert_eq!(AuthAction::SignOut { correlation_id: id }.correlation_id(), Some(id));
        assert_eq!(AuthAction::ProbeSession.correlation_id(), None);
        assert_eq!(AuthAction::ProbeSession.name(), "probe_session");
    }
}
