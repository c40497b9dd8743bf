//! Authentication constants.

/// Messages shown to end users.
pub mod messages {
    /// Sign-in failed.
    pub const INVALID_CREDENTIALS: &str = "Please check your email and password";

    /// Registration failed.
    pub const SIGN_UP_FAILED: &str = "There was an error signing up";

    /// The session was shut down.
    pub const UNAVAILABLE: &str = "Authentication is currently unavailable";
}

/// Persisted flag written after a successful sign-in.
pub mod flags {
    /// Default flag key.
    pub const AUTHENTICATED_KEY: &str = "authenticated";

    /// Value written on sign-in.
    pub const AUTHENTICATED_VALUE: &str = "true";
}

/// Attribute names sent with a registration.
pub mod attributes {
    /// Email attribute.
    pub const EMAIL: &str = "email";

    /// Display name attribute.
    pub const NAME: &str = "name";
}
