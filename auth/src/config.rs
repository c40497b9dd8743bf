//! Authentication session configuration.
//!
//! Values come from the application. Defaults match a single-user client:
//! no operation timeout, a 30 second shutdown budget.

use crate::constants::flags;
use authstate_runtime::StoreConfig;
use std::time::Duration;

/// Configuration for an [`AuthSession`](crate::AuthSession).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// Capacity of the store's action broadcast.
    ///
    /// Default: 64
    pub broadcast_capacity: usize,

    /// Upper bound on how long a caller waits for a sign-in, sign-up or
    /// sign-out result.
    ///
    /// Default: `None` (wait for the provider however long it takes)
    pub operation_timeout: Option<Duration>,

    /// Time allowed for in-flight operations on shutdown.
    ///
    /// Default: 30 seconds
    pub shutdown_timeout: Duration,

    /// Key of the flag written after a successful sign-in.
    ///
    /// Default: `"authenticated"`
    pub flag_key: String,
}

impl AuthConfig {
    /// Create configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the action broadcast capacity.
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    /// Bound how long callers wait for an operation result.
    #[must_use]
    pub const fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }

    /// Set the shutdown budget.
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Set the sign-in flag key.
    #[must_use]
    pub fn with_flag_key(mut self, key: impl Into<String>) -> Self {
        self.flag_key = key.into();
        self
    }

    /// Store configuration derived from this config.
    #[must_use]
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::default()
            .with_broadcast_capacity(self.broadcast_capacity)
            .with_shutdown_timeout(self.shutdown_timeout)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 64,
            operation_timeout: None,
            shutdown_timeout: Duration::from_secs(30),
            flag_key: flags::AUTHENTICATED_KEY.to_string(),
        }
    }
}
