//! # Authstate Testing
//!
//! Testing utilities and helpers for the authstate reducer architecture.
//!
//! This crate provides:
//! - [`ReducerTest`], a Given-When-Then harness for reducers
//! - Assertion helpers for returned effects
//! - A tracing setup that routes log output through the test harness
//!
//! ## Example
//!
//! ```ignore
//! use authstate_testing::{ReducerTest, assertions};
//!
//! ReducerTest::new(AuthReducer::new())
//!     .with_env(test_environment())
//!     .given_state(AuthState::default())
//!     .when_action(AuthAction::Initialized { user: None })
//!     .then_state(|state| assert!(!state.is_loading))
//!     .then_effects(assertions::assert_no_effects)
//!     .run();
//! ```

/// Reducer test harness
pub mod reducer_test;

/// Test helpers and utilities
pub mod helpers {
    use tracing_subscriber::EnvFilter;

    /// Install a fmt subscriber that writes through the test harness
    ///
    /// Honors `RUST_LOG`, defaulting to `debug`. Safe to call from every
    /// test; only the first call installs anything.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }
}

// Re-export commonly used items
pub use helpers::init_test_tracing;
pub use reducer_test::{assertions, ReducerTest};
