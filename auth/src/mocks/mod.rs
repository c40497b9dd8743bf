//! Mock implementations of provider traits for testing.
//!
//! Fast, deterministic, in-memory implementations of the provider traits.
//!
//! # Example
//!
//! ```
//! use authstate::mocks::{MockFlagStore, MockIdentityProvider};
//!
//! let provider = MockIdentityProvider::new().with_user("a@b.com", "password1");
//! let flags = MockFlagStore::new();
//! assert_eq!(provider.sign_in_calls(), 0);
//! assert!(flags.attempts().is_empty());
//! ```

pub mod flag_store;
pub mod identity;

pub use flag_store::MockFlagStore;
pub use identity::MockIdentityProvider;
