//! Mock flag store for testing.

use crate::providers::{FlagStore, ProviderError, ProviderResult};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Mock flag store.
///
/// Records every write attempt, including failed and stalled ones. Clones
/// share state.
#[derive(Debug, Clone, Default)]
pub struct MockFlagStore {
    attempts: Arc<Mutex<Vec<(String, String)>>>,
    fail: Arc<AtomicBool>,
    stall: Arc<AtomicBool>,
}

impl MockFlagStore {
    /// Create a store that accepts every write.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects every write.
    #[must_use]
    pub fn failing() -> Self {
        let store = Self::default();
        store.set_failing(true);
        store
    }

    /// Create a store whose writes never complete.
    #[must_use]
    pub fn stalled() -> Self {
        let store = Self::default();
        store.stall.store(true, Ordering::SeqCst);
        store
    }

    /// Toggle write failure.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Every `(key, value)` write attempted so far.
    #[must_use]
    pub fn attempts(&self) -> Vec<(String, String)> {
        self.attempts
            .lock()
            .map(|attempts| attempts.clone())
            .unwrap_or_default()
    }
}

impl FlagStore for MockFlagStore {
    fn set_flag(&self, key: &str, value: &str) -> impl Future<Output = ProviderResult<()>> + Send {
        let attempts = Arc::clone(&self.attempts);
        let fail = self.fail.load(Ordering::SeqCst);
        let stall = self.stall.load(Ordering::SeqCst);
        let entry = (key.to_string(), value.to_string());

        async move {
            attempts
                .lock()
                .map_err(|_| ProviderError::Storage("Mutex lock failed".to_string()))?
                .push(entry);

            if stall {
                std::future::pending::<()>().await;
            }

            if fail {
                return Err(ProviderError::Storage("Storage quota exceeded".to_string()));
            }
            Ok(())
        }
    }
}
