//! In-memory flag store scoped to the session lifetime.

use super::{FlagStore, ProviderError, ProviderResult};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

/// Flags kept for as long as the value (and its clones) live.
///
/// Behaves like browser session storage: nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct SessionFlagStore {
    flags: Arc<Mutex<HashMap<String, String>>>,
}

impl SessionFlagStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a flag.
    ///
    /// # Errors
    ///
    /// Returns error if the lock is poisoned.
    pub fn get_flag(&self, key: &str) -> ProviderResult<Option<String>> {
        let flags = self
            .flags
            .lock()
            .map_err(|_| ProviderError::Storage("Mutex lock failed".to_string()))?;
        Ok(flags.get(key).cloned())
    }
}

impl FlagStore for SessionFlagStore {
    fn set_flag(&self, key: &str, value: &str) -> impl Future<Output = ProviderResult<()>> + Send {
        let flags = Arc::clone(&self.flags);
        let key = key.to_string();
        let value = value.to_string();

        async move {
            flags
                .lock()
                .map_err(|_| ProviderError::Storage("Mutex lock failed".to_string()))?
                .insert(key, value);
            Ok(())
        }
    }
}
