//! Shared keyed storage: typed, mutable state bag scoped to one run.
//!
//! Values are addressed by [`StorageKey<T>`], a static name bound to a type.
//! Reading a key that was never set is a contract violation and fails fast
//! with a configuration error; there are no silent defaults.

use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Mutex;

use crate::error::AgentError;

/// A storage key: a name bound to a value type.
///
/// Declare keys as statics so the name/type binding is fixed at compile time:
///
/// ```rust
/// use rulegraph::storage::StorageKey;
///
/// static USER_INPUT: StorageKey<String> = StorageKey::new("user_input");
/// ```
pub struct StorageKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> StorageKey<T> {
    /// Creates a key with the given name. Names must be unique per run.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    /// Key name, used as the storage index.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Per-run keyed state bag.
///
/// Interior-mutable so nodes can write through a shared reference; the run
/// itself is sequential, the lock only guards against accidental cross-run
/// sharing. Discarded when the run completes.
///
/// **Interaction**: owned by [`crate::graph::RunContext`]; read and written
/// by workflow nodes and edge transforms.
#[derive(Debug, Default)]
pub struct SharedStorage {
    values: Mutex<HashMap<&'static str, Box<dyn Any + Send>>>,
}

impl SharedStorage {
    /// Creates an empty storage bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set<T>(&self, key: &StorageKey<T>, value: T) -> Result<(), AgentError>
    where
        T: Clone + Send + 'static,
    {
        let mut values = self.lock()?;
        values.insert(key.name, Box::new(value));
        Ok(())
    }

    /// Reads the value stored under `key`.
    ///
    /// A missing key is a contract violation: the caller declared a
    /// dependency the workflow never satisfied.
    pub fn get<T>(&self, key: &StorageKey<T>) -> Result<T, AgentError>
    where
        T: Clone + Send + 'static,
    {
        let values = self.lock()?;
        let boxed = values.get(key.name).ok_or_else(|| {
            AgentError::Configuration(format!("storage key '{}' was never set", key.name))
        })?;
        let value = boxed.downcast_ref::<T>().ok_or_else(|| {
            AgentError::Configuration(format!(
                "storage key '{}' holds a different type than requested",
                key.name
            ))
        })?;
        Ok(value.clone())
    }

    /// True when a value is stored under `key`.
    pub fn contains<T>(&self, key: &StorageKey<T>) -> Result<bool, AgentError> {
        Ok(self.lock()?.contains_key(key.name))
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<&'static str, Box<dyn Any + Send>>>, AgentError>
    {
        self.values
            .lock()
            .map_err(|_| AgentError::ExecutionFailed("shared storage lock poisoned".into()))
    }
}
