//! Named extension points supplied by the host.
//!
//! The registry maps names to opaque values. Consumers ask for a capability
//! (`Arc<dyn ThreadFactory>`, `Arc<dyn RejectionHandler>`) and the lookup
//! fails with a capability mismatch if the stored value is something else.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::ConfigError;
use crate::pool::{RejectionHandler, ThreadFactory};

type Handle = Arc<dyn Any + Send + Sync>;

/// Name → opaque handle map.
#[derive(Clone, Default)]
pub struct ExtensionRegistry {
    entries: HashMap<String, Handle>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an arbitrary value. It will only satisfy a capability lookup
    /// if its type is exactly that capability handle.
    pub fn register<T>(&mut self, name: impl Into<String>, value: T) -> &mut Self
    where
        T: Any + Send + Sync,
    {
        self.entries.insert(name.into(), Arc::new(value));
        self
    }

    /// Register a thread factory under `name`.
    pub fn register_thread_factory(
        &mut self,
        name: impl Into<String>,
        factory: impl ThreadFactory + 'static,
    ) -> &mut Self {
        let handle: Arc<dyn ThreadFactory> = Arc::new(factory);
        self.register(name, handle)
    }

    /// Register a rejection handler under `name`.
    pub fn register_rejection_handler(
        &mut self,
        name: impl Into<String>,
        handler: impl RejectionHandler + 'static,
    ) -> &mut Self {
        let handle: Arc<dyn RejectionHandler> = Arc::new(handler);
        self.register(name, handle)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up `name` and check it provides capability `T`.
    ///
    /// `key` is the configuration option the name came from, for error
    /// reporting; `expected` describes the capability.
    pub fn lookup<T>(&self, key: &str, name: &str, expected: &'static str) -> Result<T, ConfigError>
    where
        T: Any + Clone,
    {
        let handle = self
            .entries
            .get(name)
            .ok_or_else(|| ConfigError::MissingExtension {
                key: key.into(),
                name: name.into(),
            })?;

        handle
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| ConfigError::CapabilityMismatch {
                key: key.into(),
                name: name.into(),
                expected,
            })
    }

    /// Look up a thread factory.
    pub fn thread_factory(&self, key: &str, name: &str) -> Result<Arc<dyn ThreadFactory>, ConfigError> {
        self.lookup(key, name, "thread factory")
    }

    /// Look up a rejection handler.
    pub fn rejection_handler(
        &self,
        key: &str,
        name: &str,
    ) -> Result<Arc<dyn RejectionHandler>, ConfigError> {
        self.lookup(key, name, "rejection handler")
    }
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ExtensionRegistry")
            .field("names", &names)
            .finish()
    }
}
