//! Shared service context.

use std::sync::Arc;

use crate::config::Config;
use crate::hooks::HookRegistry;
use crate::store::{MemStore, Store};

/// Everything the service functions need: storage, hooks, and settings.
///
/// Cheap to clone; handed by reference into every service call the way
/// the hosting application hands around its application state.
#[derive(Debug, Clone)]
pub struct Forum {
    /// Storage backend.
    pub store: Arc<dyn Store>,
    /// Extension hook registry.
    pub hooks: Arc<HookRegistry>,
    /// Forum settings.
    pub config: Arc<Config>,
}

impl Forum {
    /// Build a forum context over an explicit store.
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            store,
            hooks: Arc::new(HookRegistry::new()),
            config: Arc::new(config),
        }
    }

    /// Build a forum context over a fresh in-memory store. Intended for
    /// tests and embedded use.
    pub fn in_memory(config: Config) -> Self {
        Self::new(Arc::new(MemStore::new()), config)
    }
}
