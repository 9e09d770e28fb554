// Application state module
// Owns the state shared across request handlers

use std::sync::atomic::AtomicBool;

use crate::store::CodeStore;

use super::types::Config;

/// Application state
///
/// Constructed once at startup and shared via `Arc`. The store is the
/// only mutable runtime state.
pub struct AppState {
    pub config: Config,
    pub store: CodeStore,

    // Cached config value for fast access without locks
    pub cached_access_log: AtomicBool,
}

impl AppState {
    /// Create `AppState` around an already-opened code store
    pub fn new(config: Config, store: CodeStore) -> Self {
        let cached_access_log = AtomicBool::new(config.logging.access_log);

        Self {
            config,
            store,
            cached_access_log,
        }
    }
}
