//! Plugin Context
//!
//! The shared `{ state, props, utils }` record handed to every plugin. It is
//! the only channel plugins use to talk to each other: state goes through the
//! store, configuration through the props snapshot, and sibling plugins are
//! looked up through the registry handle.

use crate::core::sync::{read_recover, write_recover};
use crate::engine::props::SelectProps;
use crate::plugin::builtin::cache::SharedCache;
use crate::plugin::events::{default_debug_logger, DebugEvent, DebugLogger, EngineAction};
use crate::plugin::registry::PluginRegistry;
use crate::plugin::traits::Plugin;
use crate::plugin::types::PluginType;
use crate::state::{EngineState, StatePatch, StateStore};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Injected helpers shared by every plugin of one engine
#[derive(Clone)]
pub struct PluginUtils {
    pub logger: DebugLogger,
    pub cache: SharedCache,
}

impl std::fmt::Debug for PluginUtils {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginUtils")
            .field("logger", &"DebugLogger")
            .field("cache", &self.cache)
            .finish()
    }
}

impl Default for PluginUtils {
    fn default() -> Self {
        Self {
            logger: default_debug_logger(),
            cache: SharedCache::global(),
        }
    }
}

impl PluginUtils {
    pub fn new(logger: DebugLogger, cache: SharedCache) -> Self {
        Self { logger, cache }
    }
}

/// Runtime context provided to plugins
pub struct PluginContext {
    instance_id: u64,
    store: StateStore,
    props: RwLock<Arc<SelectProps>>,
    utils: PluginUtils,
    plugins: PluginRegistry,
    destroyed: AtomicBool,
}

impl std::fmt::Debug for PluginContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginContext")
            .field("instance_id", &self.instance_id)
            .field("store", &self.store)
            .field("plugins", &self.plugins)
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

impl PluginContext {
    pub fn new(props: SelectProps, utils: PluginUtils, plugins: PluginRegistry) -> Self {
        Self {
            instance_id: NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed),
            store: StateStore::new(),
            props: RwLock::new(Arc::new(props)),
            utils,
            plugins,
            destroyed: AtomicBool::new(false),
        }
    }

    /// Unique id of the owning engine instance
    pub fn instance_id(&self) -> u64 {
        self.instance_id
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Snapshot of the current state
    pub fn state(&self) -> EngineState {
        self.store.get()
    }

    pub fn set_state(&self, patch: StatePatch) -> bool {
        self.store.set_state(patch)
    }

    /// Current props snapshot
    pub fn props(&self) -> Arc<SelectProps> {
        read_recover(&self.props, "PluginContext").clone()
    }

    pub fn set_props(&self, props: SelectProps) {
        *write_recover(&self.props, "PluginContext") = Arc::new(props);
    }

    pub fn utils(&self) -> &PluginUtils {
        &self.utils
    }

    /// Look up a sibling plugin by type
    pub fn plugin<T: Plugin>(&self, plugin_type: PluginType) -> Option<Arc<T>> {
        self.plugins.get::<T>(plugin_type)
    }

    /// Emit a structured debug event through the injected logger
    pub fn emit(&self, action: EngineAction, data: Value) {
        (self.utils.logger)(&DebugEvent::new(action, data));
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    /// Mark the context dead and close its store
    ///
    /// Debounced calls that captured this context check the flag and bail out.
    pub(crate) fn mark_destroyed(&self) {
        self.destroyed.store(true, Ordering::Release);
        self.store.close();
    }
}
