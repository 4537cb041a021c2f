//! Plugin Manager
//!
//! Owns the shared [`PluginContext`] and the [`PluginRegistry`] for one engine
//! instance. Registration initialises a plugin against the context; `destroy`
//! tears every plugin down in reverse dependency order and closes the store.

use crate::engine::props::SelectProps;
use crate::plugin::builtin::{
    CacheHandlerPlugin, DataFetcherPlugin, PaginationPlugin, PasteHandlerPlugin,
    SearchHandlerPlugin,
};
use crate::plugin::context::{PluginContext, PluginUtils};
use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::events::EngineAction;
use crate::plugin::registry::PluginRegistry;
use crate::plugin::traits::Plugin;
use crate::plugin::types::PluginType;
use crate::state::{EngineState, StateListener, StatePatch, Subscription};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Central coordinator for one engine's plugins
pub struct PluginManager {
    context: Arc<PluginContext>,
    registry: PluginRegistry,
    destroyed: AtomicBool,
}

impl std::fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginManager")
            .field("registry", &self.registry)
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

impl PluginManager {
    /// Create an empty manager using the process-wide cache
    pub fn new(props: SelectProps) -> Self {
        Self::with_utils(props, PluginUtils::default())
    }

    pub fn with_utils(props: SelectProps, utils: PluginUtils) -> Self {
        let registry = PluginRegistry::new();
        let context = Arc::new(PluginContext::new(props, utils, registry.clone()));
        Self {
            context,
            registry,
            destroyed: AtomicBool::new(false),
        }
    }

    /// Create a manager with all builtin plugins registered
    pub fn with_builtin_plugins(props: SelectProps, utils: PluginUtils) -> PluginResult<Self> {
        let manager = Self::with_utils(props, utils);
        let plugins: [Arc<dyn Plugin>; 5] = [
            Arc::new(CacheHandlerPlugin::new()),
            Arc::new(DataFetcherPlugin::new()),
            Arc::new(SearchHandlerPlugin::new()),
            Arc::new(PaginationPlugin::new()),
            Arc::new(PasteHandlerPlugin::new()),
        ];
        for plugin in plugins {
            manager.register(plugin)?;
        }
        Ok(manager)
    }

    /// Initialise `plugin` against the shared context and register it
    pub fn register(&self, plugin: Arc<dyn Plugin>) -> PluginResult<()> {
        if self.is_destroyed() {
            return Err(PluginError::ManagerDestroyed);
        }
        let plugin_type = plugin.plugin_type();
        if self.registry.has_plugin(plugin_type) {
            return Err(PluginError::AlreadyRegistered { plugin_type });
        }

        plugin.init(self.context.clone())?;
        self.registry.register(plugin)?;
        self.context.emit(
            EngineAction::PluginRegistered,
            json!({ "plugin": plugin_type }),
        );
        log::debug!("Registered plugin '{}'", plugin_type);
        Ok(())
    }

    /// Typed plugin lookup
    pub fn get_plugin<T: Plugin>(&self, plugin_type: PluginType) -> Option<Arc<T>> {
        if self.is_destroyed() {
            log::warn!(
                "PluginManager: get_plugin({}) after destroy; returning None",
                plugin_type
            );
            return None;
        }
        self.registry.get::<T>(plugin_type)
    }

    pub fn has_plugin(&self, plugin_type: PluginType) -> bool {
        self.registry.has_plugin(plugin_type)
    }

    pub fn plugin_count(&self) -> usize {
        self.registry.plugin_count()
    }

    pub fn context(&self) -> &Arc<PluginContext> {
        &self.context
    }

    pub fn state(&self) -> EngineState {
        self.context.state()
    }

    /// Merge a patch into the state; ignored after destroy
    pub fn set_state(&self, patch: StatePatch) -> bool {
        if self.is_destroyed() {
            log::warn!("PluginManager: set_state after destroy ignored");
            return false;
        }
        self.context.set_state(patch)
    }

    pub fn subscribe(&self, listener: StateListener) -> Subscription {
        self.context.store().subscribe(listener)
    }

    pub fn props(&self) -> Arc<SelectProps> {
        self.context.props()
    }

    pub fn set_props(&self, props: SelectProps) {
        if self.is_destroyed() {
            log::warn!("PluginManager: set_props after destroy ignored");
            return;
        }
        self.context.set_props(props);
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    /// Destroy every plugin in reverse dependency order
    ///
    /// Idempotent; later calls are no-ops.
    pub fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }

        for plugin in self.registry.drain().into_iter().rev() {
            let plugin_type = plugin.plugin_type();
            plugin.destroy();
            self.context.emit(
                EngineAction::PluginDestroyed,
                json!({ "plugin": plugin_type }),
            );
        }
        self.context
            .emit(EngineAction::ManagerDestroyed, json!({ "instance": self.context.instance_id() }));
        self.context.mark_destroyed();
    }
}

impl Drop for PluginManager {
    fn drop(&mut self) {
        self.destroy();
    }
}
