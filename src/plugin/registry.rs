//! Plugin Registry
//!
//! Thread-safe map from [`PluginType`] to plugin instance, shared between the
//! manager and every plugin context so plugins can find their siblings.

use crate::core::sync::{handle_mutex_poison, read_recover, write_recover};
use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::traits::Plugin;
use crate::plugin::types::PluginType;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// Plugin registry keyed by plugin type
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: Arc<RwLock<BTreeMap<PluginType, Arc<dyn Plugin>>>>,
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.plugin_types())
            .finish()
    }
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin; one instance per type
    ///
    /// A poisoned registry refuses new plugins rather than recovering.
    pub fn register(&self, plugin: Arc<dyn Plugin>) -> PluginResult<()> {
        let plugin_type = plugin.plugin_type();
        let mut plugins = handle_mutex_poison(self.plugins.write(), |message| {
            PluginError::Synchronisation { message }
        })?;
        if plugins.contains_key(&plugin_type) {
            return Err(PluginError::AlreadyRegistered { plugin_type });
        }
        plugins.insert(plugin_type, plugin);
        Ok(())
    }

    pub fn get_dyn(&self, plugin_type: PluginType) -> Option<Arc<dyn Plugin>> {
        read_recover(&self.plugins, "PluginRegistry")
            .get(&plugin_type)
            .cloned()
    }

    /// Typed lookup; `None` if absent or registered under a different type
    pub fn get<T: Plugin>(&self, plugin_type: PluginType) -> Option<Arc<T>> {
        self.get_dyn(plugin_type)?.as_any().downcast::<T>().ok()
    }

    pub fn has_plugin(&self, plugin_type: PluginType) -> bool {
        read_recover(&self.plugins, "PluginRegistry").contains_key(&plugin_type)
    }

    pub fn plugin_count(&self) -> usize {
        read_recover(&self.plugins, "PluginRegistry").len()
    }

    /// Registered types in dependency order
    pub fn plugin_types(&self) -> Vec<PluginType> {
        read_recover(&self.plugins, "PluginRegistry")
            .keys()
            .copied()
            .collect()
    }

    /// Remove every plugin, returning them in dependency order
    pub fn drain(&self) -> Vec<Arc<dyn Plugin>> {
        let mut plugins = write_recover(&self.plugins, "PluginRegistry");
        std::mem::take(&mut *plugins).into_values().collect()
    }
}
