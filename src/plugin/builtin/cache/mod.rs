//! Cache Handler plugin
//!
//! Keyed, TTL-based cache for fetch results. In data-source-shared mode one
//! fetch feeds every control instance configured with the same cache key.

pub mod store;

pub use store::SharedCache;

use crate::plugin::context::PluginContext;
use crate::plugin::error::PluginResult;
use crate::plugin::events::EngineAction;
use crate::plugin::lifecycle::PluginLifecycle;
use crate::plugin::traits::Plugin;
use crate::plugin::types::{Lifecycle, PluginType};
use crate::source::option::SelectOption;
use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug)]
pub struct CacheHandlerPlugin {
    lifecycle: PluginLifecycle,
}

impl Default for CacheHandlerPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheHandlerPlugin {
    pub fn new() -> Self {
        Self {
            lifecycle: PluginLifecycle::new(PluginType::CacheHandler),
        }
    }

    /// Cached options for `key`; a hit restarts the entry's TTL
    pub fn get_from_cache(&self, key: &str) -> Option<Vec<SelectOption>> {
        let ctx = self.lifecycle.context("get_from_cache")?;
        let cache = &ctx.utils().cache;
        let data = cache.get(key)?;
        cache.schedule_removal(key, ctx.props().cache_ttl);
        ctx.emit(
            EngineAction::CacheHit,
            json!({ "key": key, "count": data.len() }),
        );
        Some(data)
    }

    /// Store `data` under `key` and start its TTL; last writer wins
    pub fn set_to_cache(&self, key: &str, data: Vec<SelectOption>) {
        let Some(ctx) = self.lifecycle.context("set_to_cache") else {
            return;
        };
        let count = data.len();
        let cache = &ctx.utils().cache;
        cache.insert(key, data);
        cache.schedule_removal(key, ctx.props().cache_ttl);
        ctx.emit(EngineAction::CacheStored, json!({ "key": key, "count": count }));
    }

    /// Replace the removal timer for `key`; defaults to the configured TTL
    pub fn schedule_removal(&self, key: &str, delay: Option<Duration>) -> bool {
        let Some(ctx) = self.lifecycle.context("schedule_removal") else {
            return false;
        };
        let delay = delay.unwrap_or(ctx.props().cache_ttl);
        ctx.utils().cache.schedule_removal(key, delay)
    }

    pub fn remove_from_cache(&self, key: &str) -> bool {
        let Some(ctx) = self.lifecycle.context("remove_from_cache") else {
            return false;
        };
        let removed = ctx.utils().cache.remove(key);
        if removed {
            ctx.emit(EngineAction::CacheEvicted, json!({ "key": key }));
        }
        removed
    }

    pub fn has_cache(&self, key: &str) -> bool {
        self.lifecycle
            .context("has_cache")
            .is_some_and(|ctx| ctx.utils().cache.contains(key))
    }

    /// Push the expiry of an existing entry out by `delay`
    pub fn extend_cache_lifetime(&self, key: &str, delay: Option<Duration>) -> bool {
        if !self.has_cache(key) {
            return false;
        }
        self.schedule_removal(key, delay)
    }
}

impl Plugin for CacheHandlerPlugin {
    fn plugin_type(&self) -> PluginType {
        PluginType::CacheHandler
    }

    fn init(&self, context: Arc<PluginContext>) -> PluginResult<()> {
        self.lifecycle.activate(context)
    }

    /// Evict this instance's own `cache_key` entry
    ///
    /// Entries written under other keys belong to other instances and keep
    /// their timers.
    fn destroy(&self) {
        let Some(ctx) = self.lifecycle.destroy() else {
            return;
        };
        if let Some(key) = ctx.props().cache_key.as_deref().filter(|k| !k.is_empty()) {
            if ctx.utils().cache.remove(key) {
                ctx.emit(EngineAction::CacheEvicted, json!({ "key": key }));
            }
        }
    }

    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.state()
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
