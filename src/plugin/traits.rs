//! Plugin Trait
//!
//! Every engine capability (cache, fetching, search, pagination, paste) is a
//! plugin registered with the [`PluginManager`](crate::plugin::manager::PluginManager).
//! Plugins receive the shared context on `init` and release it on `destroy`.

use crate::plugin::context::PluginContext;
use crate::plugin::error::PluginResult;
use crate::plugin::types::{Lifecycle, PluginType};
use std::any::Any;
use std::sync::Arc;

/// Base plugin trait
pub trait Plugin: Send + Sync + 'static {
    fn plugin_type(&self) -> PluginType;

    /// Bind the plugin to its context; called once by the manager
    fn init(&self, context: Arc<PluginContext>) -> PluginResult<()>;

    /// Release resources; every method called afterwards is a logged no-op
    fn destroy(&self);

    fn lifecycle(&self) -> Lifecycle;

    /// Upcast for typed lookup through the registry
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}
