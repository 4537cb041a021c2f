//! Plugin System Module
//!
//! Every engine capability is a plugin sharing one [`PluginContext`]. The
//! [`PluginManager`] owns the context and registry and drives the
//! `Uninitialized -> Active -> Destroyed` lifecycle of each plugin.

pub mod builtin;
pub mod context;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod manager;
pub mod registry;
pub mod traits;
pub mod types;

pub use context::{PluginContext, PluginUtils};
pub use error::{PluginError, PluginResult};
pub use events::{default_debug_logger, DebugEvent, DebugLogger, EngineAction};
pub use lifecycle::PluginLifecycle;
pub use manager::PluginManager;
pub use registry::PluginRegistry;
pub use traits::Plugin;
pub use types::{Lifecycle, PluginType};
