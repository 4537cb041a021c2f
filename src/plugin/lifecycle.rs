//! Plugin lifecycle guard
//!
//! Every plugin owns one [`PluginLifecycle`]. Public plugin methods ask it for
//! the context through [`PluginLifecycle::context`]; outside the `Active`
//! state that returns `None` and logs, and the caller returns its safe default.

use crate::core::sync::{read_recover, write_recover};
use crate::plugin::context::PluginContext;
use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::types::{Lifecycle, PluginType};
use std::sync::{Arc, RwLock};

struct LifecycleSlot {
    state: Lifecycle,
    context: Option<Arc<PluginContext>>,
}

/// `Uninitialized -> Active -> Destroyed` state machine holding the context
pub struct PluginLifecycle {
    plugin_type: PluginType,
    slot: RwLock<LifecycleSlot>,
}

impl std::fmt::Debug for PluginLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginLifecycle")
            .field("plugin_type", &self.plugin_type)
            .field("state", &self.state())
            .finish()
    }
}

impl PluginLifecycle {
    pub fn new(plugin_type: PluginType) -> Self {
        Self {
            plugin_type,
            slot: RwLock::new(LifecycleSlot {
                state: Lifecycle::Uninitialized,
                context: None,
            }),
        }
    }

    pub fn state(&self) -> Lifecycle {
        read_recover(&self.slot, "PluginLifecycle").state
    }

    /// Move to `Active`, taking the context
    pub fn activate(&self, context: Arc<PluginContext>) -> PluginResult<()> {
        let mut slot = write_recover(&self.slot, "PluginLifecycle");
        if slot.state != Lifecycle::Uninitialized {
            return Err(PluginError::InvalidLifecycle {
                plugin_type: self.plugin_type,
                operation: "init".to_string(),
                state: slot.state,
            });
        }
        slot.state = Lifecycle::Active;
        slot.context = Some(context);
        Ok(())
    }

    /// Move to `Destroyed`, handing back the context for final cleanup
    ///
    /// Returns `None` if the plugin was never active or already destroyed.
    pub fn destroy(&self) -> Option<Arc<PluginContext>> {
        let mut slot = write_recover(&self.slot, "PluginLifecycle");
        let previous = slot.state;
        slot.state = Lifecycle::Destroyed;
        let context = slot.context.take();
        if previous == Lifecycle::Active {
            context
        } else {
            None
        }
    }

    /// Context for `operation`, or `None` (logged) when not active
    pub fn context(&self, operation: &str) -> Option<Arc<PluginContext>> {
        let slot = read_recover(&self.slot, "PluginLifecycle");
        match (&slot.state, &slot.context) {
            (Lifecycle::Active, Some(context)) if !context.is_destroyed() => Some(context.clone()),
            (state, _) => {
                log::warn!(
                    "{}: '{}' called while {}; returning default",
                    self.plugin_type,
                    operation,
                    state
                );
                None
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == Lifecycle::Active
    }
}
