//! Structured debug events
//!
//! Plugins report what they do as [`DebugEvent`]s through one injected
//! [`DebugLogger`]. The engine does not own a transport; the default logger
//! forwards to the `log` facade.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Log target used by [`default_debug_logger`]
pub const EVENT_LOG_TARGET: &str = "selectengine::events";

/// What happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EngineAction {
    PluginRegistered,
    PluginDestroyed,
    ManagerDestroyed,
    ManagerRebuilt,
    SearchScheduled,
    SearchStarted,
    SearchApplied,
    SearchDiscarded,
    SearchFailed,
    Invalidated,
    CacheHit,
    CacheStored,
    CacheEvicted,
    DescriptorRejected,
    PaginationReset,
    LoadMore,
    PasteParsed,
    ValueChanged,
}

/// One structured debug event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugEvent {
    pub action: EngineAction,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl DebugEvent {
    pub fn new(action: EngineAction, data: Value) -> Self {
        Self {
            action,
            data,
            timestamp: Utc::now(),
        }
    }
}

/// Sink receiving every debug event
pub type DebugLogger = Arc<dyn Fn(&DebugEvent) + Send + Sync>;

/// Logger forwarding events to `log::debug!`
pub fn default_debug_logger() -> DebugLogger {
    Arc::new(|event: &DebugEvent| {
        log::debug!(
            target: EVENT_LOG_TARGET,
            "{} {} {}",
            event.timestamp.format("%H:%M:%S%.3f"),
            event.action,
            event.data
        );
    })
}
