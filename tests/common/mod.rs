//! Shared services and builders for the integration tests

#![allow(dead_code)]

use selectengine::engine::{SelectEngine, SelectProps};
use selectengine::plugin::builtin::SharedCache;
use selectengine::plugin::context::PluginUtils;
use selectengine::plugin::events::{DebugEvent, DebugLogger, EngineAction};
use selectengine::source::descriptor::{DataSource, ServiceApi, ServiceDescriptor};
use selectengine::source::error::{EngineError, EngineResult};
use selectengine::source::fixture::FixtureService;
use selectengine::source::option::{OptionConfig, SelectOption};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Answers call N with `{data: [{id: N, name: "callN"}]}` after a scripted
/// latency; a latency of `None` fails the call
#[derive(Default)]
pub struct ScriptedService {
    latencies: Mutex<VecDeque<Option<Duration>>>,
    calls: AtomicUsize,
    params: Mutex<Vec<Value>>,
    started_at: Mutex<Vec<tokio::time::Instant>>,
}

impl ScriptedService {
    pub fn new(latencies: Vec<Option<Duration>>) -> Arc<Self> {
        Arc::new(Self {
            latencies: Mutex::new(latencies.into()),
            ..Default::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn params(&self) -> Vec<Value> {
        self.params.lock().unwrap().clone()
    }

    pub fn started_at(&self) -> Vec<tokio::time::Instant> {
        self.started_at.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ServiceApi for ScriptedService {
    fn has_method(&self, method: &str) -> bool {
        method == "listUsers"
    }

    async fn call(&self, method: &str, params: Value) -> EngineResult<Value> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.params.lock().unwrap().push(params);
        self.started_at.lock().unwrap().push(tokio::time::Instant::now());
        let latency = self
            .latencies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Some(Duration::ZERO));
        match latency {
            Some(latency) => {
                tokio::time::sleep(latency).await;
                Ok(json!({"data": [{"id": n, "name": format!("call{}", n)}]}))
            }
            None => Err(EngineError::Fetch {
                api: method.to_string(),
                cause: "scripted failure".to_string(),
            }),
        }
    }
}

/// `listUsers` fixture with `count` records named `user1..userN`
pub fn users_fixture(count: usize) -> Arc<FixtureService> {
    Arc::new(FixtureService::new().with_method(
        "listUsers",
        (1..=count)
            .map(|i| json!({"id": i, "name": format!("user{}", i)}))
            .collect(),
    ))
}

/// `listUsers` descriptor reading `data` records with `id`/`name`
pub fn users_source(service: Arc<dyn ServiceApi>) -> DataSource {
    DataSource::Service(
        ServiceDescriptor::new(service, "listUsers")
            .with_response_entity_key("data")
            .with_option_config(OptionConfig::new("id", "name")),
    )
}

/// Collects every debug event
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<DebugEvent>>>);

impl EventLog {
    pub fn logger(&self) -> DebugLogger {
        let events = self.0.clone();
        Arc::new(move |event: &DebugEvent| events.lock().unwrap().push(event.clone()))
    }

    pub fn count(&self, action: EngineAction) -> usize {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|event| event.action == action)
            .count()
    }
}

/// Engine with its own cache and an event log
pub fn engine(props: SelectProps) -> (SelectEngine, EventLog) {
    engine_with_cache(props, SharedCache::new())
}

pub fn engine_with_cache(props: SelectProps, cache: SharedCache) -> (SelectEngine, EventLog) {
    let events = EventLog::default();
    let engine = SelectEngine::with_utils(props, PluginUtils::new(events.logger(), cache));
    (engine, events)
}

pub fn labels(options: &[SelectOption]) -> Vec<String> {
    options.iter().map(|option| option.label.clone()).collect()
}

/// Let spawned tasks run for `ms` of paused time
pub async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
