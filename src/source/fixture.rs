//! In-memory fixture service
//!
//! Serves JSON records per method name with the filtering a typical list API
//! applies: substring search, field equality, membership for array params,
//! and `skip`/`limit` paging. Used by the driver binary and by tests.

use crate::core::sync::lock_recover;
use crate::source::descriptor::ServiceApi;
use crate::source::error::{EngineError, EngineResult};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

const GENERIC_SEARCH_KEY: &str = "search";
const IGNORED_KEYS: [&str; 3] = ["skip", "limit", "value"];

/// Service answering from in-memory records
pub struct FixtureService {
    methods: HashMap<String, Vec<Value>>,
    entity_key: String,
    latency: Duration,
    calls: Mutex<Vec<(String, Value)>>,
}

impl std::fmt::Debug for FixtureService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixtureService")
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("entity_key", &self.entity_key)
            .field("latency", &self.latency)
            .finish()
    }
}

impl Default for FixtureService {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureService {
    pub fn new() -> Self {
        Self {
            methods: HashMap::new(),
            entity_key: "data".to_string(),
            latency: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_method(mut self, name: impl Into<String>, records: Vec<Value>) -> Self {
        self.methods.insert(name.into(), records);
        self
    }

    /// Key the record list is wrapped under in every response
    pub fn with_entity_key(mut self, key: impl Into<String>) -> Self {
        self.entity_key = key.into();
        self
    }

    /// Simulated network latency applied to every call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Build from a JSON object mapping method names to record arrays
    pub fn from_json(value: &Value) -> EngineResult<Self> {
        let object = value.as_object().ok_or_else(|| EngineError::Configuration {
            message: "fixture must be a JSON object of method name to record array".to_string(),
        })?;

        let mut service = Self::new();
        for (method, records) in object {
            let records = records.as_array().ok_or_else(|| EngineError::Configuration {
                message: format!("fixture method '{}' must be an array of records", method),
            })?;
            service = service.with_method(method.clone(), records.clone());
        }
        Ok(service)
    }

    /// Load a fixture file
    pub async fn load(path: &Path) -> EngineResult<Self> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| EngineError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let value: Value = serde_json::from_str(&contents).map_err(|e| EngineError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_json(&value)
    }

    pub fn call_count(&self) -> usize {
        lock_recover(&self.calls, "FixtureService").len()
    }

    /// Every `(method, params)` pair received so far
    pub fn calls(&self) -> Vec<(String, Value)> {
        lock_recover(&self.calls, "FixtureService").clone()
    }

    fn filter_records(records: &[Value], params: &Map<String, Value>) -> Vec<Value> {
        let known_fields: HashSet<&str> = records
            .iter()
            .filter_map(Value::as_object)
            .flat_map(|record| record.keys().map(String::as_str))
            .collect();

        let filtered: Vec<Value> = records
            .iter()
            .filter(|record| {
                params.iter().all(|(key, wanted)| {
                    if IGNORED_KEYS.contains(&key.as_str()) {
                        return true;
                    }
                    if key == GENERIC_SEARCH_KEY && !known_fields.contains(GENERIC_SEARCH_KEY) {
                        return matches_any_field(record, wanted);
                    }
                    if !known_fields.contains(key.as_str()) {
                        return true;
                    }
                    record
                        .get(key)
                        .map_or(false, |actual| field_matches(actual, wanted))
                })
            })
            .cloned()
            .collect();

        let skip = params.get("skip").and_then(Value::as_u64).unwrap_or(0) as usize;
        let limit = params
            .get("limit")
            .and_then(Value::as_u64)
            .map_or(usize::MAX, |l| l as usize);

        filtered.into_iter().skip(skip).take(limit).collect()
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn field_matches(actual: &Value, wanted: &Value) -> bool {
    match wanted {
        Value::Null => true,
        Value::Array(candidates) => {
            let actual = scalar_text(actual);
            candidates.iter().any(|c| scalar_text(c) == actual)
        }
        Value::String(needle) if needle.is_empty() => true,
        Value::String(needle) => match actual {
            Value::String(haystack) => haystack.to_lowercase().contains(&needle.to_lowercase()),
            other => scalar_text(other).as_deref() == Some(needle.as_str()),
        },
        other => scalar_text(actual) == scalar_text(other),
    }
}

fn matches_any_field(record: &Value, wanted: &Value) -> bool {
    match record.as_object() {
        Some(fields) => fields.values().any(|field| field_matches(field, wanted)),
        None => false,
    }
}

#[async_trait::async_trait]
impl ServiceApi for FixtureService {
    fn has_method(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    async fn call(&self, method: &str, params: Value) -> EngineResult<Value> {
        lock_recover(&self.calls, "FixtureService").push((method.to_string(), params.clone()));

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let records = self
            .methods
            .get(method)
            .ok_or_else(|| EngineError::MethodNotFound {
                api: method.to_string(),
            })?;
        let empty = Map::new();
        let params = params.as_object().unwrap_or(&empty);
        let matched = Self::filter_records(records, params);

        let mut response = Map::new();
        response.insert(self.entity_key.clone(), Value::Array(matched));
        Ok(Value::Object(response))
    }
}
