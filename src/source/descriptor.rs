//! Data source descriptors
//!
//! A descriptor tells the engine how to obtain options: either a named method
//! on a service implementing [`ServiceApi`], or an arbitrary async function.
//! Dispatch between the two is resolved once, by matching on [`DataSource`].

use crate::source::error::{EngineError, EngineResult};
use crate::source::option::{OptionConfig, SelectOption};
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;

/// Parameters handed to a data source for one fetch
pub type SearchParams = Map<String, Value>;

/// Future returned by function descriptors
pub type OptionsFuture = BoxFuture<'static, EngineResult<Vec<SelectOption>>>;

/// Capability a service must provide to back a [`ServiceDescriptor`]
#[async_trait::async_trait]
pub trait ServiceApi: Send + Sync {
    /// Whether `method` can be called on this service
    fn has_method(&self, method: &str) -> bool;

    /// Invoke `method` with the merged request parameters
    async fn call(&self, method: &str, params: Value) -> EngineResult<Value>;
}

/// Declarative service call description
#[derive(Clone)]
pub struct ServiceDescriptor {
    pub service: Arc<dyn ServiceApi>,
    pub api_method_name: String,
    /// Static parameters merged first into every request
    pub payload: SearchParams,
    /// Key (or dotted path) holding the record list in the response
    pub response_entity_key: Option<String>,
    /// Key to read after JSON-decoding a string entity
    pub json_entity_key: Option<String>,
    pub option_config: Option<OptionConfig>,
}

impl std::fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("api_method_name", &self.api_method_name)
            .field("payload", &self.payload)
            .field("response_entity_key", &self.response_entity_key)
            .field("json_entity_key", &self.json_entity_key)
            .field("option_config", &self.option_config)
            .finish()
    }
}

impl ServiceDescriptor {
    pub fn new(service: Arc<dyn ServiceApi>, api_method_name: impl Into<String>) -> Self {
        Self {
            service,
            api_method_name: api_method_name.into(),
            payload: SearchParams::new(),
            response_entity_key: None,
            json_entity_key: None,
            option_config: None,
        }
    }

    pub fn with_payload(mut self, payload: SearchParams) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_response_entity_key(mut self, key: impl Into<String>) -> Self {
        self.response_entity_key = Some(key.into());
        self
    }

    pub fn with_json_entity_key(mut self, key: impl Into<String>) -> Self {
        self.json_entity_key = Some(key.into());
        self
    }

    pub fn with_option_config(mut self, config: OptionConfig) -> Self {
        self.option_config = Some(config);
        self
    }

    fn validate(&self) -> EngineResult<()> {
        let api = self.api_method_name.trim();
        if api.is_empty() {
            return Err(EngineError::InvalidDescriptor {
                reason: "api method name is empty".to_string(),
            });
        }
        if api.contains("undefined") || api.contains("null") {
            return Err(EngineError::InvalidDescriptor {
                reason: format!("api method name '{}' is not resolved", api),
            });
        }
        if !self.service.has_method(api) {
            return Err(EngineError::MethodNotFound {
                api: api.to_string(),
            });
        }
        if self
            .response_entity_key
            .as_deref()
            .map_or(true, |key| key.trim().is_empty())
        {
            return Err(EngineError::InvalidDescriptor {
                reason: format!("'{}' has no response_entity_key", api),
            });
        }
        if self.option_config.is_none() {
            return Err(EngineError::InvalidDescriptor {
                reason: format!("'{}' has no option_config", api),
            });
        }
        Ok(())
    }
}

type OptionsFn = dyn Fn(SearchParams) -> OptionsFuture + Send + Sync;

/// Arbitrary function producing options
///
/// The `name` doubles as the descriptor fingerprint, so two functions with the
/// same name are treated as the same data source.
#[derive(Clone)]
pub struct FunctionDescriptor {
    name: String,
    func: Arc<OptionsFn>,
}

impl std::fmt::Debug for FunctionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionDescriptor")
            .field("name", &self.name)
            .finish()
    }
}

impl FunctionDescriptor {
    /// Wrap an async function
    pub fn new<F, Fut>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(SearchParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = EngineResult<Vec<SelectOption>>> + Send + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(move |params| Box::pin(func(params))),
        }
    }

    /// Wrap a synchronous function
    pub fn from_sync<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(SearchParams) -> Vec<SelectOption> + Send + Sync + 'static,
    {
        let func = Arc::new(func);
        Self::new(name, move |params| {
            let func = func.clone();
            async move { Ok(func(params)) }
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn invoke(&self, params: SearchParams) -> OptionsFuture {
        (self.func)(params)
    }
}

/// Where options come from
#[derive(Debug, Clone)]
pub enum DataSource {
    Service(ServiceDescriptor),
    Function(FunctionDescriptor),
}

impl DataSource {
    /// Check the descriptor can be fetched from
    ///
    /// Invalid descriptors degrade to "no fetch"; callers log the reason.
    pub fn validate(&self) -> EngineResult<()> {
        match self {
            DataSource::Service(descriptor) => descriptor.validate(),
            DataSource::Function(_) => Ok(()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Cheap identity used to detect descriptor swaps
    pub fn fingerprint(&self) -> String {
        match self {
            DataSource::Service(descriptor) => descriptor.api_method_name.clone(),
            DataSource::Function(descriptor) => format!("fn:{}", descriptor.name),
        }
    }
}
