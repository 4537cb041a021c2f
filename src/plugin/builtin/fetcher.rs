//! Data Fetcher plugin
//!
//! Normalises service and function descriptors into one
//! `fetch_data -> Vec<SelectOption>` contract, extracts the record list from
//! service responses and post-processes option lists.

use crate::core::runtime::spawn_detached;
use crate::engine::props::SelectProps;
use crate::plugin::context::PluginContext;
use crate::plugin::error::PluginResult;
use crate::plugin::events::EngineAction;
use crate::plugin::lifecycle::PluginLifecycle;
use crate::plugin::traits::Plugin;
use crate::plugin::types::{Lifecycle, PluginType};
use crate::source::descriptor::{DataSource, FunctionDescriptor, SearchParams, ServiceDescriptor};
use crate::source::error::{EngineError, EngineResult};
use crate::source::option::{dedupe_options, value_is_empty, SelectOption};
use crate::state::StatePatch;
use serde_json::{json, Value};
use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Parameter key carrying the current selection
pub const VALUE_PARAM: &str = "value";

/// Pagination window sent with scroll-fetching requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub skip: usize,
    pub limit: usize,
}

#[derive(Debug)]
pub struct DataFetcherPlugin {
    lifecycle: PluginLifecycle,
    fetch_seq: Arc<AtomicU64>,
}

impl Default for DataFetcherPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl DataFetcherPlugin {
    pub fn new() -> Self {
        Self {
            lifecycle: PluginLifecycle::new(PluginType::DataFetcher),
            fetch_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Fetch options from `source`
    ///
    /// Invalid descriptors yield `Ok(vec![])`. Transport and response-shape
    /// failures are returned to the caller, which decides what the state
    /// shows. Every attempt schedules the deferred loading reset.
    pub async fn fetch_data(
        &self,
        source: &DataSource,
        params: SearchParams,
        page: Option<PageWindow>,
    ) -> EngineResult<Vec<SelectOption>> {
        let Some(ctx) = self.lifecycle.context("fetch_data") else {
            return Ok(Vec::new());
        };

        if let Err(err) = source.validate() {
            log::warn!("DataFetcher: skipping fetch, {}", err);
            ctx.emit(
                EngineAction::DescriptorRejected,
                json!({ "api": source.fingerprint(), "reason": err.to_string() }),
            );
            return Ok(Vec::new());
        }

        let seq = self.fetch_seq.fetch_add(1, Ordering::AcqRel) + 1;
        let props = ctx.props();
        let result = match source {
            DataSource::Service(descriptor) => {
                self.fetch_by_data_setter(&props, descriptor, params, page)
                    .await
            }
            DataSource::Function(descriptor) => {
                self.fetch_by_function(&props, descriptor, params, page)
                    .await
            }
        };

        self.schedule_loading_reset(&ctx, seq);
        result
    }

    async fn fetch_by_data_setter(
        &self,
        props: &SelectProps,
        descriptor: &ServiceDescriptor,
        params: SearchParams,
        page: Option<PageWindow>,
    ) -> EngineResult<Vec<SelectOption>> {
        let api = descriptor.api_method_name.trim();
        let mut merged = descriptor.payload.clone();
        merged.extend(params);
        let merged = finalize_params(props, merged, page);

        log::debug!("DataFetcher: calling '{}' with {}", api, Value::Object(merged.clone()));
        let response = descriptor.service.call(api, Value::Object(merged)).await?;

        let entity_key = descriptor.response_entity_key.as_deref().unwrap_or_default();
        let records = extract_entities(
            api,
            &response,
            entity_key,
            descriptor.json_entity_key.as_deref(),
        )?;

        let config = descriptor.option_config.clone().unwrap_or_default();
        let options = records
            .iter()
            .filter_map(|record| {
                let option = config.to_option(record);
                if option.is_none() {
                    log::debug!(
                        "DataFetcher: '{}' record without '{}' skipped",
                        api,
                        config.value_key
                    );
                }
                option
            })
            .collect();
        Ok(dedupe_options(options))
    }

    async fn fetch_by_function(
        &self,
        props: &SelectProps,
        descriptor: &FunctionDescriptor,
        params: SearchParams,
        page: Option<PageWindow>,
    ) -> EngineResult<Vec<SelectOption>> {
        let merged = finalize_params(props, params, page);
        let options = descriptor.invoke(merged).await?;
        Ok(dedupe_options(options))
    }

    /// Combine fetched options with the current list and apply `handle_options`
    ///
    /// Append keeps `existing` first and drops repeated values; replace
    /// discards `existing`.
    pub fn process_options(
        &self,
        options: Vec<SelectOption>,
        append: bool,
        existing: &[SelectOption],
        api_name: &str,
    ) -> Vec<SelectOption> {
        let Some(ctx) = self.lifecycle.context("process_options") else {
            return Vec::new();
        };

        let combined = if append {
            let mut combined = existing.to_vec();
            combined.extend(options);
            dedupe_options(combined)
        } else {
            options
        };

        match &ctx.props().handle_options {
            Some(handle_options) => {
                log::trace!("DataFetcher: handle_options for '{}'", api_name);
                handle_options(combined)
            }
            None => combined,
        }
    }

    /// Clear `loading`/`fetching` after the minimum loading duration
    ///
    /// Only fires when no newer fetch has started since and the state still
    /// shows loading (the success patch normally clears it first).
    fn schedule_loading_reset(&self, ctx: &Arc<PluginContext>, seq: u64) {
        let delay = ctx.props().min_loading;
        let latest = Arc::downgrade(&self.fetch_seq);
        let weak: Weak<PluginContext> = Arc::downgrade(ctx);
        spawn_detached("DataFetcher", async move {
            tokio::time::sleep(delay).await;
            let (Some(ctx), Some(latest)) = (weak.upgrade(), latest.upgrade()) else {
                return;
            };
            if ctx.is_destroyed() || latest.load(Ordering::Acquire) != seq {
                return;
            }
            ctx.store().update(|state| {
                (state.loading || state.fetching)
                    .then(|| StatePatch::new().loading(false).fetching(false))
            });
        });
    }
}

/// Merge the current value, paging and `handle_params` into `params`
fn finalize_params(
    props: &SelectProps,
    mut params: SearchParams,
    page: Option<PageWindow>,
) -> SearchParams {
    let paste_key_present = props
        .paste_value_key
        .as_deref()
        .is_some_and(|key| params.contains_key(key));
    if !paste_key_present && !value_is_empty(props.value.as_ref()) {
        if let Some(value) = &props.value {
            params
                .entry(VALUE_PARAM.to_string())
                .or_insert_with(|| value.to_json());
        }
    }
    if let Some(page) = page {
        params.insert("skip".to_string(), json!(page.skip));
        params.insert("limit".to_string(), json!(page.limit));
    }
    match &props.handle_params {
        Some(handle_params) => handle_params(params),
        None => params,
    }
}

/// Pull the record list out of a service response
///
/// `entity_key` may be a dotted path. A string entity is decoded as JSON and,
/// when `json_entity_key` is set, that key is read from the decoded value.
pub fn extract_entities(
    api: &str,
    response: &Value,
    entity_key: &str,
    json_entity_key: Option<&str>,
) -> EngineResult<Vec<Value>> {
    let shape_error = |message: String| EngineError::ResponseShape {
        api: api.to_string(),
        message,
    };

    let mut entity = response;
    for segment in entity_key.split('.').filter(|s| !s.is_empty()) {
        entity = entity
            .get(segment)
            .ok_or_else(|| shape_error(format!("missing '{}'", entity_key)))?;
    }

    let decoded;
    if let Value::String(encoded) = entity {
        decoded = serde_json::from_str::<Value>(encoded)
            .map_err(|e| shape_error(format!("'{}' is not valid JSON: {}", entity_key, e)))?;
        entity = &decoded;
        if let Some(key) = json_entity_key {
            entity = entity
                .get(key)
                .ok_or_else(|| shape_error(format!("decoded '{}' has no '{}'", entity_key, key)))?;
        }
    }

    match entity {
        Value::Array(records) => Ok(records.clone()),
        Value::Null => Ok(Vec::new()),
        other => Err(shape_error(format!(
            "'{}' is not a list: {}",
            entity_key, other
        ))),
    }
}

impl Plugin for DataFetcherPlugin {
    fn plugin_type(&self) -> PluginType {
        PluginType::DataFetcher
    }

    fn init(&self, context: Arc<PluginContext>) -> PluginResult<()> {
        self.lifecycle.activate(context)
    }

    fn destroy(&self) {
        // Pending loading resets compare against this sequence and drop out
        self.fetch_seq.fetch_add(1, Ordering::AcqRel);
        self.lifecycle.destroy();
    }

    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.state()
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
