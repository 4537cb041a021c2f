//! One search execution
//!
//! [`SearchRunner`] holds everything a scheduled search needs, captured when
//! the debounced function is built: the context, the fetcher and cache
//! plugins, the shared gate and the generation current at capture time. A run
//! therefore never looks at the owning plugin, which may already be destroyed.

use crate::engine::props::SelectMode;
use crate::plugin::builtin::cache::CacheHandlerPlugin;
use crate::plugin::builtin::fetcher::{DataFetcherPlugin, PageWindow};
use crate::plugin::builtin::search::gate::FetchGate;
use crate::plugin::builtin::search::request::{build_search_params, SearchRequest};
use crate::plugin::context::PluginContext;
use crate::plugin::events::EngineAction;
use crate::source::option::{SelectOption, SelectValue};
use crate::state::StatePatch;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

pub(crate) struct SearchRunner {
    pub(crate) context: Arc<PluginContext>,
    pub(crate) fetcher: Arc<DataFetcherPlugin>,
    pub(crate) cache: Option<Arc<CacheHandlerPlugin>>,
    pub(crate) gate: Arc<FetchGate>,
    pub(crate) generation: u64,
}

impl SearchRunner {
    fn is_stale(&self) -> bool {
        self.context.is_destroyed() || self.gate.generation() != self.generation
    }

    pub(crate) async fn execute(&self, request: SearchRequest) {
        let ctx = &self.context;
        if self.is_stale() {
            log::debug!("SearchHandler: dropping search captured by an old generation");
            return;
        }

        let props = ctx.props();
        let Some(source) = props.data_source.clone() else {
            log::debug!("SearchHandler: no data source configured");
            return;
        };
        if let Err(err) = source.validate() {
            log::warn!("SearchHandler: {}", err);
            ctx.emit(
                EngineAction::DescriptorRejected,
                json!({ "api": source.fingerprint(), "reason": err.to_string() }),
            );
            return;
        }

        let api = source.fingerprint();
        let ticket = self.gate.issue();
        let limit = props.limit();
        // `skip` is only committed with the page it belongs to, so a failed
        // or discarded page is requested again
        let mut skip = 0;
        ctx.store().update(|state| {
            skip = if request.scroll { state.skip + limit } else { 0 };
            Some(StatePatch::new().loading(true).fetching(true))
        });
        ctx.emit(
            EngineAction::SearchStarted,
            json!({ "api": api, "ticket": ticket, "skip": skip, "scroll": request.scroll }),
        );

        let params = build_search_params(&props, &request);
        let cache_key = props
            .shared_cache_key()
            .filter(|_| request.is_base())
            .map(str::to_string);

        let cached = match (&cache_key, &self.cache) {
            (Some(key), Some(cache)) => cache.get_from_cache(key),
            _ => None,
        };
        let from_cache = cached.is_some();
        let result = match cached {
            Some(options) => Ok(options),
            None => {
                let page = props
                    .is_scroll_fetching
                    .then_some(PageWindow { skip, limit });
                self.fetcher.fetch_data(&source, params, page).await
            }
        };

        let options = match result {
            Ok(options) => options,
            Err(err) => {
                log::warn!("SearchHandler: fetch via '{}' failed: {}", api, err);
                ctx.emit(
                    EngineAction::SearchFailed,
                    json!({ "api": api, "ticket": ticket, "error": err.to_string() }),
                );
                ctx.store().update(|_| {
                    self.gate
                        .is_current(self.generation, ticket)
                        .then(|| StatePatch::new().loading(false).fetching(false))
                });
                return;
            }
        };

        if let (Some(key), Some(cache), false) = (&cache_key, &self.cache, from_cache) {
            cache.set_to_cache(key, options.clone());
        }

        let can_load_more = props.is_scroll_fetching && options.len() >= limit;
        let fetched = options.len();
        let existing = ctx.state().fetch_options;
        let mut next = self
            .fetcher
            .process_options(options, request.appends(), &existing, &api);
        if let Some(init) = &request.init_value {
            echo_missing_values(&mut next, init);
        }

        let mut source_replaced = false;
        let applied = ctx.store().update(|state| {
            if !self.gate.is_current(self.generation, ticket) {
                return None;
            }
            if ctx.props().data_source_fingerprint().as_deref() != Some(api.as_str()) {
                source_replaced = true;
                return Some(StatePatch::new().loading(false).fetching(false));
            }
            let mut patch = StatePatch::new()
                .fetch_options(next.clone())
                .can_trigger_load_more(can_load_more)
                .skip(skip)
                .loading(false)
                .fetching(false)
                .last_data_source_api(Some(api.clone()));
            if !state.mounted {
                patch = patch.init_fetch_options(next.clone()).mounted(true);
            }
            Some(patch)
        });

        if !applied || source_replaced {
            log::debug!("SearchHandler: discarding superseded result {}", ticket);
            ctx.emit(
                EngineAction::SearchDiscarded,
                json!({ "api": api, "ticket": ticket }),
            );
            return;
        }

        ctx.emit(
            EngineAction::SearchApplied,
            json!({
                "api": api,
                "ticket": ticket,
                "fetched": fetched,
                "total": next.len(),
                "cached": from_cache,
                "can_load_more": can_load_more,
            }),
        );
        if let Some(on_options_change) = &props.on_options_change {
            on_options_change(&next);
        }
        if let Some(tokens) = &request.paste_values {
            self.select_pasted(tokens, &next);
        }
    }

    /// Select the fetched options matching pasted tokens through `on_change`
    fn select_pasted(&self, tokens: &[String], options: &[SelectOption]) {
        let props = self.context.props();
        let wanted: HashSet<&str> = tokens.iter().map(String::as_str).collect();
        let matched: Vec<SelectOption> = options
            .iter()
            .filter(|option| wanted.contains(option.value.to_string().as_str()))
            .cloned()
            .collect();
        if matched.is_empty() {
            return;
        }

        let value = match props.mode {
            SelectMode::Single => SelectValue::Single(matched[0].value.clone()),
            SelectMode::Multiple => {
                let mut values = props
                    .value
                    .as_ref()
                    .map(|v| v.values().into_iter().cloned().collect::<Vec<_>>())
                    .unwrap_or_default();
                let mut seen: HashSet<String> = values.iter().map(|v| v.dedupe_key()).collect();
                for option in &matched {
                    if seen.insert(option.value.dedupe_key()) {
                        values.push(option.value.clone());
                    }
                }
                SelectValue::Multiple(values)
            }
        };

        self.context.emit(
            EngineAction::ValueChanged,
            json!({ "value": value.to_json(), "source": "paste" }),
        );
        if let Some(on_change) = &props.on_change {
            on_change(Some(&value), &matched);
        }
    }
}

/// Append echo options for requested values the fetch did not return
fn echo_missing_values(options: &mut Vec<SelectOption>, value: &SelectValue) {
    let mut present: HashSet<String> = options.iter().map(|o| o.value.dedupe_key()).collect();
    for wanted in value.values() {
        if present.insert(wanted.dedupe_key()) {
            options.push(SelectOption::echo(wanted));
        }
    }
}
