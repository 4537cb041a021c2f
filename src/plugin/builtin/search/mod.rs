//! Search Handler plugin
//!
//! Owns the single debounced search function of an engine instance and the
//! [`FetchGate`] that keeps stale results out of the state. Descriptor swaps
//! and dependency changes go through one primitive,
//! [`SearchHandlerPlugin::invalidate_and_refetch`].

pub mod debounce;
pub mod gate;
pub mod request;
pub(crate) mod runner;

pub use debounce::DebouncedSearch;
pub use gate::FetchGate;
pub use request::{build_search_params, SearchRequest, GENERIC_SEARCH_PARAM};

use crate::core::sync::lock_recover;
use crate::plugin::builtin::cache::CacheHandlerPlugin;
use crate::plugin::builtin::fetcher::DataFetcherPlugin;
use crate::plugin::context::PluginContext;
use crate::plugin::error::PluginResult;
use crate::plugin::events::EngineAction;
use crate::plugin::lifecycle::PluginLifecycle;
use crate::plugin::traits::Plugin;
use crate::plugin::types::{Lifecycle, PluginType};
use crate::source::descriptor::DataSource;
use crate::state::StatePatch;
use runner::SearchRunner;
use serde::Serialize;
use serde_json::json;
use std::any::Any;
use std::sync::{Arc, Mutex};

/// Why previously fetched options were thrown away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InvalidationReason {
    DescriptorSwap,
    DependencyChange,
    ValueCleared,
}

#[derive(Debug)]
pub struct SearchHandlerPlugin {
    lifecycle: PluginLifecycle,
    gate: Arc<FetchGate>,
    debounced: Mutex<Option<Arc<DebouncedSearch>>>,
}

impl Default for SearchHandlerPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchHandlerPlugin {
    pub fn new() -> Self {
        Self {
            lifecycle: PluginLifecycle::new(PluginType::SearchHandler),
            gate: Arc::new(FetchGate::new()),
            debounced: Mutex::new(None),
        }
    }

    /// The memoized debounced function, built on first use
    ///
    /// The function captures the context, fetcher, cache and current
    /// generation. It is rebuilt after [`clear_debounced_search`](Self::clear_debounced_search).
    pub fn create_debounced_search(&self) -> Option<Arc<DebouncedSearch>> {
        let ctx = self.lifecycle.context("create_debounced_search")?;
        let mut slot = lock_recover(&self.debounced, "SearchHandler");
        let generation = self.gate.generation();
        if let Some(existing) = slot.as_ref() {
            if existing.generation() == generation {
                return Some(existing.clone());
            }
            existing.cancel();
        }

        let Some(fetcher) = ctx.plugin::<DataFetcherPlugin>(PluginType::DataFetcher) else {
            log::warn!("SearchHandler: no data fetcher registered");
            return None;
        };
        let cache = ctx.plugin::<CacheHandlerPlugin>(PluginType::CacheHandler);
        let wait = ctx.props().debounce;
        let debounced = Arc::new(DebouncedSearch::new(
            SearchRunner {
                context: ctx,
                fetcher,
                cache,
                gate: self.gate.clone(),
                generation,
            },
            wait,
        ));
        *slot = Some(debounced.clone());
        Some(debounced)
    }

    /// Schedule a search
    ///
    /// A descriptor swap detected while the dropdown is open turns this into
    /// an immediate invalidate-and-refetch. With `is_debounced_fetch` off the
    /// call is not delayed.
    pub fn debounced_search(&self, request: SearchRequest) {
        let Some(ctx) = self.lifecycle.context("debounced_search") else {
            return;
        };
        if descriptor_swapped(&ctx) {
            self.invalidate_and_refetch(InvalidationReason::DescriptorSwap, request);
            return;
        }
        let Some(debounced) = self.create_debounced_search() else {
            return;
        };
        if ctx.props().is_debounced_fetch {
            debounced.call(request);
        } else {
            debounced.fire(request);
        }
    }

    /// Schedule a search with no debounce wait
    pub fn search_immediately(&self, request: SearchRequest) -> bool {
        match self.create_debounced_search() {
            Some(debounced) => {
                debounced.fire(request);
                true
            }
            None => false,
        }
    }

    /// Run a search in place and wait for it to finish
    pub async fn search_now(&self, request: SearchRequest) {
        if let Some(debounced) = self.create_debounced_search() {
            debounced.flush(request).await;
        }
    }

    /// Cancel the pending call and forget the memoized function
    pub fn clear_debounced_search(&self) -> bool {
        let previous = lock_recover(&self.debounced, "SearchHandler").take();
        previous.is_some_and(|debounced| debounced.cancel())
    }

    /// Make every issued or scheduled search stale
    pub fn cancel_in_flight(&self) {
        if self.lifecycle.context("cancel_in_flight").is_none() {
            return;
        }
        self.gate.bump_generation();
        self.clear_debounced_search();
    }

    /// Throw away fetched options and fetch again without debouncing
    ///
    /// The clear is synchronous so no render sees stale options next to new
    /// ones. Returns whether a fetch was scheduled.
    pub fn invalidate_and_refetch(&self, reason: InvalidationReason, request: SearchRequest) -> bool {
        let Some(ctx) = self.lifecycle.context("invalidate_and_refetch") else {
            return false;
        };
        let generation = self.gate.bump_generation();
        self.clear_debounced_search();

        let props = ctx.props();
        let will_fetch = props.can_fetch && props.data_source.as_ref().is_some_and(DataSource::is_valid);
        ctx.set_state(
            StatePatch::new()
                .fetch_options(Vec::new())
                .init_fetch_options(Vec::new())
                .skip(0)
                .can_trigger_load_more(true)
                .mounted(false)
                .loading(will_fetch)
                .fetching(will_fetch)
                .last_data_source_api(props.data_source_fingerprint()),
        );
        ctx.emit(
            EngineAction::Invalidated,
            json!({ "reason": reason, "generation": generation, "refetch": will_fetch }),
        );

        will_fetch && self.search_immediately(request)
    }

    pub fn is_pending(&self) -> bool {
        lock_recover(&self.debounced, "SearchHandler")
            .as_ref()
            .is_some_and(|debounced| debounced.is_pending())
    }

    pub fn generation(&self) -> u64 {
        self.gate.generation()
    }
}

fn descriptor_swapped(ctx: &PluginContext) -> bool {
    let Some(current) = ctx.props().data_source_fingerprint() else {
        return false;
    };
    ctx.store().read(|state| {
        state.visible
            && state
                .last_data_source_api
                .as_ref()
                .is_some_and(|last| *last != current)
    })
}

impl Plugin for SearchHandlerPlugin {
    fn plugin_type(&self) -> PluginType {
        PluginType::SearchHandler
    }

    fn init(&self, context: Arc<PluginContext>) -> PluginResult<()> {
        self.lifecycle.activate(context)
    }

    fn destroy(&self) {
        self.lifecycle.destroy();
        self.gate.bump_generation();
        self.clear_debounced_search();
    }

    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.state()
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
