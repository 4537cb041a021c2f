//! Select Engine
//!
//! [`SelectEngine`] is the host-facing facade. It owns the plugin manager,
//! runs the fetch effects whenever props change, forwards host events to the
//! plugins and derives the render view.

pub mod config;
pub mod effects;
pub mod props;
pub mod view;

pub use config::{DataSourceConfig, EngineConfig};
pub use effects::{EffectInputs, FetchAction, FetchEffects};
pub use props::{PageRequest, SearchKeySpec, SelectMode, SelectProps};
pub use view::{compute_view, SelectView};

use crate::core::sync::{lock_recover, read_recover, write_recover};
use crate::plugin::builtin::{
    split_paste_text, InvalidationReason, PaginationPlugin, PasteHandlerPlugin, ScrollMetrics,
    SearchHandlerPlugin, SearchRequest,
};
use crate::plugin::context::PluginUtils;
use crate::plugin::events::EngineAction;
use crate::plugin::manager::PluginManager;
use crate::plugin::types::PluginType;
use crate::source::option::{value_is_empty, SelectOption, SelectValue};
use crate::state::{EngineState, StateListener, StatePatch, Subscription};
use serde::Serialize;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

/// Why the host reported a search value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SearchReason {
    Input,
    Blur,
    Clear,
}

pub struct SelectEngine {
    manager: RwLock<Arc<PluginManager>>,
    utils: PluginUtils,
    effects: Mutex<FetchEffects>,
    destroyed: AtomicBool,
}

impl std::fmt::Debug for SelectEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectEngine")
            .field("manager", &*read_recover(&self.manager, "SelectEngine"))
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

impl SelectEngine {
    /// Engine using the process-wide cache and the default debug logger
    pub fn new(props: SelectProps) -> Self {
        Self::with_utils(props, PluginUtils::default())
    }

    pub fn with_utils(props: SelectProps, utils: PluginUtils) -> Self {
        let manager = Arc::new(build_manager(props, &utils));
        Self {
            manager: RwLock::new(manager),
            utils,
            effects: Mutex::new(FetchEffects::new()),
            destroyed: AtomicBool::new(false),
        }
    }

    /// The live plugin manager
    ///
    /// A manager found without plugins is torn down and rebuilt from its
    /// props, unless the engine itself was destroyed.
    pub fn manager(&self) -> Arc<PluginManager> {
        let current = read_recover(&self.manager, "SelectEngine").clone();
        if current.plugin_count() > 0 || self.is_destroyed() {
            return current;
        }

        let mut slot = write_recover(&self.manager, "SelectEngine");
        if slot.plugin_count() > 0 {
            return slot.clone();
        }
        log::warn!("SelectEngine: plugin manager is empty, rebuilding");
        let props = (*slot.props()).clone();
        let rebuilt = Arc::new(build_manager(props, &self.utils));
        let stale = std::mem::replace(&mut *slot, rebuilt.clone());
        drop(slot);

        stale.destroy();
        *lock_recover(&self.effects, "SelectEngine") = FetchEffects::new();
        rebuilt
            .context()
            .emit(EngineAction::ManagerRebuilt, json!({ "plugins": rebuilt.plugin_count() }));
        rebuilt
    }

    fn search_handler(&self) -> Option<Arc<SearchHandlerPlugin>> {
        self.manager()
            .get_plugin::<SearchHandlerPlugin>(PluginType::SearchHandler)
    }

    fn pagination(&self) -> Option<Arc<PaginationPlugin>> {
        self.manager()
            .get_plugin::<PaginationPlugin>(PluginType::Pagination)
    }

    /// Run the fetch effects for the initial props
    pub fn mount(&self) {
        self.run_effects();
    }

    pub fn set_props(&self, props: SelectProps) {
        if self.is_destroyed() {
            log::warn!("SelectEngine: set_props after destroy ignored");
            return;
        }
        self.manager().set_props(props);
        self.run_effects();
    }

    pub fn props(&self) -> Arc<SelectProps> {
        self.manager().props()
    }

    fn run_effects(&self) {
        if self.is_destroyed() {
            return;
        }
        let manager = self.manager();
        let state = manager.state();
        let inputs = EffectInputs::capture(&manager.props(), &state);
        let actions = lock_recover(&self.effects, "SelectEngine").evaluate(inputs, &state);
        for action in actions {
            self.apply(action);
        }
    }

    fn apply(&self, action: FetchAction) {
        let Some(search) = self.search_handler() else {
            return;
        };
        log::debug!("SelectEngine: {:?}", action);
        match action {
            FetchAction::BaseFetch | FetchAction::OpenFetch => {
                search.search_immediately(SearchRequest::base());
            }
            FetchAction::Refetch => {
                search.invalidate_and_refetch(InvalidationReason::ValueCleared, SearchRequest::base());
            }
            FetchAction::DependencyInvalidate => {
                search.invalidate_and_refetch(
                    InvalidationReason::DependencyChange,
                    SearchRequest::base(),
                );
            }
            FetchAction::DescriptorInvalidate => {
                search.invalidate_and_refetch(InvalidationReason::DescriptorSwap, SearchRequest::base());
            }
        }
    }

    /// Dropdown opened or closed
    pub fn handle_visible_change(&self, visible: bool) {
        let Some(pagination) = self.pagination() else {
            return;
        };
        pagination.handle_visible_change(visible);
        if !visible {
            return;
        }
        let manager = self.manager();
        if let Some(action) = FetchEffects::on_open(&manager.props(), &manager.state()) {
            self.apply(action);
        }
    }

    /// Clear button pressed
    pub fn handle_clear(&self, visible: bool) {
        if self.is_destroyed() {
            log::warn!("SelectEngine: handle_clear after destroy ignored");
            return;
        }
        self.handle_change(None);
        if visible {
            self.on_search("", SearchReason::Clear);
        } else if let Some(pagination) = self.pagination() {
            pagination.handle_visible_change(false);
        }
    }

    /// Popup scrolled; returns whether the next page was requested
    pub fn popup_scroll_handler(&self, metrics: ScrollMetrics) -> bool {
        self.pagination()
            .is_some_and(|pagination| pagination.handle_popup_scroll(metrics))
    }

    /// Search text changed
    ///
    /// Non-empty input is searched after the debounce; anything else returns
    /// to the pre-search baseline.
    pub fn on_search(&self, value: &str, reason: SearchReason) {
        let Some(search) = self.search_handler() else {
            return;
        };
        let manager = self.manager();
        manager.set_state(StatePatch::new().search_value(value));

        match reason {
            SearchReason::Input if !value.is_empty() => {
                search.debounced_search(SearchRequest::input(value));
            }
            _ => {
                search.cancel_in_flight();
                manager.context().store().update(|state| {
                    Some(
                        StatePatch::new()
                            .search_value("")
                            .fetch_options(state.init_fetch_options.clone())
                            .skip(0)
                            .can_trigger_load_more(true)
                            .loading(false)
                            .fetching(false),
                    )
                });
            }
        }
        self.run_effects();
    }

    /// Pasted text; returns the parsed tokens
    pub fn on_paste(&self, text: &str) -> Vec<String> {
        self.manager()
            .get_plugin::<PasteHandlerPlugin>(PluginType::PasteHandler)
            .map(|paste| paste.handle_paste(text))
            .unwrap_or_default()
    }

    /// Report a selection to the host with the matching options
    pub fn handle_change(&self, value: Option<SelectValue>) {
        if self.is_destroyed() {
            log::warn!("SelectEngine: handle_change after destroy ignored");
            return;
        }
        let manager = self.manager();
        let props = manager.props();
        let view = compute_view(&props, &manager.state());
        let selected: Vec<SelectOption> = value
            .as_ref()
            .map(|value| {
                value
                    .values()
                    .into_iter()
                    .filter_map(|wanted| {
                        view.final_options
                            .iter()
                            .find(|option| option.value.dedupe_key() == wanted.dedupe_key())
                            .cloned()
                    })
                    .collect()
            })
            .unwrap_or_default();

        manager.context().emit(
            EngineAction::ValueChanged,
            json!({ "value": value.as_ref().map(SelectValue::to_json) }),
        );
        if let Some(on_change) = &props.on_change {
            on_change(value.as_ref(), &selected);
        }
    }

    /// Look up the current value so its labels are known
    pub fn resolve_value(&self) -> bool {
        let props = self.props();
        if value_is_empty(props.value.as_ref()) {
            return false;
        }
        let (Some(search), Some(value)) = (self.search_handler(), props.value.clone()) else {
            return false;
        };
        search.search_immediately(SearchRequest::init(value))
    }

    /// Fetch the base list and wait for it
    pub async fn refresh(&self) {
        if let Some(search) = self.search_handler() {
            search.search_now(SearchRequest::base()).await;
        }
    }

    /// Search for `text` without debouncing and wait for the result
    pub async fn search(&self, text: &str) {
        let Some(search) = self.search_handler() else {
            return;
        };
        self.manager()
            .set_state(StatePatch::new().search_value(text));
        search.search_now(SearchRequest::input(text)).await;
    }

    /// Fetch the next page if allowed; returns whether one was requested
    pub async fn load_more(&self) -> bool {
        let (Some(search), Some(pagination)) = (self.search_handler(), self.pagination()) else {
            return false;
        };
        if !pagination.can_load_more() {
            return false;
        }
        let search_value = self.state().search_value;
        search.search_now(SearchRequest::scroll(&search_value)).await;
        true
    }

    /// Parse pasted text and wait for the lookup, if one is configured
    pub async fn paste(&self, text: &str) -> Vec<String> {
        let props = self.props();
        let tokens = split_paste_text(text, props.paste_separators.as_deref());
        if tokens.is_empty() || props.paste_value_key.is_none() {
            return tokens;
        }
        if let Some(search) = self.search_handler() {
            search.search_now(SearchRequest::paste(tokens.clone())).await;
        }
        tokens
    }

    pub fn view(&self) -> SelectView {
        let manager = self.manager();
        compute_view(&manager.props(), &manager.state())
    }

    pub fn state(&self) -> EngineState {
        self.manager().state()
    }

    pub fn subscribe(&self, listener: StateListener) -> Subscription {
        self.manager().subscribe(listener)
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    /// Tear down every plugin; later calls on the engine are no-ops
    pub fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }
        read_recover(&self.manager, "SelectEngine").destroy();
    }
}

impl Drop for SelectEngine {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn build_manager(props: SelectProps, utils: &PluginUtils) -> PluginManager {
    match PluginManager::with_builtin_plugins(props.clone(), utils.clone()) {
        Ok(manager) => manager,
        Err(err) => {
            log::error!("SelectEngine: failed to register builtin plugins: {}", err);
            PluginManager::with_utils(props, utils.clone())
        }
    }
}
