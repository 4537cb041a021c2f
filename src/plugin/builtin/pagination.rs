//! Pagination plugin
//!
//! Tracks `skip`, answers whether another page may be requested and turns
//! near-bottom popup scrolls into scroll searches.

use crate::plugin::builtin::search::{SearchHandlerPlugin, SearchRequest};
use crate::plugin::context::PluginContext;
use crate::plugin::error::PluginResult;
use crate::plugin::events::EngineAction;
use crate::plugin::lifecycle::PluginLifecycle;
use crate::plugin::traits::Plugin;
use crate::plugin::types::{Lifecycle, PluginType};
use crate::state::StatePatch;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::any::Any;
use std::sync::Arc;

/// Distance from the bottom, in pixels, that counts as "at the bottom"
pub const SCROLL_THRESHOLD_PX: f64 = 10.0;

/// Scroll position reported by the host's popup element
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub client_height: f64,
    pub scroll_height: f64,
}

impl ScrollMetrics {
    pub fn new(scroll_top: f64, client_height: f64, scroll_height: f64) -> Self {
        Self {
            scroll_top,
            client_height,
            scroll_height,
        }
    }

    pub fn near_bottom(&self) -> bool {
        self.scroll_top + self.client_height >= self.scroll_height - SCROLL_THRESHOLD_PX
    }
}

#[derive(Debug)]
pub struct PaginationPlugin {
    lifecycle: PluginLifecycle,
}

impl Default for PaginationPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl PaginationPlugin {
    pub fn new() -> Self {
        Self {
            lifecycle: PluginLifecycle::new(PluginType::Pagination),
        }
    }

    pub fn reset_pagination(&self) {
        let Some(ctx) = self.lifecycle.context("reset_pagination") else {
            return;
        };
        ctx.set_state(StatePatch::new().skip(0).can_trigger_load_more(true));
        ctx.emit(EngineAction::PaginationReset, json!({}));
    }

    pub fn get_current_skip(&self) -> usize {
        self.lifecycle
            .context("get_current_skip")
            .map_or(0, |ctx| ctx.store().read(|state| state.skip))
    }

    pub fn set_skip(&self, skip: usize) {
        if let Some(ctx) = self.lifecycle.context("set_skip") {
            ctx.set_state(StatePatch::new().skip(skip));
        }
    }

    /// Skip of the page after the current one
    pub fn next_skip(&self) -> usize {
        self.lifecycle.context("next_skip").map_or(0, |ctx| {
            ctx.store().read(|state| state.skip) + ctx.props().limit()
        })
    }

    pub fn can_load_more(&self) -> bool {
        self.lifecycle.context("can_load_more").is_some_and(|ctx| {
            ctx.props().is_scroll_fetching
                && ctx
                    .store()
                    .read(|state| state.can_trigger_load_more && !state.fetching)
        })
    }

    /// Track dropdown visibility
    ///
    /// Closing cancels outstanding searches and restores the pre-search
    /// baseline in one patch.
    pub fn handle_visible_change(&self, visible: bool) {
        let Some(ctx) = self.lifecycle.context("handle_visible_change") else {
            return;
        };
        if visible {
            ctx.set_state(StatePatch::new().visible(true));
            return;
        }

        if let Some(search) = ctx.plugin::<SearchHandlerPlugin>(PluginType::SearchHandler) {
            search.cancel_in_flight();
        }
        ctx.store().update(|state| {
            Some(
                StatePatch::new()
                    .visible(false)
                    .skip(0)
                    .can_trigger_load_more(true)
                    .fetching(false)
                    .loading(false)
                    .search_value("")
                    .fetch_options(state.init_fetch_options.clone()),
            )
        });
        ctx.emit(EngineAction::PaginationReset, json!({ "reason": "closed" }));
    }

    /// Request the next page when the popup is scrolled to the bottom
    ///
    /// Returns whether a scroll search was scheduled.
    pub fn handle_popup_scroll(&self, metrics: ScrollMetrics) -> bool {
        let Some(ctx) = self.lifecycle.context("handle_popup_scroll") else {
            return false;
        };
        if !metrics.near_bottom() || !self.can_load_more() {
            return false;
        }
        let Some(search) = ctx.plugin::<SearchHandlerPlugin>(PluginType::SearchHandler) else {
            return false;
        };

        let search_value = ctx.store().read(|state| state.search_value.clone());
        ctx.emit(
            EngineAction::LoadMore,
            json!({ "skip": self.next_skip(), "search": search_value }),
        );
        search.debounced_search(SearchRequest::scroll(&search_value));
        true
    }
}

impl Plugin for PaginationPlugin {
    fn plugin_type(&self) -> PluginType {
        PluginType::Pagination
    }

    fn init(&self, context: Arc<PluginContext>) -> PluginResult<()> {
        self.lifecycle.activate(context)
    }

    fn destroy(&self) {
        self.lifecycle.destroy();
    }

    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.state()
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::props::{PageRequest, SelectProps};
    use crate::plugin::builtin::cache::SharedCache;
    use crate::plugin::context::PluginUtils;
    use crate::plugin::events::default_debug_logger;
    use crate::plugin::manager::PluginManager;
    use crate::source::option::SelectOption;

    fn manager(scroll: bool) -> PluginManager {
        PluginManager::with_builtin_plugins(
            SelectProps {
                is_scroll_fetching: scroll,
                page_req: PageRequest { limit: 10 },
                ..Default::default()
            },
            PluginUtils::new(default_debug_logger(), SharedCache::new()),
        )
        .unwrap()
    }

    fn pagination(manager: &PluginManager) -> Arc<PaginationPlugin> {
        manager
            .get_plugin::<PaginationPlugin>(PluginType::Pagination)
            .unwrap()
    }

    #[test]
    fn test_near_bottom_threshold() {
        assert!(ScrollMetrics::new(291.0, 200.0, 500.0).near_bottom());
        assert!(ScrollMetrics::new(290.0, 200.0, 500.0).near_bottom());
        assert!(!ScrollMetrics::new(289.0, 200.0, 500.0).near_bottom());
    }

    #[test]
    fn test_skip_tracking() {
        let manager = manager(true);
        let plugin = pagination(&manager);

        plugin.set_skip(30);
        assert_eq!(plugin.get_current_skip(), 30);
        assert_eq!(plugin.next_skip(), 40);

        plugin.reset_pagination();
        assert_eq!(plugin.get_current_skip(), 0);
    }

    #[test]
    fn test_can_load_more_conditions() {
        let manager = manager(true);
        let plugin = pagination(&manager);
        assert!(plugin.can_load_more());

        manager.set_state(StatePatch::new().fetching(true));
        assert!(!plugin.can_load_more());

        manager.set_state(StatePatch::new().fetching(false).can_trigger_load_more(false));
        assert!(!plugin.can_load_more());

        let manager = self::manager(false);
        assert!(!pagination(&manager).can_load_more());
    }

    #[test]
    fn test_close_restores_baseline() {
        let manager = manager(true);
        let plugin = pagination(&manager);
        let baseline = vec![SelectOption::new("A", 1)];
        manager.set_state(
            StatePatch::new()
                .visible(true)
                .init_fetch_options(baseline.clone())
                .fetch_options(vec![SelectOption::new("Z", 26)])
                .skip(20)
                .search_value("z")
                .fetching(true)
                .can_trigger_load_more(false),
        );

        plugin.handle_visible_change(false);

        let state = manager.state();
        assert!(!state.visible);
        assert_eq!(state.fetch_options, baseline);
        assert_eq!(state.skip, 0);
        assert_eq!(state.search_value, "");
        assert!(state.can_trigger_load_more);
        assert!(!state.fetching);
    }

    #[test]
    fn test_scroll_ignored_when_not_at_bottom_or_exhausted() {
        let manager = manager(true);
        let plugin = pagination(&manager);
        assert!(!plugin.handle_popup_scroll(ScrollMetrics::new(0.0, 200.0, 500.0)));

        manager.set_state(StatePatch::new().can_trigger_load_more(false));
        assert!(!plugin.handle_popup_scroll(ScrollMetrics::new(300.0, 200.0, 500.0)));
    }

    #[test]
    fn test_after_destroy_returns_defaults() {
        let manager = manager(true);
        let plugin = pagination(&manager);
        manager.set_state(StatePatch::new().skip(10));
        manager.destroy();

        assert_eq!(plugin.get_current_skip(), 0);
        assert_eq!(plugin.next_skip(), 0);
        assert!(!plugin.can_load_more());
        assert!(!plugin.handle_popup_scroll(ScrollMetrics::new(300.0, 200.0, 500.0)));
        plugin.handle_visible_change(false);
    }
}
