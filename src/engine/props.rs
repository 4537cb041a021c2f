//! Inbound props
//!
//! Everything the host hands the engine: the data source, the dependency
//! token, the current value, search-key strategy, paging and the callbacks.
//! Plain-data props come from [`EngineConfig`](crate::engine::config::EngineConfig);
//! callbacks are attached with the `with_*` builders.

use crate::source::descriptor::{DataSource, SearchParams};
use crate::source::option::{SelectOption, SelectValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_PAGE_LIMIT: usize = 20;
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_CACHE_TTL_MS: u64 = 5000;
pub const DEFAULT_MIN_LOADING_MS: u64 = 200;

/// Transform applied to request parameters just before the call
pub type HandleParams = Arc<dyn Fn(SearchParams) -> SearchParams + Send + Sync>;
/// Post-filter applied to every produced option list
pub type HandleOptions = Arc<dyn Fn(Vec<SelectOption>) -> Vec<SelectOption> + Send + Sync>;
/// `onChange(value, options)`
pub type OnChange = Arc<dyn Fn(Option<&SelectValue>, &[SelectOption]) + Send + Sync>;
/// `onOptionsChange(options)`
pub type OnOptionsChange = Arc<dyn Fn(&[SelectOption]) + Send + Sync>;

/// One field of a multi-key remote search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchKeySpec {
    pub key: String,
    /// Send the typed text as a number when it parses as one
    #[serde(default)]
    pub numeric: bool,
}

impl SearchKeySpec {
    pub fn text(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            numeric: false,
        }
    }

    pub fn numeric(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            numeric: true,
        }
    }
}

/// Paging request size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_PAGE_LIMIT
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// Single or multiple selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectMode {
    #[default]
    Single,
    Multiple,
}

/// Props for one control instance
#[derive(Clone)]
pub struct SelectProps {
    pub data_source: Option<DataSource>,
    /// Opaque token; a by-value change invalidates every fetched option
    pub dependency: Option<Value>,
    pub value: Option<SelectValue>,
    pub search_key: Option<String>,
    pub remote_search_key: Option<String>,
    pub multi_search_keys: Vec<SearchKeySpec>,
    pub cache_key: Option<String>,
    pub data_source_share: bool,
    pub is_scroll_fetching: bool,
    pub is_debounced_fetch: bool,
    pub can_fetch: bool,
    pub page_req: PageRequest,
    pub debounce: Duration,
    pub cache_ttl: Duration,
    pub min_loading: Duration,
    pub paste_value_key: Option<String>,
    pub paste_separators: Option<String>,
    pub mode: SelectMode,
    pub default_active_first_option: bool,
    pub handle_params: Option<HandleParams>,
    pub handle_options: Option<HandleOptions>,
    pub on_change: Option<OnChange>,
    pub on_options_change: Option<OnOptionsChange>,
}

impl Default for SelectProps {
    fn default() -> Self {
        Self {
            data_source: None,
            dependency: None,
            value: None,
            search_key: None,
            remote_search_key: None,
            multi_search_keys: Vec::new(),
            cache_key: None,
            data_source_share: false,
            is_scroll_fetching: false,
            is_debounced_fetch: true,
            can_fetch: true,
            page_req: PageRequest::default(),
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            cache_ttl: Duration::from_millis(DEFAULT_CACHE_TTL_MS),
            min_loading: Duration::from_millis(DEFAULT_MIN_LOADING_MS),
            paste_value_key: None,
            paste_separators: None,
            mode: SelectMode::Single,
            default_active_first_option: false,
            handle_params: None,
            handle_options: None,
            on_change: None,
            on_options_change: None,
        }
    }
}

impl std::fmt::Debug for SelectProps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectProps")
            .field("data_source", &self.data_source)
            .field("dependency", &self.dependency)
            .field("value", &self.value)
            .field("search_key", &self.search_key)
            .field("remote_search_key", &self.remote_search_key)
            .field("multi_search_keys", &self.multi_search_keys)
            .field("cache_key", &self.cache_key)
            .field("data_source_share", &self.data_source_share)
            .field("is_scroll_fetching", &self.is_scroll_fetching)
            .field("is_debounced_fetch", &self.is_debounced_fetch)
            .field("can_fetch", &self.can_fetch)
            .field("page_req", &self.page_req)
            .field("debounce", &self.debounce)
            .field("mode", &self.mode)
            .field("handle_params", &self.handle_params.is_some())
            .field("handle_options", &self.handle_options.is_some())
            .field("on_change", &self.on_change.is_some())
            .field("on_options_change", &self.on_options_change.is_some())
            .finish()
    }
}

impl SelectProps {
    pub fn new(data_source: DataSource) -> Self {
        Self {
            data_source: Some(data_source),
            ..Default::default()
        }
    }

    pub fn with_data_source(mut self, data_source: DataSource) -> Self {
        self.data_source = Some(data_source);
        self
    }

    pub fn with_dependency(mut self, dependency: Value) -> Self {
        self.dependency = Some(dependency);
        self
    }

    pub fn with_value(mut self, value: SelectValue) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_handle_params<F>(mut self, f: F) -> Self
    where
        F: Fn(SearchParams) -> SearchParams + Send + Sync + 'static,
    {
        self.handle_params = Some(Arc::new(f));
        self
    }

    pub fn with_handle_options<F>(mut self, f: F) -> Self
    where
        F: Fn(Vec<SelectOption>) -> Vec<SelectOption> + Send + Sync + 'static,
    {
        self.handle_options = Some(Arc::new(f));
        self
    }

    pub fn with_on_change<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&SelectValue>, &[SelectOption]) + Send + Sync + 'static,
    {
        self.on_change = Some(Arc::new(f));
        self
    }

    pub fn with_on_options_change<F>(mut self, f: F) -> Self
    where
        F: Fn(&[SelectOption]) + Send + Sync + 'static,
    {
        self.on_options_change = Some(Arc::new(f));
        self
    }

    /// Fingerprint of the configured descriptor, if any
    pub fn data_source_fingerprint(&self) -> Option<String> {
        self.data_source.as_ref().map(DataSource::fingerprint)
    }

    /// Cache key used in data-source-shared mode
    pub fn shared_cache_key(&self) -> Option<&str> {
        if self.data_source_share {
            self.cache_key.as_deref().filter(|key| !key.is_empty())
        } else {
            None
        }
    }

    pub fn limit(&self) -> usize {
        self.page_req.limit.max(1)
    }
}

/// Whether a dependency token carries a usable value
///
/// `null`, empty strings and empty arrays/objects are not valid tokens.
pub fn dependency_is_valid(dependency: Option<&Value>) -> bool {
    match dependency {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(fields)) => !fields.is_empty(),
        Some(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let props = SelectProps::default();
        assert!(props.can_fetch);
        assert!(props.is_debounced_fetch);
        assert_eq!(props.limit(), DEFAULT_PAGE_LIMIT);
        assert_eq!(props.debounce, Duration::from_millis(300));
        assert_eq!(props.data_source_fingerprint(), None);
    }

    #[test]
    fn test_shared_cache_key_requires_share_mode() {
        let mut props = SelectProps {
            cache_key: Some("users".to_string()),
            ..Default::default()
        };
        assert_eq!(props.shared_cache_key(), None);

        props.data_source_share = true;
        assert_eq!(props.shared_cache_key(), Some("users"));

        props.cache_key = Some(String::new());
        assert_eq!(props.shared_cache_key(), None);
    }

    #[test]
    fn test_dependency_validity() {
        assert!(!dependency_is_valid(None));
        assert!(!dependency_is_valid(Some(&json!(null))));
        assert!(!dependency_is_valid(Some(&json!([]))));
        assert!(!dependency_is_valid(Some(&json!(""))));
        assert!(dependency_is_valid(Some(&json!(["p1"]))));
        assert!(dependency_is_valid(Some(&json!(0))));
    }

    #[test]
    fn test_debug_hides_callbacks() {
        let props = SelectProps::default().with_on_change(|_, _| {});
        let debug = format!("{:?}", props);
        assert!(debug.contains("on_change: true"));
    }
}
