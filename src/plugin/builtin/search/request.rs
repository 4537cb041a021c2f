//! Search requests and parameter building

use crate::engine::props::SelectProps;
use crate::plugin::builtin::fetcher::VALUE_PARAM;
use crate::source::descriptor::{DataSource, SearchParams};
use crate::source::option::SelectValue;
use serde_json::{json, Value};

/// Key used when no search key is configured
pub const GENERIC_SEARCH_PARAM: &str = "search";

/// One invocation of the search function
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchRequest {
    /// Externally supplied value to resolve into options
    pub init_value: Option<SelectValue>,
    /// User-typed search text
    pub input_value: Option<String>,
    /// Load the next page and append
    pub scroll: bool,
    pub is_option_append: bool,
    /// Tokens from a paste, looked up under `paste_value_key`
    pub paste_values: Option<Vec<String>>,
}

impl SearchRequest {
    /// Plain fetch with no search text
    pub fn base() -> Self {
        Self::default()
    }

    pub fn input(value: impl Into<String>) -> Self {
        Self {
            input_value: Some(value.into()),
            ..Default::default()
        }
    }

    /// Next page for the current search text
    pub fn scroll(search_value: &str) -> Self {
        Self {
            input_value: (!search_value.is_empty()).then(|| search_value.to_string()),
            scroll: true,
            is_option_append: true,
            ..Default::default()
        }
    }

    /// Resolve `value` to options, merged into the current list
    pub fn init(value: SelectValue) -> Self {
        Self {
            init_value: Some(value),
            is_option_append: true,
            ..Default::default()
        }
    }

    pub fn paste(values: Vec<String>) -> Self {
        Self {
            paste_values: Some(values),
            ..Default::default()
        }
    }

    /// Whether the result may be served from or stored to the shared cache
    pub fn is_base(&self) -> bool {
        *self == Self::base()
    }

    pub fn appends(&self) -> bool {
        self.scroll || self.is_option_append
    }

    pub fn search_text(&self) -> &str {
        self.input_value.as_deref().unwrap_or_default()
    }
}

/// Build the remote search parameters for `request`
///
/// Paste lookups win, then value resolution. Search text goes under every
/// `multi_search_keys` entry if any are configured, else `remote_search_key`,
/// else `search_key`, else [`GENERIC_SEARCH_PARAM`].
pub fn build_search_params(props: &SelectProps, request: &SearchRequest) -> SearchParams {
    let mut params = SearchParams::new();

    if let (Some(key), Some(values)) = (props.paste_value_key.as_deref(), &request.paste_values) {
        params.insert(key.to_string(), json!(values));
        return params;
    }

    if let Some(init) = &request.init_value {
        let values: Vec<Value> = init.values().into_iter().map(|v| v.to_json()).collect();
        params.insert(value_lookup_key(props), Value::Array(values));
    }

    let text = request.search_text();
    if text.is_empty() {
        return params;
    }

    if !props.multi_search_keys.is_empty() {
        for spec in &props.multi_search_keys {
            let value = if spec.numeric {
                numeric_or_text(text)
            } else {
                Value::String(text.to_string())
            };
            params.insert(spec.key.clone(), value);
        }
        return params;
    }

    let key = non_empty(props.remote_search_key.as_deref())
        .or(non_empty(props.search_key.as_deref()))
        .unwrap_or(GENERIC_SEARCH_PARAM);
    params.insert(key.to_string(), Value::String(text.to_string()));
    params
}

fn non_empty(key: Option<&str>) -> Option<&str> {
    key.filter(|key| !key.is_empty())
}

fn value_lookup_key(props: &SelectProps) -> String {
    match &props.data_source {
        Some(DataSource::Service(descriptor)) => descriptor
            .option_config
            .as_ref()
            .map(|config| config.value_key.clone())
            .unwrap_or_else(|| VALUE_PARAM.to_string()),
        _ => VALUE_PARAM.to_string(),
    }
}

/// Numeric coercion keeping the text when it does not parse
fn numeric_or_text(text: &str) -> Value {
    let trimmed = text.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return json!(i);
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() => json!(f),
        _ => Value::String(text.to_string()),
    }
}
