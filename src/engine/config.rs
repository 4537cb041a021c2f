//! TOML configuration
//!
//! Plain-data engine props and the service descriptor section, loaded from
//! an explicit file or from the default config location.

use crate::engine::props::{
    PageRequest, SearchKeySpec, SelectMode, SelectProps, DEFAULT_CACHE_TTL_MS,
    DEFAULT_DEBOUNCE_MS, DEFAULT_MIN_LOADING_MS,
};
use crate::source::descriptor::{DataSource, SearchParams, ServiceApi, ServiceDescriptor};
use crate::source::error::{EngineError, EngineResult};
use crate::source::option::OptionConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Service descriptor section (`[data_source]`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataSourceConfig {
    pub api: String,
    #[serde(default)]
    pub payload: SearchParams,
    #[serde(default)]
    pub response_entity_key: Option<String>,
    #[serde(default)]
    pub json_entity_key: Option<String>,
    #[serde(default)]
    pub option_config: Option<OptionConfig>,
    /// Base URL for the HTTP service; absent means a fixture is expected
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl DataSourceConfig {
    /// Bind this section to a concrete service
    pub fn into_data_source(self, service: Arc<dyn ServiceApi>) -> DataSource {
        let mut descriptor = ServiceDescriptor::new(service, self.api).with_payload(self.payload);
        descriptor.response_entity_key = self.response_entity_key;
        descriptor.json_entity_key = self.json_entity_key;
        descriptor.option_config = self.option_config;
        DataSource::Service(descriptor)
    }
}

/// Engine configuration file contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub search_key: Option<String>,
    pub remote_search_key: Option<String>,
    pub multi_search_keys: Vec<SearchKeySpec>,
    pub cache_key: Option<String>,
    pub data_source_share: bool,
    pub is_scroll_fetching: bool,
    pub is_debounced_fetch: bool,
    pub can_fetch: bool,
    pub page_req: PageRequest,
    pub debounce_ms: u64,
    pub cache_ttl_ms: u64,
    pub min_loading_ms: u64,
    pub paste_value_key: Option<String>,
    pub paste_separators: Option<String>,
    pub mode: SelectMode,
    pub default_active_first_option: bool,
    pub log_level: Option<String>,
    pub data_source: Option<DataSourceConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            search_key: None,
            remote_search_key: None,
            multi_search_keys: Vec::new(),
            cache_key: None,
            data_source_share: false,
            is_scroll_fetching: false,
            is_debounced_fetch: true,
            can_fetch: true,
            page_req: PageRequest::default(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            cache_ttl_ms: DEFAULT_CACHE_TTL_MS,
            min_loading_ms: DEFAULT_MIN_LOADING_MS,
            paste_value_key: None,
            paste_separators: None,
            mode: SelectMode::Single,
            default_active_first_option: false,
            log_level: None,
            data_source: None,
        }
    }
}

impl EngineConfig {
    /// Parse and validate TOML text
    pub fn from_toml_str(contents: &str) -> EngineResult<Self> {
        let config: EngineConfig =
            toml::from_str(contents).map_err(|e| EngineError::Configuration {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub async fn load(path: &Path) -> EngineResult<Self> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| EngineError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            EngineError::Configuration { message } => EngineError::Configuration {
                message: format!("{}: {}", path.display(), message),
            },
            other => other,
        })
    }

    /// `<config dir>/selectengine/selectengine.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("selectengine").join("selectengine.toml"))
    }

    /// Resolve the config to use
    ///
    /// An explicit path must exist. Without one, the default location is used
    /// when present; otherwise there is no config file.
    pub async fn discover(explicit: Option<&Path>) -> EngineResult<Option<Self>> {
        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(EngineError::Configuration {
                        message: format!(
                            "The specified configuration file does not exist: {}",
                            path.display()
                        ),
                    });
                }
                Self::load(path).await.map(Some)
            }
            None => match Self::default_path() {
                Some(path) if path.exists() => {
                    log::debug!("EngineConfig: using default config {}", path.display());
                    Self::load(&path).await.map(Some)
                }
                _ => Ok(None),
            },
        }
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.page_req.limit == 0 {
            return Err(EngineError::Configuration {
                message: "page_req.limit must be greater than zero".to_string(),
            });
        }
        if let Some(spec) = self.multi_search_keys.iter().find(|spec| spec.key.trim().is_empty()) {
            return Err(EngineError::Configuration {
                message: format!("multi_search_keys contains an empty key: {:?}", spec),
            });
        }
        if self.data_source_share && self.cache_key.as_deref().map_or(true, str::is_empty) {
            return Err(EngineError::Configuration {
                message: "data_source_share requires a cache_key".to_string(),
            });
        }
        if let Some(source) = &self.data_source {
            if source.api.trim().is_empty() {
                return Err(EngineError::Configuration {
                    message: "data_source.api must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Props without a data source or callbacks
    pub fn to_props(&self) -> SelectProps {
        SelectProps {
            search_key: self.search_key.clone(),
            remote_search_key: self.remote_search_key.clone(),
            multi_search_keys: self.multi_search_keys.clone(),
            cache_key: self.cache_key.clone(),
            data_source_share: self.data_source_share,
            is_scroll_fetching: self.is_scroll_fetching,
            is_debounced_fetch: self.is_debounced_fetch,
            can_fetch: self.can_fetch,
            page_req: self.page_req,
            debounce: Duration::from_millis(self.debounce_ms),
            cache_ttl: Duration::from_millis(self.cache_ttl_ms),
            min_loading: Duration::from_millis(self.min_loading_ms),
            paste_value_key: self.paste_value_key.clone(),
            paste_separators: self.paste_separators.clone(),
            mode: self.mode,
            default_active_first_option: self.default_active_first_option,
            ..Default::default()
        }
    }
}

impl SelectProps {
    /// Props from config, binding the `[data_source]` section to `service`
    pub fn from_config(config: &EngineConfig, service: Option<Arc<dyn ServiceApi>>) -> Self {
        let mut props = config.to_props();
        if let (Some(source), Some(service)) = (config.data_source.clone(), service) {
            props.data_source = Some(source.into_data_source(service));
        }
        props
    }
}
