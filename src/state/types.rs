//! Engine state and merge patches

use crate::source::option::SelectOption;

/// Per-instance engine state
///
/// `loading` and `fetching` gate `fetch_options`; every write that changes the
/// options also sets both flags in the same [`StatePatch`].
#[derive(Debug, Clone, PartialEq)]
pub struct EngineState {
    pub fetch_options: Vec<SelectOption>,
    /// Baseline restored when the dropdown closes
    pub init_fetch_options: Vec<SelectOption>,
    pub loading: bool,
    pub fetching: bool,
    pub skip: usize,
    pub search_value: String,
    pub can_trigger_load_more: bool,
    pub mounted: bool,
    /// Fingerprint of the descriptor that produced `fetch_options`
    pub last_data_source_api: Option<String>,
    pub visible: bool,
}

impl Default for EngineState {
    fn default() -> Self {
        Self {
            fetch_options: Vec::new(),
            init_fetch_options: Vec::new(),
            loading: false,
            fetching: false,
            skip: 0,
            search_value: String::new(),
            can_trigger_load_more: true,
            mounted: false,
            last_data_source_api: None,
            visible: false,
        }
    }
}

/// Partial update merged into [`EngineState`]
///
/// Unset fields leave the state untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatePatch {
    pub fetch_options: Option<Vec<SelectOption>>,
    pub init_fetch_options: Option<Vec<SelectOption>>,
    pub loading: Option<bool>,
    pub fetching: Option<bool>,
    pub skip: Option<usize>,
    pub search_value: Option<String>,
    pub can_trigger_load_more: Option<bool>,
    pub mounted: Option<bool>,
    pub last_data_source_api: Option<Option<String>>,
    pub visible: Option<bool>,
}

impl StatePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fetch_options(mut self, options: Vec<SelectOption>) -> Self {
        self.fetch_options = Some(options);
        self
    }

    pub fn init_fetch_options(mut self, options: Vec<SelectOption>) -> Self {
        self.init_fetch_options = Some(options);
        self
    }

    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = Some(loading);
        self
    }

    pub fn fetching(mut self, fetching: bool) -> Self {
        self.fetching = Some(fetching);
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn search_value(mut self, value: impl Into<String>) -> Self {
        self.search_value = Some(value.into());
        self
    }

    pub fn can_trigger_load_more(mut self, can: bool) -> Self {
        self.can_trigger_load_more = Some(can);
        self
    }

    pub fn mounted(mut self, mounted: bool) -> Self {
        self.mounted = Some(mounted);
        self
    }

    pub fn last_data_source_api(mut self, api: Option<String>) -> Self {
        self.last_data_source_api = Some(api);
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge into `state`, returning whether anything changed
    pub fn apply(self, state: &mut EngineState) -> bool {
        let before = state.clone();

        if let Some(options) = self.fetch_options {
            state.fetch_options = options;
        }
        if let Some(options) = self.init_fetch_options {
            state.init_fetch_options = options;
        }
        if let Some(loading) = self.loading {
            state.loading = loading;
        }
        if let Some(fetching) = self.fetching {
            state.fetching = fetching;
        }
        if let Some(skip) = self.skip {
            state.skip = skip;
        }
        if let Some(search_value) = self.search_value {
            state.search_value = search_value;
        }
        if let Some(can) = self.can_trigger_load_more {
            state.can_trigger_load_more = can;
        }
        if let Some(mounted) = self.mounted {
            state.mounted = mounted;
        }
        if let Some(api) = self.last_data_source_api {
            state.last_data_source_api = api;
        }
        if let Some(visible) = self.visible {
            state.visible = visible;
        }

        *state != before
    }
}
