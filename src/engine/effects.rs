//! Fetch effects
//!
//! Decides, from one transition of the watched inputs, which fetches to
//! trigger. The decision is pure; [`SelectEngine`](crate::engine::SelectEngine)
//! carries the actions out.

use crate::engine::props::{dependency_is_valid, SelectProps};
use crate::source::descriptor::DataSource;
use crate::source::option::value_is_empty;
use crate::state::EngineState;
use serde_json::Value;

/// Snapshot of every input the effects watch
#[derive(Debug, Clone, PartialEq)]
pub struct EffectInputs {
    pub search_value: String,
    pub can_fetch: bool,
    pub fingerprint: Option<String>,
    pub source_valid: bool,
    pub dependency: Option<Value>,
    pub value_empty: bool,
}

impl EffectInputs {
    pub fn capture(props: &SelectProps, state: &EngineState) -> Self {
        Self {
            search_value: state.search_value.clone(),
            can_fetch: props.can_fetch,
            fingerprint: props.data_source_fingerprint(),
            source_valid: props.data_source.as_ref().is_some_and(DataSource::is_valid),
            dependency: props.dependency.clone(),
            value_empty: value_is_empty(props.value.as_ref()),
        }
    }

    fn eligible(&self) -> bool {
        self.can_fetch && self.source_valid
    }
}

/// What a transition asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchAction {
    /// First fetch for an unpopulated list
    BaseFetch,
    /// The value was cleared; drop value-scoped options and fetch again
    Refetch,
    /// New dependency token; invalidate and fetch without debouncing
    DependencyInvalidate,
    /// A different descriptor now backs a populated list
    DescriptorInvalidate,
    /// Dropdown opened on an empty list
    OpenFetch,
}

/// Remembers the previous inputs between evaluations
#[derive(Debug, Default)]
pub struct FetchEffects {
    previous: Option<EffectInputs>,
}

impl FetchEffects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate the decision table for the transition to `next`
    ///
    /// A dependency invalidation already refetches, so it suppresses every
    /// other rule for the same transition.
    pub fn evaluate(&mut self, next: EffectInputs, state: &EngineState) -> Vec<FetchAction> {
        let previous = self.previous.replace(next.clone());
        let mut actions = Vec::new();

        if let Some(previous) = &previous {
            if previous == &next {
                return actions;
            }
            if previous.dependency != next.dependency && dependency_is_valid(next.dependency.as_ref()) {
                actions.push(FetchAction::DependencyInvalidate);
                return actions;
            }
            if next.eligible() && !previous.value_empty && next.value_empty {
                actions.push(FetchAction::Refetch);
                return actions;
            }
            // An in-flight fetch or a mounted baseline belongs to the old
            // descriptor as much as visible options do
            let populated = !state.fetch_options.is_empty()
                || state.visible
                || state.fetching
                || state.mounted;
            if next.eligible()
                && previous.fingerprint.is_some()
                && previous.fingerprint != next.fingerprint
                && populated
            {
                actions.push(FetchAction::DescriptorInvalidate);
                return actions;
            }
        }

        if next.eligible()
            && next.search_value.is_empty()
            && state.fetch_options.is_empty()
            && !state.mounted
            && !state.fetching
        {
            actions.push(FetchAction::BaseFetch);
        }
        actions
    }

    /// Decision when the dropdown opens
    pub fn on_open(props: &SelectProps, state: &EngineState) -> Option<FetchAction> {
        let inputs = EffectInputs::capture(props, state);
        if !inputs.eligible() || state.fetching {
            return None;
        }
        if state.fetch_options.is_empty() {
            return Some(FetchAction::OpenFetch);
        }
        match (&state.last_data_source_api, &inputs.fingerprint) {
            (Some(last), Some(current)) if last != current => Some(FetchAction::DescriptorInvalidate),
            _ => None,
        }
    }
}
