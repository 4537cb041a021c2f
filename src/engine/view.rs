//! Derived render values
//!
//! What the host renders: the loading flag, options with echoes for selected
//! values the fetch did not return, the selected value coerced into the option
//! value space, and the optional default active option.

use crate::engine::props::SelectProps;
use crate::source::option::{dedupe_options, OptionValue, SelectOption, SelectValue};
use crate::state::EngineState;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectView {
    pub loading: bool,
    pub final_options: Vec<SelectOption>,
    pub final_value: Option<SelectValue>,
    pub final_default_value: Option<OptionValue>,
}

pub fn compute_view(props: &SelectProps, state: &EngineState) -> SelectView {
    let final_value = coerce_value(props.value.as_ref(), &state.fetch_options);
    let final_options = with_echoes(&state.fetch_options, final_value.as_ref());
    let final_default_value = if props.default_active_first_option && final_value.is_none() {
        final_options
            .iter()
            .find(|option| !option.disabled)
            .map(|option| option.value.clone())
    } else {
        None
    };

    SelectView {
        loading: state.loading,
        final_options,
        final_value,
        final_default_value,
    }
}

/// Coerce the selection into the value space of the first option
///
/// Empty selections become `None`.
fn coerce_value(value: Option<&SelectValue>, options: &[SelectOption]) -> Option<SelectValue> {
    let value = value.filter(|v| !v.is_empty())?;
    match options.first() {
        Some(first) => {
            let kind = first.value.kind();
            Some(value.map(|v| v.coerce_to(kind)))
        }
        None => Some(value.clone()),
    }
}

fn with_echoes(options: &[SelectOption], value: Option<&SelectValue>) -> Vec<SelectOption> {
    let mut combined = dedupe_options(options.to_vec());
    if let Some(value) = value {
        let mut present: HashSet<String> =
            combined.iter().map(|o| o.value.dedupe_key()).collect();
        for selected in value.values() {
            if present.insert(selected.dedupe_key()) {
                combined.push(SelectOption::echo(selected));
            }
        }
    }
    combined
}
