//! Selectable options and values
//!
//! Options are immutable once produced; every list the engine publishes is a
//! fresh `Vec`, never an in-place edit of a previous one.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

/// A single option value as it travels between data source and host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// Coarse value space used when coercing a selected value to match options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    Number,
    Text,
}

impl OptionValue {
    /// Convert a JSON scalar into an option value
    ///
    /// Objects, arrays and null are not valid option values.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(OptionValue::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(OptionValue::Int(i)),
                None => n.as_f64().map(OptionValue::Float),
            },
            Value::String(s) => Some(OptionValue::Text(s.clone())),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            OptionValue::Bool(b) => Value::Bool(*b),
            OptionValue::Int(i) => Value::from(*i),
            OptionValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(f.to_string())),
            OptionValue::Text(s) => Value::String(s.clone()),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            OptionValue::Bool(_) => ValueKind::Bool,
            OptionValue::Int(_) | OptionValue::Float(_) => ValueKind::Number,
            OptionValue::Text(_) => ValueKind::Text,
        }
    }

    /// Identity key used for de-duplication
    ///
    /// Keys are typed so `1` and `"1"` stay distinct options.
    pub fn dedupe_key(&self) -> String {
        match self {
            OptionValue::Bool(b) => format!("b:{}", b),
            OptionValue::Int(i) => format!("n:{}", i),
            OptionValue::Float(f) if f.fract() == 0.0 && f.is_finite() => format!("n:{}", *f as i64),
            OptionValue::Float(f) => format!("n:{}", f),
            OptionValue::Text(s) => format!("s:{}", s),
        }
    }

    /// Coerce this value into another value space
    ///
    /// Failed conversions (including NaN) keep the original value rather than
    /// dropping it.
    pub fn coerce_to(&self, kind: ValueKind) -> OptionValue {
        if self.kind() == kind {
            return self.clone();
        }
        match (self, kind) {
            (OptionValue::Text(s), ValueKind::Number) => {
                let trimmed = s.trim();
                if let Ok(i) = trimmed.parse::<i64>() {
                    OptionValue::Int(i)
                } else {
                    match trimmed.parse::<f64>() {
                        Ok(f) if f.is_finite() => OptionValue::Float(f),
                        _ => self.clone(),
                    }
                }
            }
            (OptionValue::Text(s), ValueKind::Bool) => match s.trim() {
                "true" => OptionValue::Bool(true),
                "false" => OptionValue::Bool(false),
                _ => self.clone(),
            },
            (_, ValueKind::Text) => OptionValue::Text(self.to_string()),
            _ => self.clone(),
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{}", b),
            OptionValue::Int(i) => write!(f, "{}", i),
            OptionValue::Float(v) => write!(f, "{}", v),
            OptionValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Text(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Int(value)
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        OptionValue::Int(i64::from(value))
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

/// A selectable option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: OptionValue,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
    /// Source record the option was built from, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            disabled: false,
            extra: None,
        }
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Echo option for a value that has no fetched counterpart
    pub fn echo(value: &OptionValue) -> Self {
        Self::new(value.to_string(), value.clone())
    }
}

/// The host's current selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectValue {
    Multiple(Vec<OptionValue>),
    Single(OptionValue),
}

impl SelectValue {
    pub fn values(&self) -> Vec<&OptionValue> {
        match self {
            SelectValue::Single(v) => vec![v],
            SelectValue::Multiple(vs) => vs.iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            SelectValue::Single(OptionValue::Text(s)) => s.is_empty(),
            SelectValue::Single(_) => false,
            SelectValue::Multiple(vs) => vs.is_empty(),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            SelectValue::Single(v) => v.to_json(),
            SelectValue::Multiple(vs) => Value::Array(vs.iter().map(OptionValue::to_json).collect()),
        }
    }

    /// Map every contained value through `f`, keeping the single/multiple shape
    pub fn map(&self, f: impl Fn(&OptionValue) -> OptionValue) -> SelectValue {
        match self {
            SelectValue::Single(v) => SelectValue::Single(f(v)),
            SelectValue::Multiple(vs) => SelectValue::Multiple(vs.iter().map(f).collect()),
        }
    }
}

/// True when a value is absent or holds nothing
pub fn value_is_empty(value: Option<&SelectValue>) -> bool {
    value.map_or(true, SelectValue::is_empty)
}

/// Mapping from a raw response record to an option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionConfig {
    #[serde(default = "default_value_key")]
    pub value_key: String,
    #[serde(default = "default_label_key")]
    pub label_key: String,
    #[serde(default)]
    pub disabled_key: Option<String>,
}

fn default_value_key() -> String {
    "value".to_string()
}

fn default_label_key() -> String {
    "label".to_string()
}

impl Default for OptionConfig {
    fn default() -> Self {
        Self {
            value_key: default_value_key(),
            label_key: default_label_key(),
            disabled_key: None,
        }
    }
}

impl OptionConfig {
    pub fn new(value_key: impl Into<String>, label_key: impl Into<String>) -> Self {
        Self {
            value_key: value_key.into(),
            label_key: label_key.into(),
            disabled_key: None,
        }
    }

    /// Build an option from one response record
    ///
    /// Records without a usable scalar under `value_key` yield `None`.
    pub fn to_option(&self, record: &Value) -> Option<SelectOption> {
        let value = record.get(&self.value_key).and_then(OptionValue::from_json)?;
        let label = match record.get(&self.label_key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => value.to_string(),
        };
        let disabled = self
            .disabled_key
            .as_ref()
            .and_then(|key| record.get(key))
            .and_then(Value::as_bool)
            .unwrap_or(false);

        Some(SelectOption {
            label,
            value,
            disabled,
            extra: Some(record.clone()),
        })
    }
}

/// Drop options whose value already appeared earlier in the list
pub fn dedupe_options(options: Vec<SelectOption>) -> Vec<SelectOption> {
    let mut seen = HashSet::new();
    options
        .into_iter()
        .filter(|option| seen.insert(option.value.dedupe_key()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_to_option() {
        let config = OptionConfig::new("id", "name");
        let option = config.to_option(&json!({"id": 1, "name": "A"})).unwrap();

        assert_eq!(option.value, OptionValue::Int(1));
        assert_eq!(option.label, "A");
        assert!(!option.disabled);
        assert_eq!(option.extra, Some(json!({"id": 1, "name": "A"})));
    }

    #[test]
    fn test_record_without_value_is_skipped() {
        let config = OptionConfig::new("id", "name");
        assert!(config.to_option(&json!({"name": "orphan"})).is_none());
        assert!(config.to_option(&json!({"id": {"nested": 1}})).is_none());
    }

    #[test]
    fn test_label_falls_back_to_value() {
        let config = OptionConfig::new("code", "title");
        let option = config.to_option(&json!({"code": "X9"})).unwrap();
        assert_eq!(option.label, "X9");
    }

    #[test]
    fn test_disabled_key() {
        let mut config = OptionConfig::new("id", "name");
        config.disabled_key = Some("locked".to_string());
        let option = config
            .to_option(&json!({"id": 3, "name": "C", "locked": true}))
            .unwrap();
        assert!(option.disabled);
    }

    #[test]
    fn test_dedupe_keeps_first_and_types_distinct() {
        let options = vec![
            SelectOption::new("one", 1),
            SelectOption::new("text one", "1"),
            SelectOption::new("duplicate", 1),
        ];
        let deduped = dedupe_options(options);

        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].label, "one");
        assert_eq!(deduped[1].label, "text one");
    }

    #[test]
    fn test_coercion_with_lexical_fallback() {
        let text = OptionValue::from("42");
        assert_eq!(text.coerce_to(ValueKind::Number), OptionValue::Int(42));
        assert_eq!(
            OptionValue::from("4.5").coerce_to(ValueKind::Number),
            OptionValue::Float(4.5)
        );

        let not_a_number = OptionValue::from("abc");
        assert_eq!(not_a_number.coerce_to(ValueKind::Number), not_a_number);
        let nan = OptionValue::from("NaN");
        assert_eq!(nan.coerce_to(ValueKind::Number), nan);

        assert_eq!(
            OptionValue::Int(7).coerce_to(ValueKind::Text),
            OptionValue::from("7")
        );
        assert_eq!(
            OptionValue::from("true").coerce_to(ValueKind::Bool),
            OptionValue::Bool(true)
        );
    }

    #[test]
    fn test_select_value_emptiness() {
        assert!(value_is_empty(None));
        assert!(value_is_empty(Some(&SelectValue::Multiple(vec![]))));
        assert!(value_is_empty(Some(&SelectValue::Single(OptionValue::from("")))));
        assert!(!value_is_empty(Some(&SelectValue::Single(OptionValue::Int(0)))));
    }

    #[test]
    fn test_select_value_deserializes_untagged() {
        let single: SelectValue = serde_json::from_value(json!(5)).unwrap();
        assert_eq!(single, SelectValue::Single(OptionValue::Int(5)));

        let multiple: SelectValue = serde_json::from_value(json!(["a", 2])).unwrap();
        assert_eq!(
            multiple,
            SelectValue::Multiple(vec![OptionValue::from("a"), OptionValue::Int(2)])
        );
    }
}
