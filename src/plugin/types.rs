//! Type definitions for the plugin system

use serde::Serialize;

/// Builtin plugin kinds
///
/// Declaration order is dependency order: plugins are initialised in this
/// order and destroyed in reverse.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    strum_macros::Display,
    strum_macros::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PluginType {
    CacheHandler,
    DataFetcher,
    SearchHandler,
    Pagination,
    PasteHandler,
}

/// Plugin lifecycle
///
/// `Uninitialized -> Active -> Destroyed`; there is no way back from
/// `Destroyed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    Uninitialized,
    Active,
    Destroyed,
}
