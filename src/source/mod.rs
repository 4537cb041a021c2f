//! Option sources
//!
//! Options, values, data source descriptors and the services that back them.

pub mod descriptor;
pub mod error;
pub mod fixture;
pub mod http;
pub mod option;

pub use descriptor::{
    DataSource, FunctionDescriptor, OptionsFuture, SearchParams, ServiceApi, ServiceDescriptor,
};
pub use error::{EngineError, EngineResult};
pub use fixture::FixtureService;
pub use http::HttpService;
pub use option::{
    dedupe_options, value_is_empty, OptionConfig, OptionValue, SelectOption, SelectValue,
    ValueKind,
};
