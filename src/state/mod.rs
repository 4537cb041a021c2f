//! Engine state store

pub mod store;
pub mod types;

pub use store::{StateListener, StateStore, Subscription};
pub use types::{EngineState, StatePatch};
