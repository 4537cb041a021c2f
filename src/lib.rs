pub mod app;
pub mod core;
pub mod engine;
pub mod plugin;
pub mod source;
pub mod state;
