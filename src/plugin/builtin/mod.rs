//! Builtin plugins
//!
//! The five capabilities every engine instance registers, in dependency
//! order: cache, data fetcher, search, pagination, paste.

pub mod cache;
pub mod fetcher;
pub mod pagination;
pub mod paste;
pub mod search;

pub use cache::{CacheHandlerPlugin, SharedCache};
pub use fetcher::{DataFetcherPlugin, PageWindow};
pub use pagination::{PaginationPlugin, ScrollMetrics};
pub use paste::{split_paste_text, PasteHandlerPlugin};
pub use search::{InvalidationReason, SearchHandlerPlugin, SearchRequest};
