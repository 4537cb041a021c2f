mod cache;
mod dependency;
mod destroy;
mod pagination;
mod scenarios;
mod search;
