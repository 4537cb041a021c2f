//! Paste Handler plugin
//!
//! Splits pasted clipboard text into value tokens and, when a paste value key
//! is configured, looks them up in one request.

use crate::plugin::builtin::search::{SearchHandlerPlugin, SearchRequest};
use crate::plugin::context::PluginContext;
use crate::plugin::error::PluginResult;
use crate::plugin::events::EngineAction;
use crate::plugin::lifecycle::PluginLifecycle;
use crate::plugin::traits::Plugin;
use crate::plugin::types::{Lifecycle, PluginType};
use regex::Regex;
use serde_json::json;
use std::any::Any;
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

/// Newlines, tabs, commas and semicolons, ASCII and full-width
static DEFAULT_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\r\n\t,;，；]+").expect("default paste separators are a valid pattern")
});

/// Split pasted text into unique, trimmed tokens in paste order
///
/// `separators` lists custom separator characters; `None` uses the defaults.
pub fn split_paste_text(text: &str, separators: Option<&str>) -> Vec<String> {
    let custom = separators
        .filter(|chars| !chars.is_empty())
        .and_then(|chars| {
            let class: String = chars.chars().map(|c| regex::escape(&c.to_string())).collect();
            Regex::new(&format!("[{}]+", class))
                .map_err(|e| log::warn!("PasteHandler: bad separators '{}': {}", chars, e))
                .ok()
        });
    let splitter = custom.as_ref().unwrap_or(&*DEFAULT_SEPARATORS);

    let mut seen = HashSet::new();
    splitter
        .split(text)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter(|token| seen.insert(token.to_string()))
        .map(str::to_string)
        .collect()
}

#[derive(Debug)]
pub struct PasteHandlerPlugin {
    lifecycle: PluginLifecycle,
}

impl Default for PasteHandlerPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl PasteHandlerPlugin {
    pub fn new() -> Self {
        Self {
            lifecycle: PluginLifecycle::new(PluginType::PasteHandler),
        }
    }

    /// Tokenise `text`; with `paste_value_key` set, look the tokens up now
    pub fn handle_paste(&self, text: &str) -> Vec<String> {
        let Some(ctx) = self.lifecycle.context("handle_paste") else {
            return Vec::new();
        };
        let props = ctx.props();
        let tokens = split_paste_text(text, props.paste_separators.as_deref());
        ctx.emit(
            EngineAction::PasteParsed,
            json!({ "tokens": tokens, "lookup": props.paste_value_key }),
        );

        if tokens.is_empty() || props.paste_value_key.is_none() {
            return tokens;
        }
        if let Some(search) = ctx.plugin::<SearchHandlerPlugin>(PluginType::SearchHandler) {
            search.search_immediately(SearchRequest::paste(tokens.clone()));
        }
        tokens
    }
}

impl Plugin for PasteHandlerPlugin {
    fn plugin_type(&self) -> PluginType {
        PluginType::PasteHandler
    }

    fn init(&self, context: Arc<PluginContext>) -> PluginResult<()> {
        self.lifecycle.activate(context)
    }

    fn destroy(&self) {
        self.lifecycle.destroy();
    }

    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.state()
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
