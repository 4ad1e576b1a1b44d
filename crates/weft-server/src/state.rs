//! Application state.
//!
//! Shared state for all request handlers.

use std::path::PathBuf;

use weft_html::TemplateResolver;

use crate::live_reload::LiveReloadManager;

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Resolver for page imports.
    pub(crate) resolver: TemplateResolver,
    /// Site source directory served by the fallback handler.
    pub(crate) source_dir: PathBuf,
    /// Compiled development sprite.
    pub(crate) sprite_path: PathBuf,
    /// URL path the sprite is served at.
    pub(crate) sprite_url_path: String,
    /// Live reload manager (if enabled).
    pub(crate) live_reload: Option<LiveReloadManager>,
    /// Enable verbose output (log import diagnostics per request).
    pub(crate) verbose: bool,
}

impl AppState {
    /// Check if live reload is enabled.
    #[must_use]
    pub(crate) fn live_reload_enabled(&self) -> bool {
        self.live_reload.is_some()
    }
}
