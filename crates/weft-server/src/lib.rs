//! Development server for weft.
//!
//! This crate provides an axum HTTP server for working on a site locally:
//! - Pages from the source directory, with imports expanded on every request
//! - The compiled icon sprite
//! - WebSocket endpoint for live reload during development
//!
//! # Quick Start
//!
//! ```ignore
//! use weft_config::Config;
//! use weft_server::{run_server, server_config_from_weft_config};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::load(None, None).unwrap();
//!     run_server(server_config_from_weft_config(&config, false))
//!         .await
//!         .unwrap();
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Browser ──HTTP──► axum server (weft-server)
//!                        │
//!                        ├─► Pages (fallback) ──► TemplateResolver
//!                        │
//!                        ├─► Sprite route ──► compiled sprite file
//!                        │
//!                        └─► WebSocket (LiveReloadManager)
//!                                │
//!                                ├─► notify (source + icons directories)
//!                                │
//!                                └─► SpriteCompiler (blocking thread)
//! ```

mod app;
mod error;
mod handlers;
mod live_reload;
mod middleware;
mod sprite;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use tokio::sync::broadcast;
use weft_html::TemplateResolver;
use weft_sprite::{SpriteCompiler, SvgOptimizer};

pub use error::ServerError;
use state::AppState;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Site source directory.
    pub source_dir: PathBuf,
    /// Component directory name under `source_dir`.
    pub components_dir: String,
    /// Directory scanned for `.svg` icons.
    pub icons_dir: PathBuf,
    /// Where the development sprite is written.
    pub sprite_output: PathBuf,
    /// URL path the sprite is served at.
    pub sprite_url_path: String,
    /// Attributes stripped from every icon.
    pub strip_attributes: Vec<String>,
    /// Enable live reload.
    pub live_reload_enabled: bool,
    /// Watch patterns for live reload.
    pub watch_patterns: Option<Vec<String>>,
    /// Enable verbose output.
    pub verbose: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 5173,
            source_dir: PathBuf::from("src"),
            components_dir: weft_html::DEFAULT_COMPONENTS_DIR.to_owned(),
            icons_dir: PathBuf::from("src/icons"),
            sprite_output: PathBuf::from(".weft/sprite.svg"),
            sprite_url_path: "/sprite.svg".to_owned(),
            strip_attributes: vec![weft_sprite::DEFAULT_STRIPPED_ATTRIBUTE.to_owned()],
            live_reload_enabled: false,
            watch_patterns: None,
            verbose: false,
        }
    }
}

/// Run the server.
///
/// Compiles the sprite once, starts the file watcher when live reload is
/// enabled, and serves until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address is invalid, the watcher cannot be
/// created, or the listener fails.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let compiler = Arc::new(
        SpriteCompiler::new(&config.icons_dir, &config.sprite_output).with_optimizer(
            SvgOptimizer::with_stripped_attributes(config.strip_attributes.iter().cloned()),
        ),
    );
    sprite::recompile(Arc::clone(&compiler)).await;

    let live_reload = if config.live_reload_enabled {
        let (tx, _rx) = broadcast::channel::<live_reload::ReloadEvent>(100);
        let mut manager = live_reload::LiveReloadManager::new(
            config.source_dir.clone(),
            config.watch_patterns.clone(),
            Arc::clone(&compiler),
            tx,
        );
        manager.start()?;
        Some(manager)
    } else {
        None
    };

    let state = Arc::new(AppState {
        resolver: TemplateResolver::new(Some(config.source_dir.clone()))
            .with_components_dir(config.components_dir.clone()),
        source_dir: config.source_dir.clone(),
        sprite_path: config.sprite_output.clone(),
        sprite_url_path: config.sprite_url_path.clone(),
        live_reload,
        verbose: config.verbose,
    });

    let app = app::create_router(state);

    let addr = SocketAddr::from_str(&format!("{}:{}", config.host, config.port))?;
    tracing::info!(address = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to install Ctrl+C handler");
        // Without a handler the server runs until killed
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}

/// Create server configuration from weft config.
#[must_use]
pub fn server_config_from_weft_config(config: &weft_config::Config, verbose: bool) -> ServerConfig {
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        source_dir: config.project_resolved.source_dir.clone(),
        components_dir: config.project_resolved.components_dir.clone(),
        icons_dir: config.sprite_resolved.icons_dir.clone(),
        sprite_output: config.sprite_resolved.output.clone(),
        sprite_url_path: config.sprite_resolved.url_path.clone(),
        strip_attributes: config.sprite_resolved.strip_attributes.clone(),
        live_reload_enabled: config.live_reload.enabled,
        watch_patterns: config.live_reload.watch_patterns.clone(),
        verbose,
    }
}
