//! Live reload: file watching, event fan-out and the browser client.

mod client;
mod debouncer;
mod manager;
mod websocket;

pub(crate) use client::{CLIENT_SCRIPT_PATH, client_script, inject_client};
pub(crate) use manager::{LiveReloadManager, ReloadEvent};
pub(crate) use websocket::ws_handler;

/// WebSocket endpoint path.
pub(crate) const WS_PATH: &str = "/ws/live-reload";
