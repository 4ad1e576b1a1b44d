//! Router construction.
//!
//! Builds the axum router with all routes and middleware.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower::ServiceBuilder;

use crate::handlers;
use crate::live_reload;
use crate::middleware::security;
use crate::state::AppState;

/// Create the application router.
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    let mut router =
        Router::new().route(&state.sprite_url_path, get(handlers::sprite::get_sprite));

    if state.live_reload_enabled() {
        router = router
            .route(live_reload::WS_PATH, get(live_reload::ws_handler))
            .route(live_reload::CLIENT_SCRIPT_PATH, get(live_reload::client_script));
    }

    router
        .fallback(get(handlers::pages::serve_source))
        .layer(
            ServiceBuilder::new()
                .layer(security::content_type_options_layer())
                .layer(security::frame_options_layer())
                .layer(security::referrer_policy_layer()),
        )
        .with_state(state)
}
