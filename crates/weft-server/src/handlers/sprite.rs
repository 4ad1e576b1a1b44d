//! Sprite endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};

use super::no_cache;
use crate::error::ServerError;
use crate::state::AppState;

/// Handle GET of the configured sprite URL path.
pub(crate) async fn get_sprite(
    State(state): State<Arc<AppState>>,
) -> Result<Response, ServerError> {
    let content = match tokio::fs::read(&state.sprite_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(ServerError::NotFound(state.sprite_url_path.clone()));
        }
        Err(err) => return Err(err.into()),
    };

    Ok(no_cache(
        ([(header::CONTENT_TYPE, "image/svg+xml")], content).into_response(),
    ))
}
