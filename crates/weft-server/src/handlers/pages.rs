//! Source file serving.
//!
//! Every request that no other route claims resolves to a file under the
//! source directory. HTML pages are expanded on each request so edits to
//! partials show up without a rebuild.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::extract::State;
use axum::http::{Uri, header};
use axum::response::{IntoResponse, Response};
use percent_encoding::percent_decode_str;

use super::no_cache;
use crate::error::ServerError;
use crate::live_reload::{CLIENT_SCRIPT_PATH, inject_client};
use crate::state::AppState;

/// File served for directory URLs.
const INDEX_FILE: &str = "index.html";

/// Handle any GET request that is not a sprite or live reload route.
pub(crate) async fn serve_source(
    State(state): State<Arc<AppState>>,
    uri: Uri,
) -> Result<Response, ServerError> {
    let url_path = uri.path();
    let file_path = resolve_request_path(&state.source_dir, url_path)
        .ok_or_else(|| ServerError::NotFound(url_path.to_owned()))?;

    if is_page(&file_path) {
        return serve_page(&state, &file_path);
    }

    let content = match tokio::fs::read(&file_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(ServerError::NotFound(url_path.to_owned()));
        }
        Err(err) => return Err(err.into()),
    };
    let mime = mime_guess::from_path(&file_path).first_or_octet_stream();

    Ok(no_cache(
        ([(header::CONTENT_TYPE, mime.to_string())], content).into_response(),
    ))
}

fn serve_page(state: &AppState, file_path: &Path) -> Result<Response, ServerError> {
    let expansion = state.resolver.expand_file(file_path)?;

    if state.verbose && !expansion.is_clean() {
        tracing::warn!(
            page = %file_path.display(),
            diagnostics = expansion.diagnostics.len(),
            "Page has broken imports"
        );
    }

    let html = if state.live_reload_enabled() {
        inject_client(&expansion.html, CLIENT_SCRIPT_PATH, &state.sprite_url_path)
    } else {
        expansion.html
    };

    Ok(no_cache(
        ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], html).into_response(),
    ))
}

/// Map a URL path to a file under `source_dir`.
///
/// Returns `None` for paths that would leave the source directory. The root
/// and directory paths map to their `index.html`.
fn resolve_request_path(source_dir: &Path, url_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(url_path).decode_utf8().ok()?;

    let mut relative = PathBuf::new();
    for segment in decoded.split('/').filter(|s| !s.is_empty()) {
        // Only plain names; rejects "..", "." and anything with a root or prefix
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) if !segment.contains('\\') => {
                relative.push(name);
            }
            _ => return None,
        }
    }

    let path = source_dir.join(relative);
    if decoded.ends_with('/') || path.is_dir() {
        Some(path.join(INDEX_FILE))
    } else {
        Some(path)
    }
}

fn is_page(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
}
