//! Browser-side live reload client.

use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::handlers::no_cache;

/// URL path the client script is served at.
pub(crate) const CLIENT_SCRIPT_PATH: &str = "/__weft/live-reload.js";

const CLIENT_SCRIPT: &str = include_str!("client.js");

const BODY_CLOSE: &str = "</body>";

/// Handle GET of the client script.
pub(crate) async fn client_script() -> Response {
    no_cache(
        (
            [(header::CONTENT_TYPE, "text/javascript; charset=utf-8")],
            CLIENT_SCRIPT,
        )
            .into_response(),
    )
}

/// Insert the client `<script>` tag before the last `</body>`.
///
/// Documents without a body close tag (fragments) get the tag appended.
pub(crate) fn inject_client(html: &str, script_path: &str, sprite_url_path: &str) -> String {
    let tag = format!(
        r#"<script src="{script_path}" data-sprite="{sprite_url_path}"></script>"#
    );

    // ASCII lowercasing keeps byte offsets, so the index is valid in `html`
    match html.to_ascii_lowercase().rfind(BODY_CLOSE) {
        Some(index) => {
            let mut injected = String::with_capacity(html.len() + tag.len());
            injected.push_str(&html[..index]);
            injected.push_str(&tag);
            injected.push_str(&html[index..]);
            injected
        }
        None => format!("{html}{tag}"),
    }
}
