//! HTTP request handlers.

pub(crate) mod pages;
pub(crate) mod sprite;

use axum::http::{HeaderValue, header};
use axum::response::Response;

/// Mark a response as never cacheable.
///
/// Everything the development server returns can change on the next save.
pub(crate) fn no_cache(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
}
