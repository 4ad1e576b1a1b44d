//! Error types for the HTTP server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use weft_html::ResolveError;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Nothing to serve at the requested URL path.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Page could not be read for expansion.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Host and port do not form a socket address.
    #[error("Invalid address: {0}")]
    Address(#[from] std::net::AddrParseError),

    /// File watcher could not be started.
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Resolve(ResolveError::Read { source, .. }) | Self::Io(source)
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                StatusCode::NOT_FOUND
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_not_found_status() {
        let err = ServerError::NotFound("/missing.html".to_owned());

        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_vanished_page_is_not_found() {
        let err = ServerError::Resolve(ResolveError::Read {
            path: PathBuf::from("/site/gone.html"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });

        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_io_error_is_internal() {
        let err = ServerError::Io(std::io::Error::from(std::io::ErrorKind::PermissionDenied));

        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
