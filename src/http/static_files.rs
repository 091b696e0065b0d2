//! Static file handler for the site assets.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use percent_encoding::percent_decode_str;
use tracing::{debug, warn};

use super::AppState;
use crate::store::DocumentStore;

const INDEX: &str = "index.html";

/// Map a request path onto a file under `root`.
///
/// `/` becomes `index.html`. Returns `None` for paths that do not decode as
/// UTF-8 or that contain a `..` segment.
pub fn resolve(root: &Path, request_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(request_path).decode_utf8().ok()?;
    let mut path = root.to_path_buf();
    let mut segments = 0;
    for segment in decoded.split(['/', '\\']) {
        match segment {
            "" | "." => continue,
            ".." => return None,
            s if s.contains('\0') => return None,
            s => {
                path.push(s);
                segments += 1;
            }
        }
    }
    if segments == 0 {
        path.push(INDEX);
    }
    Some(path)
}

/// Content type from the file extension; unknown extensions are served as
/// plain text.
pub fn content_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or("text/plain")
        .to_string()
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/plain")],
        "File not found",
    )
        .into_response()
}

/// Fallback handler: everything that is not an API route is a file request.
pub(super) async fn serve_static<S: DocumentStore>(
    State(state): State<AppState<S>>,
    uri: Uri,
) -> Response {
    let Some(path) = resolve(&state.static_root, uri.path()) else {
        debug!(path = uri.path(), "rejected static path");
        return not_found();
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, content_type(&path))],
            bytes,
        )
            .into_response(),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "static file not found");
            not_found()
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "static file read failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain")],
                "Internal server error",
            )
                .into_response()
        }
    }
}
