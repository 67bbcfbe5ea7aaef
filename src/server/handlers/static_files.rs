//! Static file serving handlers.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use super::super::assets;
use super::super::AppState;
use super::not_found_page;

/// Serve a PDF stored by the local-disk upload provider.
pub async fn serve_upload(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    if name.contains("..") || name.contains('/') || name.contains('\\') {
        return not_found_page();
    }

    // The directory only exists once something has been uploaded.
    let canonical_dir = match state.settings.uploads_dir.canonicalize() {
        Ok(p) => p,
        Err(_) => return not_found_page(),
    };

    let canonical_file = match canonical_dir.join(&name).canonicalize() {
        Ok(p) => p,
        Err(_) => return not_found_page(),
    };

    if !canonical_file.starts_with(&canonical_dir) || !canonical_file.is_file() {
        return not_found_page();
    }

    let content = match tokio::fs::read(&canonical_file).await {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to read {}: {}", canonical_file.display(), e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read file").into_response();
        }
    };

    let mut mime = mime_guess::from_path(&canonical_file)
        .first_or_octet_stream()
        .to_string();

    // Never let an uploaded file render as markup on our origin
    if mime.starts_with("text/html")
        || mime.starts_with("application/xhtml")
        || mime.starts_with("image/svg")
        || mime.contains("xml")
    {
        mime = "text/plain; charset=utf-8".to_string();
    }

    let disposition = format!("inline; filename=\"{}\"", name.replace('"', "_"));

    (
        [
            (header::CONTENT_TYPE, mime),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        content,
    )
        .into_response()
}

/// Serve CSS.
pub async fn serve_css() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css")], assets::CSS)
}
