//! HTTP request handlers.

pub mod admin;
pub mod api;
pub mod health;
pub mod public;
pub mod static_files;

use std::fmt::Display;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use super::templates;

/// Log an internal failure and render the generic error page.
pub(crate) fn server_error(context: &str, err: impl Display) -> Response {
    tracing::error!("{}: {}", context, err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(templates::error_page()),
    )
        .into_response()
}

pub(crate) fn not_found_page() -> Response {
    (StatusCode::NOT_FOUND, Html(templates::not_found_page())).into_response()
}

/// Fallback for unknown routes.
pub async fn not_found() -> Response {
    not_found_page()
}
