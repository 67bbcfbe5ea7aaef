//! Admin area handlers. Everything except login/logout sits behind `require_admin`.

pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod documents;
pub mod sliders;
pub mod variants;

use axum::{
    http::StatusCode,
    response::{Html, Redirect, Response},
};

use serde::Deserialize;

use super::super::session::{FlashLevel, Session};
use super::super::AppState;

/// Body of the small POST forms behind delete buttons.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteForm {
    #[serde(default)]
    pub csrf_token: String,
}

/// Render an HTML page and persist the session (flashes consumed, CSRF token issued).
pub(crate) fn render(state: &AppState, session: &Session, html: String) -> Response {
    session.save(&state.session_key, Html(html))
}

pub(crate) fn render_with_status(
    state: &AppState,
    session: &Session,
    status: StatusCode,
    html: String,
) -> Response {
    session.save(&state.session_key, (status, Html(html)))
}

/// Queue a flash message and redirect (303) to `location`.
pub(crate) fn redirect_with_flash(
    state: &AppState,
    mut session: Session,
    level: FlashLevel,
    message: impl Into<String>,
    location: &str,
) -> Response {
    session.flash(level, message);
    session.save(&state.session_key, Redirect::to(location))
}

/// Reject a form whose CSRF token does not match the session.
pub(crate) fn check_csrf(
    state: &AppState,
    session: &Session,
    submitted: &str,
    back_to: &str,
) -> Result<(), Response> {
    if session.verify_csrf(submitted) {
        return Ok(());
    }
    tracing::warn!("Rejected form post to {} with a bad CSRF token", back_to);
    Err(redirect_with_flash(
        state,
        session.clone(),
        FlashLevel::Error,
        "Your form expired. Please try again.",
        back_to,
    ))
}

pub(crate) fn not_found_redirect(
    state: &AppState,
    session: Session,
    what: &str,
    location: &str,
) -> Response {
    redirect_with_flash(
        state,
        session,
        FlashLevel::Error,
        format!("{} not found.", what),
        location,
    )
}
