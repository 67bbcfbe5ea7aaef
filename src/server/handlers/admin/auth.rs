//! Admin login and logout.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Redirect, Response},
    Form,
};
use serde::Deserialize;

use crate::services::validation::{FieldErrors, LoginForm};
use crate::services::AuthOutcome;

use super::super::super::session::{safe_next, FlashLevel, Session};
use super::super::super::templates;
use super::super::super::AppState;
use super::{redirect_with_flash, render_with_status};

#[derive(Debug, Clone, Deserialize)]
pub struct LoginParams {
    pub next: Option<String>,
}

fn login_response(
    state: &AppState,
    mut session: Session,
    status: StatusCode,
    next: Option<&str>,
    username: &str,
    errors: &FieldErrors,
) -> Response {
    let flashes = session.take_flashes();
    let token = session.csrf_token();
    let html = templates::login_page(&flashes, &token, next, username, errors);
    render_with_status(state, &session, status, html)
}

pub async fn login_form(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<LoginParams>,
) -> Response {
    let next = safe_next(params.next.as_deref());
    if session.admin {
        return session.save(
            &state.session_key,
            Redirect::to(next.unwrap_or("/admin/")),
        );
    }
    login_response(
        &state,
        session,
        StatusCode::OK,
        next,
        "",
        &FieldErrors::new(),
    )
}

pub async fn login(
    State(state): State<AppState>,
    mut session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let next = safe_next(form.next.as_deref()).map(str::to_string);

    if !session.verify_csrf(&form.csrf_token) {
        tracing::warn!("Login rejected: bad CSRF token");
        session.flash(FlashLevel::Error, "Your form expired. Please try again.");
        return login_response(
            &state,
            session,
            StatusCode::BAD_REQUEST,
            next.as_deref(),
            form.username.trim(),
            &FieldErrors::new(),
        );
    }

    if !session.allow_login_attempt(chrono::Utc::now().timestamp()) {
        tracing::warn!("Login rate limit reached for user {}", form.username.trim());
        session.flash(
            FlashLevel::Error,
            "Too many login attempts. Please wait a few minutes and try again.",
        );
        return login_response(
            &state,
            session,
            StatusCode::TOO_MANY_REQUESTS,
            next.as_deref(),
            form.username.trim(),
            &FieldErrors::new(),
        );
    }

    if let Err(errors) = form.validate() {
        return login_response(
            &state,
            session,
            StatusCode::OK,
            next.as_deref(),
            form.username.trim(),
            &errors,
        );
    }

    let username = form.username.trim().to_string();
    let verifier = state.verifier.clone();
    let (user, password) = (username.clone(), form.password.clone());
    // bcrypt is CPU-bound
    let outcome = match tokio::task::spawn_blocking(move || verifier.verify(&user, &password)).await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Credential check failed to run: {}", e);
            AuthOutcome::Denied
        }
    };

    match outcome {
        AuthOutcome::Granted => {
            tracing::info!("Admin {} logged in", username);
            session.log_in();
            redirect_with_flash(
                &state,
                session,
                FlashLevel::Success,
                "Logged in successfully.",
                next.as_deref().unwrap_or("/admin/"),
            )
        }
        AuthOutcome::Denied => {
            tracing::warn!("Failed login attempt for user {}", username);
            session.flash(FlashLevel::Error, "Invalid username or password.");
            login_response(
                &state,
                session,
                StatusCode::OK,
                next.as_deref(),
                &username,
                &FieldErrors::new(),
            )
        }
    }
}

pub async fn logout(State(state): State<AppState>, mut session: Session) -> Response {
    if session.admin {
        tracing::info!("Admin logged out");
    }
    session.log_out();
    redirect_with_flash(
        &state,
        session,
        FlashLevel::Info,
        "You have been logged out.",
        "/admin/login",
    )
}
