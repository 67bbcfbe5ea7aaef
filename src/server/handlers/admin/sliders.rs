//! Homepage slider management.

use axum::{
    extract::{Path, State},
    response::Response,
    Form,
};

use crate::services::validation::{FieldErrors, SliderForm};

use super::super::super::session::{FlashLevel, Session};
use super::super::super::templates;
use super::super::super::AppState;
use super::super::server_error;
use super::{check_csrf, not_found_redirect, redirect_with_flash, render, DeleteForm};

const LIST_URL: &str = "/admin/sliders";
const NEW_URL: &str = "/admin/slider/new";

fn form_page(
    state: &AppState,
    mut session: Session,
    title: &str,
    action: &str,
    form: &SliderForm,
    errors: &FieldErrors,
) -> Response {
    let flashes = session.take_flashes();
    let token = session.csrf_token();
    let html = templates::slider_form_page(&flashes, title, action, form, errors, &token);
    render(state, &session, html)
}

pub async fn list(State(state): State<AppState>, mut session: Session) -> Response {
    let sliders = match state.db.sliders().list().await {
        Ok(s) => s,
        Err(e) => return server_error("Failed to list sliders", e),
    };
    let flashes = session.take_flashes();
    let token = session.csrf_token();
    let html = templates::sliders_admin_page(&flashes, &sliders, &token);
    render(&state, &session, html)
}

pub async fn new_form(State(state): State<AppState>, session: Session) -> Response {
    form_page(
        &state,
        session,
        "New slider",
        NEW_URL,
        &SliderForm::default(),
        &FieldErrors::new(),
    )
}

pub async fn create(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SliderForm>,
) -> Response {
    if let Err(response) = check_csrf(&state, &session, &form.csrf_token, NEW_URL) {
        return response;
    }

    let new = match form.validate() {
        Ok(new) => new,
        Err(errors) => return form_page(&state, session, "New slider", NEW_URL, &form, &errors),
    };

    match state.db.sliders().create(new).await {
        Ok(slider) => redirect_with_flash(
            &state,
            session,
            FlashLevel::Success,
            format!("Slider '{}' created successfully.", slider.title),
            LIST_URL,
        ),
        Err(e) => server_error("Failed to create slider", e),
    }
}

pub async fn edit_form(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Response {
    match state.db.sliders().get(id).await {
        Ok(Some(slider)) => form_page(
            &state,
            session,
            &format!("Edit {}", slider.title),
            &format!("/admin/slider/{}/edit", id),
            &SliderForm::from_slider(&slider),
            &FieldErrors::new(),
        ),
        Ok(None) => not_found_redirect(&state, session, "Slider", LIST_URL),
        Err(e) => server_error("Failed to load slider", e),
    }
}

pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    Form(form): Form<SliderForm>,
) -> Response {
    let action = format!("/admin/slider/{}/edit", id);
    if let Err(response) = check_csrf(&state, &session, &form.csrf_token, &action) {
        return response;
    }

    let changes = match form.validate() {
        Ok(changes) => changes,
        Err(errors) => return form_page(&state, session, "Edit slider", &action, &form, &errors),
    };
    let title = changes.title.clone();

    match state.db.sliders().update(id, changes).await {
        Ok(true) => redirect_with_flash(
            &state,
            session,
            FlashLevel::Success,
            format!("Slider '{}' updated successfully.", title),
            LIST_URL,
        ),
        Ok(false) => not_found_redirect(&state, session, "Slider", LIST_URL),
        Err(e) => server_error("Failed to update slider", e),
    }
}

pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    Form(form): Form<DeleteForm>,
) -> Response {
    if let Err(response) = check_csrf(&state, &session, &form.csrf_token, LIST_URL) {
        return response;
    }

    match state.db.sliders().delete(id).await {
        Ok(true) => redirect_with_flash(
            &state,
            session,
            FlashLevel::Success,
            "Slider deleted successfully.",
            LIST_URL,
        ),
        Ok(false) => not_found_redirect(&state, session, "Slider", LIST_URL),
        Err(e) => server_error("Failed to delete slider", e),
    }
}
