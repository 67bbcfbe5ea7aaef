//! Tower variant management.

use axum::{
    extract::{Path, State},
    response::Response,
    Form,
};

use crate::models::Category;
use crate::repository::RepositoryError;
use crate::services::validation::{FieldErrors, VariantForm};

use super::super::super::session::{FlashLevel, Session};
use super::super::super::templates;
use super::super::super::AppState;
use super::super::server_error;
use super::{check_csrf, not_found_redirect, redirect_with_flash, render, DeleteForm};

const LIST_URL: &str = "/admin/variants";
const NEW_URL: &str = "/admin/variant/new";

fn form_page(
    state: &AppState,
    mut session: Session,
    title: &str,
    action: &str,
    form: &VariantForm,
    categories: &[Category],
    errors: &FieldErrors,
) -> Response {
    let flashes = session.take_flashes();
    let token = session.csrf_token();
    let html =
        templates::variant_form_page(&flashes, title, action, form, categories, errors, &token);
    render(state, &session, html)
}

pub async fn list(State(state): State<AppState>, mut session: Session) -> Response {
    let variants = match state.db.variants().list().await {
        Ok(v) => v,
        Err(e) => return server_error("Failed to list variants", e),
    };
    let document_counts = match state.db.variants().document_counts().await {
        Ok(c) => c,
        Err(e) => return server_error("Failed to count documents", e),
    };

    let flashes = session.take_flashes();
    let token = session.csrf_token();
    let html = templates::variants_admin_page(&flashes, &variants, &document_counts, &token);
    render(&state, &session, html)
}

pub async fn new_form(State(state): State<AppState>, mut session: Session) -> Response {
    let categories = match state.db.categories().list().await {
        Ok(c) => c,
        Err(e) => return server_error("Failed to list categories", e),
    };
    if categories.is_empty() {
        session.flash(FlashLevel::Info, "Create a category before adding variants.");
    }
    form_page(
        &state,
        session,
        "New tower variant",
        NEW_URL,
        &VariantForm::default(),
        &categories,
        &FieldErrors::new(),
    )
}

/// Create a variant, then continue to its PDF upload form.
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<VariantForm>,
) -> Response {
    if let Err(response) = check_csrf(&state, &session, &form.csrf_token, NEW_URL) {
        return response;
    }

    let categories = match state.db.categories().list().await {
        Ok(c) => c,
        Err(e) => return server_error("Failed to list categories", e),
    };
    let new = match form.validate(&categories) {
        Ok(new) => new,
        Err(errors) => {
            return form_page(
                &state,
                session,
                "New tower variant",
                NEW_URL,
                &form,
                &categories,
                &errors,
            )
        }
    };

    match state.db.variants().create(new).await {
        Ok(variant) => {
            tracing::info!("Created variant {} ({})", variant.tower_code, variant.id);
            redirect_with_flash(
                &state,
                session,
                FlashLevel::Success,
                format!(
                    "Tower variant '{}' created. Upload its PDF specification next.",
                    variant.tower_code
                ),
                &format!("/admin/variant/{}/upload", variant.id),
            )
        }
        Err(RepositoryError::Conflict(message)) => {
            let errors = FieldErrors::from([("tower_code", message)]);
            form_page(
                &state,
                session,
                "New tower variant",
                NEW_URL,
                &form,
                &categories,
                &errors,
            )
        }
        Err(e) => server_error("Failed to create variant", e),
    }
}

pub async fn edit_form(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Response {
    let variant = match state.db.variants().get(id).await {
        Ok(Some(v)) => v,
        Ok(None) => return not_found_redirect(&state, session, "Variant", LIST_URL),
        Err(e) => return server_error("Failed to load variant", e),
    };
    let categories = match state.db.categories().list().await {
        Ok(c) => c,
        Err(e) => return server_error("Failed to list categories", e),
    };

    form_page(
        &state,
        session,
        &format!("Edit {}", variant.tower_code),
        &format!("/admin/variant/{}/edit", id),
        &VariantForm::from_variant(&variant),
        &categories,
        &FieldErrors::new(),
    )
}

pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    Form(form): Form<VariantForm>,
) -> Response {
    let action = format!("/admin/variant/{}/edit", id);
    if let Err(response) = check_csrf(&state, &session, &form.csrf_token, &action) {
        return response;
    }

    let categories = match state.db.categories().list().await {
        Ok(c) => c,
        Err(e) => return server_error("Failed to list categories", e),
    };
    let changes = match form.validate(&categories) {
        Ok(changes) => changes,
        Err(errors) => {
            return form_page(
                &state,
                session,
                "Edit tower variant",
                &action,
                &form,
                &categories,
                &errors,
            )
        }
    };
    let code = changes.tower_code.clone();

    match state.db.variants().update(id, changes).await {
        Ok(true) => redirect_with_flash(
            &state,
            session,
            FlashLevel::Success,
            format!("Tower variant '{}' updated successfully.", code),
            LIST_URL,
        ),
        Ok(false) => not_found_redirect(&state, session, "Variant", LIST_URL),
        Err(RepositoryError::Conflict(message)) => {
            let errors = FieldErrors::from([("tower_code", message)]);
            form_page(
                &state,
                session,
                "Edit tower variant",
                &action,
                &form,
                &categories,
                &errors,
            )
        }
        Err(e) => server_error("Failed to update variant", e),
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

    match state.db.variants().delete(id).await {
        Ok(true) => {
            tracing::info!("Deleted variant {}", id);
            redirect_with_flash(
                &state,
                session,
                FlashLevel::Success,
                "Tower variant deleted successfully.",
                LIST_URL,
            )
        }
        Ok(false) => not_found_redirect(&state, session, "Variant", LIST_URL),
        Err(e) => server_error("Failed to delete variant", e),
    }
}
