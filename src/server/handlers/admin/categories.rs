//! Category management.

use axum::{
    extract::{Path, State},
    response::Response,
    Form,
};

use crate::repository::RepositoryError;
use crate::services::validation::{CategoryForm, FieldErrors};

use super::super::super::session::{FlashLevel, Session};
use super::super::super::templates;
use super::super::super::AppState;
use super::super::server_error;
use super::{check_csrf, not_found_redirect, redirect_with_flash, render, DeleteForm};

const LIST_URL: &str = "/admin/categories";

fn form_page(
    state: &AppState,
    mut session: Session,
    title: &str,
    action: &str,
    form: &CategoryForm,
    errors: &FieldErrors,
) -> Response {
    let flashes = session.take_flashes();
    let token = session.csrf_token();
    let html = templates::category_form_page(&flashes, title, action, form, errors, &token);
    render(state, &session, html)
}

pub async fn list(State(state): State<AppState>, mut session: Session) -> Response {
    let categories = match state.db.categories().list_with_counts().await {
        Ok(c) => c,
        Err(e) => return server_error("Failed to list categories", e),
    };
    let flashes = session.take_flashes();
    let token = session.csrf_token();
    let html = templates::categories_admin_page(&flashes, &categories, &token);
    render(&state, &session, html)
}

pub async fn new_form(State(state): State<AppState>, session: Session) -> Response {
    form_page(
        &state,
        session,
        "New category",
        "/admin/category/new",
        &CategoryForm::default(),
        &FieldErrors::new(),
    )
}

pub async fn create(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CategoryForm>,
) -> Response {
    const ACTION: &str = "/admin/category/new";
    if let Err(response) = check_csrf(&state, &session, &form.csrf_token, ACTION) {
        return response;
    }

    let new = match form.validate() {
        Ok(new) => new,
        Err(errors) => return form_page(&state, session, "New category", ACTION, &form, &errors),
    };

    match state.db.categories().create(new).await {
        Ok(category) => {
            tracing::info!("Created category {} ({})", category.name, category.id);
            redirect_with_flash(
                &state,
                session,
                FlashLevel::Success,
                format!("Category '{}' created successfully.", category.name),
                LIST_URL,
            )
        }
        Err(RepositoryError::Conflict(message)) => {
            let errors = FieldErrors::from([("name", message)]);
            form_page(&state, session, "New category", ACTION, &form, &errors)
        }
        Err(e) => server_error("Failed to create category", e),
    }
}

pub async fn edit_form(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Response {
    match state.db.categories().get(id).await {
        Ok(Some(category)) => form_page(
            &state,
            session,
            &format!("Edit {}", category.name),
            &format!("/admin/category/{}/edit", id),
            &CategoryForm::from_category(&category),
            &FieldErrors::new(),
        ),
        Ok(None) => not_found_redirect(&state, session, "Category", LIST_URL),
        Err(e) => server_error("Failed to load category", e),
    }
}

pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    Form(form): Form<CategoryForm>,
) -> Response {
    let action = format!("/admin/category/{}/edit", id);
    if let Err(response) = check_csrf(&state, &session, &form.csrf_token, &action) {
        return response;
    }

    let changes = match form.validate() {
        Ok(changes) => changes,
        Err(errors) => {
            return form_page(&state, session, "Edit category", &action, &form, &errors)
        }
    };
    let name = changes.name.clone();

    match state.db.categories().update(id, changes).await {
        Ok(true) => redirect_with_flash(
            &state,
            session,
            FlashLevel::Success,
            format!("Category '{}' updated successfully.", name),
            LIST_URL,
        ),
        Ok(false) => not_found_redirect(&state, session, "Category", LIST_URL),
        Err(RepositoryError::Conflict(message)) => {
            let errors = FieldErrors::from([("name", message)]);
            form_page(&state, session, "Edit category", &action, &form, &errors)
        }
        Err(e) => server_error("Failed to update category", e),
    }
}

/// Delete a category together with its variants and their documents.
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    Form(form): Form<DeleteForm>,
) -> Response {
    if let Err(response) = check_csrf(&state, &session, &form.csrf_token, LIST_URL) {
        return response;
    }

    match state.db.categories().delete(id).await {
        Ok(true) => {
            tracing::info!("Deleted category {}", id);
            redirect_with_flash(
                &state,
                session,
                FlashLevel::Success,
                "Category deleted successfully.",
                LIST_URL,
            )
        }
        Ok(false) => not_found_redirect(&state, session, "Category", LIST_URL),
        Err(e) => server_error("Failed to delete category", e),
    }
}
