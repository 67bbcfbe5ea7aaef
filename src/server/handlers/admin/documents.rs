//! PDF document listing, upload and removal.

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    response::Response,
    Form,
};
use bytes::Bytes;

use crate::models::Variant;
use crate::repository::RepositoryError;
use crate::services::validation::DEFAULT_VERSION;
use crate::services::{DocumentRegistrar, PdfUpload, RegistrarError};
use crate::storage::UploadChain;

use super::super::super::session::{FlashLevel, Session};
use super::super::super::templates;
use super::super::super::AppState;
use super::super::server_error;
use super::{
    check_csrf, not_found_redirect, redirect_with_flash, render, render_with_status, DeleteForm,
};

const LIST_URL: &str = "/admin/documents";

pub async fn list(State(state): State<AppState>, mut session: Session) -> Response {
    let documents = match state.db.documents().list_with_variants().await {
        Ok(d) => d,
        Err(e) => return server_error("Failed to list documents", e),
    };
    let flashes = session.take_flashes();
    let token = session.csrf_token();
    let html = templates::documents_admin_page(&flashes, &documents, &token);
    render(&state, &session, html)
}

async fn upload_page(
    state: &AppState,
    mut session: Session,
    status: StatusCode,
    variant: &Variant,
    version: &str,
    error: Option<&str>,
) -> Response {
    let active = match state.db.documents().active_for_variant(variant.id).await {
        Ok(a) => a,
        Err(e) => return server_error("Failed to load active document", e),
    };
    let flashes = session.take_flashes();
    let token = session.csrf_token();
    let html = templates::upload_form_page(
        &flashes,
        variant,
        active.as_ref(),
        version,
        error,
        state.settings.max_upload_bytes / (1024 * 1024),
        &token,
    );
    render_with_status(state, &session, status, html)
}

pub async fn upload_form(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Response {
    match state.db.variants().get(id).await {
        Ok(Some(variant)) => {
            upload_page(&state, session, StatusCode::OK, &variant, DEFAULT_VERSION, None).await
        }
        Ok(None) => not_found_redirect(&state, session, "Variant", "/admin/variants"),
        Err(e) => server_error("Failed to load variant", e),
    }
}

/// Fields read from the multipart upload form.
#[derive(Default)]
struct UploadFields {
    csrf_token: String,
    version: Option<String>,
    file: Option<(String, Option<String>, Bytes)>,
}

async fn read_upload_fields(multipart: &mut Multipart) -> Result<UploadFields, MultipartError> {
    let mut fields = UploadFields::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "csrf_token" => fields.csrf_token = field.text().await?,
            "version" => fields.version = Some(field.text().await?),
            "pdf_file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await?;
                fields.file = Some((filename, content_type, data));
            }
            other => tracing::debug!("Ignoring upload form field {}", other),
        }
    }
    Ok(fields)
}

/// Register an uploaded PDF as the variant's active document.
pub async fn upload(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Response {
    let variant = match state.db.variants().get(id).await {
        Ok(Some(v)) => v,
        Ok(None) => return not_found_redirect(&state, session, "Variant", "/admin/variants"),
        Err(e) => return server_error("Failed to load variant", e),
    };

    let fields = match read_upload_fields(&mut multipart).await {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!("Unreadable upload for {}: {}", variant.tower_code, e);
            let message = format!(
                "The upload could not be read. Files must be at most {} MB.",
                state.settings.max_upload_bytes / (1024 * 1024)
            );
            return upload_page(
                &state,
                session,
                e.status(),
                &variant,
                DEFAULT_VERSION,
                Some(&message),
            )
            .await;
        }
    };

    let back_to = format!("/admin/variant/{}/upload", id);
    if let Err(response) = check_csrf(&state, &session, &fields.csrf_token, &back_to) {
        return response;
    }

    let version = fields.version.clone().unwrap_or_default();
    let (filename, content_type, data) = match fields.file {
        Some(file) => file,
        None => {
            return upload_page(
                &state,
                session,
                StatusCode::OK,
                &variant,
                &version,
                Some("Choose a PDF file to upload."),
            )
            .await
        }
    };

    let uploader = UploadChain::current(&state.settings.storage);
    let registrar = DocumentRegistrar::new(&state.db, &uploader, state.settings.max_upload_bytes);
    let result = registrar
        .register(
            id,
            PdfUpload {
                filename,
                content_type,
                data,
                version: fields.version,
            },
        )
        .await;

    match result {
        Ok(document) => redirect_with_flash(
            &state,
            session,
            FlashLevel::Success,
            format!(
                "PDF version {} uploaded for {} ({} page(s)).",
                document.version, variant.tower_code, document.page_count
            ),
            LIST_URL,
        ),
        Err(RegistrarError::Invalid(message)) => {
            upload_page(
                &state,
                session,
                StatusCode::OK,
                &variant,
                &version,
                Some(&message),
            )
            .await
        }
        Err(RegistrarError::VariantNotFound(_)) => {
            not_found_redirect(&state, session, "Variant", "/admin/variants")
        }
        Err(RegistrarError::Storage(_)) => redirect_with_flash(
            &state,
            session,
            FlashLevel::Error,
            "The PDF could not be stored. Please try again or check the storage configuration.",
            &back_to,
        ),
        Err(RegistrarError::Repository(RepositoryError::Conflict(message))) => {
            redirect_with_flash(&state, session, FlashLevel::Error, message, &back_to)
        }
        Err(RegistrarError::Repository(e)) => server_error("Failed to record document", e),
    }
}

/// Remove a document record. The stored file is left in place.
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    Form(form): Form<DeleteForm>,
) -> Response {
    if let Err(response) = check_csrf(&state, &session, &form.csrf_token, LIST_URL) {
        return response;
    }

    match state.db.documents().delete(id).await {
        Ok(true) => {
            tracing::info!("Deleted document {}", id);
            redirect_with_flash(
                &state,
                session,
                FlashLevel::Success,
                "Document deleted successfully.",
                LIST_URL,
            )
        }
        Ok(false) => not_found_redirect(&state, session, "Document", LIST_URL),
        Err(e) => server_error("Failed to delete document", e),
    }
}
