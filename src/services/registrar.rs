//! Document registration: validate, deactivate, extract, upload, record.

use bytes::Bytes;
use thiserror::Error;

use super::validation;
use crate::models::{Document, NewDocument};
use crate::pdf::{self, PdfInfo};
use crate::repository::{DbContext, RepositoryError};
use crate::storage::{sanitize_object_name, UploadError, Uploader};

/// A PDF received from the upload form.
#[derive(Debug, Clone)]
pub struct PdfUpload {
    /// Client-supplied file name (only its extension is trusted).
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
    /// Version label from the form; blank means `1.0`.
    pub version: Option<String>,
}

#[derive(Debug, Error)]
pub enum RegistrarError {
    #[error("variant {0} not found")]
    VariantNotFound(i32),
    #[error("{0}")]
    Invalid(String),
    #[error("storage error: {0}")]
    Storage(#[from] UploadError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Registers uploaded PDFs as the active document of a variant.
pub struct DocumentRegistrar<'a> {
    db: &'a DbContext,
    uploader: &'a dyn Uploader,
    max_upload_bytes: u64,
}

impl<'a> DocumentRegistrar<'a> {
    pub fn new(db: &'a DbContext, uploader: &'a dyn Uploader, max_upload_bytes: u64) -> Self {
        Self {
            db,
            uploader,
            max_upload_bytes,
        }
    }

    /// Store `upload` and make it the variant's active document.
    ///
    /// Existing documents are deactivated before the upload is attempted; if
    /// storage fails the variant is left without an active document.
    pub async fn register(
        &self,
        variant_id: i32,
        upload: PdfUpload,
    ) -> Result<Document, RegistrarError> {
        validation::validate_pdf_upload(&upload.filename, &upload.data, self.max_upload_bytes)
            .map_err(RegistrarError::Invalid)?;
        let version =
            validation::document_version(upload.version.as_deref()).map_err(RegistrarError::Invalid)?;
        if let Some(content_type) = upload.content_type.as_deref() {
            if content_type != "application/pdf" {
                tracing::debug!("{} declared as {}", upload.filename, content_type);
            }
        }

        let variant = self
            .db
            .variants()
            .get(variant_id)
            .await?
            .ok_or(RegistrarError::VariantNotFound(variant_id))?;

        let deactivated = self.db.documents().deactivate_for_variant(variant_id).await?;
        tracing::debug!(
            "Deactivated {} document(s) for {}",
            deactivated,
            variant.tower_code
        );

        let info = extract_metadata(upload.data.clone()).await;

        let object_name = sanitize_object_name(&format!("{}_{}.pdf", variant.tower_code, version));
        let pdf_url = match self.uploader.upload(upload.data, &object_name).await {
            Ok(url) => url,
            Err(e) => {
                tracing::error!(
                    "Upload for {} failed; variant left without an active document: {}",
                    variant.tower_code,
                    e
                );
                return Err(RegistrarError::Storage(e));
            }
        };

        let document = self
            .db
            .documents()
            .insert_active(NewDocument {
                variant_id,
                pdf_url,
                page_count: info.page_count,
                file_size: info.file_size,
                version,
            })
            .await?;

        tracing::info!(
            variant = %variant.tower_code,
            pages = document.page_count,
            bytes = document.file_size,
            "Registered document {}",
            document.pdf_url
        );
        Ok(document)
    }
}

async fn extract_metadata(data: Bytes) -> PdfInfo {
    match tokio::task::spawn_blocking(move || pdf::extract_bytes(&data)).await {
        Ok(info) => info,
        Err(e) => {
            tracing::warn!("PDF metadata task failed: {}", e);
            PdfInfo::default()
        }
    }
}
