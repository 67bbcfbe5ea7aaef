//! JSON views of the catalog.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use crate::models::{Document, VariantWithCategory};

use super::super::AppState;

#[derive(Debug, Serialize)]
pub struct VariantDetail {
    #[serde(flatten)]
    pub variant: VariantWithCategory,
    pub active_document: Option<Document>,
}

fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// All categories with variant counts.
pub async fn categories(State(state): State<AppState>) -> Response {
    match state.db.categories().list_with_counts().await {
        Ok(categories) => Json(categories).into_response(),
        Err(e) => {
            tracing::error!("Failed to list categories: {}", e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
        }
    }
}

/// One variant with its category and active document.
pub async fn variant(State(state): State<AppState>, Path(id): Path<i32>) -> Response {
    let variant = match state.db.variants().get_with_category(id).await {
        Ok(Some(v)) => v,
        Ok(None) => return json_error(StatusCode::NOT_FOUND, "Variant not found"),
        Err(e) => {
            tracing::error!("Failed to load variant {}: {}", id, e);
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "Database error");
        }
    };

    match state.db.documents().active_for_variant(id).await {
        Ok(active_document) => Json(VariantDetail {
            variant,
            active_document,
        })
        .into_response(),
        Err(e) => {
            tracing::error!("Failed to load active document for {}: {}", id, e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
        }
    }
}
