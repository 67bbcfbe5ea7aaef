//! Public catalog pages.

use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use super::super::session::Session;
use super::super::templates;
use super::super::AppState;
use super::{not_found_page, server_error};

/// Home page: sliders, categories and catalog totals.
///
/// The first visit of a session bumps the visitor counter.
pub async fn index(State(state): State<AppState>, mut session: Session) -> Response {
    let categories = match state.db.categories().list_with_counts().await {
        Ok(c) => c,
        Err(e) => return server_error("Failed to load categories", e),
    };
    let sliders = match state.db.sliders().list_active().await {
        Ok(s) => s,
        Err(e) => return server_error("Failed to load sliders", e),
    };
    let total_variants = match state.db.variants().count().await {
        Ok(n) => n,
        Err(e) => return server_error("Failed to count variants", e),
    };
    let total_documents = match state.db.documents().count().await {
        Ok(n) => n,
        Err(e) => return server_error("Failed to count documents", e),
    };

    let mut counted_now = false;
    if !session.visit_counted {
        match state.db.visitors().record_visit().await {
            Ok(()) => {
                session.visit_counted = true;
                counted_now = true;
            }
            Err(e) => tracing::debug!("Visit not recorded: {}", e),
        }
    }

    let total_visits = match state.db.visitors().get().await {
        Ok(stat) => stat.total_visits,
        Err(e) => {
            tracing::debug!("Visitor stats unavailable: {}", e);
            0
        }
    };

    let page = Html(templates::index_page(
        &sliders,
        &categories,
        total_variants,
        total_documents,
        total_visits,
    ));

    if counted_now {
        session.save(&state.session_key, page)
    } else {
        page.into_response()
    }
}

/// Variants of one category, ordered by height.
pub async fn category(State(state): State<AppState>, Path(id): Path<i32>) -> Response {
    let category = match state.db.categories().get(id).await {
        Ok(Some(c)) => c,
        Ok(None) => return not_found_page(),
        Err(e) => return server_error("Failed to load category", e),
    };

    match state.db.variants().list_by_category(id).await {
        Ok(variants) => Html(templates::category_page(&category, &variants)).into_response(),
        Err(e) => server_error("Failed to load variants", e),
    }
}

/// Variant detail with its active specification sheet.
pub async fn variant(State(state): State<AppState>, Path(id): Path<i32>) -> Response {
    let item = match state.db.variants().get_with_category(id).await {
        Ok(Some(v)) => v,
        Ok(None) => return not_found_page(),
        Err(e) => return server_error("Failed to load variant", e),
    };

    match state.db.documents().active_for_variant(id).await {
        Ok(document) => Html(templates::variant_page(&item, document.as_ref())).into_response(),
        Err(e) => server_error("Failed to load document", e),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

pub async fn search(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    let query = params.q.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Redirect::to("/").into_response();
    }

    let variants = match state.db.variants().search(query).await {
        Ok(v) => v,
        Err(e) => return server_error("Variant search failed", e),
    };
    let categories = match state.db.categories().search(query).await {
        Ok(c) => c,
        Err(e) => return server_error("Category search failed", e),
    };

    Html(templates::search_page(query, &variants, &categories)).into_response()
}
