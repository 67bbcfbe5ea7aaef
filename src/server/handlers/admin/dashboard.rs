use axum::{extract::State, response::Response};

use super::super::super::session::Session;
use super::super::super::templates::{self, DashboardCounts};
use super::super::super::AppState;
use super::super::server_error;
use super::render;

const RECENT_LIMIT: i64 = 5;

pub async fn dashboard(State(state): State<AppState>, mut session: Session) -> Response {
    let counts = async {
        Ok::<_, crate::repository::RepositoryError>(DashboardCounts {
            categories: state.db.categories().count().await?,
            variants: state.db.variants().count().await?,
            documents: state.db.documents().count().await?,
            visits: state.db.visitors().get().await?.total_visits,
        })
    }
    .await;
    let counts = match counts {
        Ok(c) => c,
        Err(e) => return server_error("Failed to load dashboard counts", e),
    };

    let recent_categories = match state.db.categories().recent(RECENT_LIMIT).await {
        Ok(c) => c,
        Err(e) => return server_error("Failed to load recent categories", e),
    };
    let recent_variants = match state.db.variants().recent(RECENT_LIMIT).await {
        Ok(v) => v,
        Err(e) => return server_error("Failed to load recent variants", e),
    };

    let flashes = session.take_flashes();
    session.csrf_token();
    let html = templates::dashboard_page(&flashes, &counts, &recent_categories, &recent_variants);
    render(&state, &session, html)
}
