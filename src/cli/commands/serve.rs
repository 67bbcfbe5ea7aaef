//! Web server command.

use std::sync::Arc;

use console::style;

use crate::config::Settings;
use crate::server::{self, AppState};
use crate::services::ConfiguredAdmin;

use super::super::helpers::open_database;

/// Open the database and serve the catalog until shutdown.
pub async fn cmd_serve(mut settings: Settings, bind: Option<String>) -> anyhow::Result<()> {
    if let Some(bind) = bind {
        settings.bind = bind;
    }

    if settings.uses_dev_secret() {
        tracing::warn!("SECRET_KEY is not set; sessions are signed with the development key");
    }

    let db = open_database(&settings)?;
    let verifier = ConfiguredAdmin::from_settings(&settings.admin)?;

    let storage = settings.storage.with_env_overrides();
    if storage.media_configured() {
        tracing::info!("Uploads go to the managed media service first");
    } else if storage.object_storage_configured() {
        tracing::info!("Uploads go to object storage first");
    } else {
        tracing::info!(
            "No remote storage configured; uploads are stored in {}",
            settings.uploads_dir.display()
        );
    }

    println!(
        "{} Serving tower catalog on http://{}",
        style("→").cyan(),
        settings.bind
    );
    println!(
        "  Admin area: http://{}/admin/ (user {})",
        settings.bind,
        style(verifier.username()).bold()
    );

    let state = AppState::new(db, settings, Arc::new(verifier));
    server::serve(state).await?;
    Ok(())
}
