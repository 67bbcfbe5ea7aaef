//! Shared helper functions for CLI commands.

use anyhow::Context;

use crate::config::Settings;
use crate::repository::DbContext;

/// Create the data directories and open the database, creating the schema if needed.
pub fn open_database(settings: &Settings) -> anyhow::Result<DbContext> {
    settings.ensure_directories().with_context(|| {
        format!(
            "Failed to create data directory {}",
            settings.data_dir.display()
        )
    })?;

    let url = settings.database_connection_string();
    tracing::debug!("Opening database {}", url);
    DbContext::open(&url).with_context(|| format!("Failed to open database {}", url))
}

/// Truncate a string to `max` characters, adding an ellipsis if cut.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Monopole Tower", 20), "Monopole Tower");
        assert_eq!(truncate("4-Leg Lattice Tower", 10), "4-Leg Lat…");
        assert_eq!(truncate("", 3), "");
    }

    #[test]
    fn test_open_database_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::with_data_dir(dir.path().join("nested"));
        let db = open_database(&settings).unwrap();
        assert!(settings.uploads_dir.is_dir());
        assert!(settings.database_path().is_file());
        drop(db);
    }
}
