use chrono::{DateTime, Utc};
use serde::Serialize;

/// A family of tower designs (e.g. "Monopole Tower").
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Category together with the number of variants it owns.
#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    #[serde(flatten)]
    pub category: Category,
    pub variant_count: u64,
}

/// Fields supplied when creating or editing a category.
#[derive(Debug, Clone, Default)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
}
