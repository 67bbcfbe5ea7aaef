use chrono::{DateTime, Utc};
use serde::Serialize;

/// A stored PDF specification sheet for a variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id: i32,
    pub variant_id: i32,
    /// Public URL or root-relative path of the stored file.
    pub pdf_url: String,
    pub page_count: u32,
    /// Size in bytes.
    pub file_size: u64,
    pub version: String,
    pub upload_timestamp: DateTime<Utc>,
    pub is_active: bool,
}

impl Document {
    /// File size formatted for display (e.g. "2.4 MB").
    pub fn display_size(&self) -> String {
        const KB: f64 = 1024.0;
        const MB: f64 = KB * 1024.0;

        let size = self.file_size as f64;
        if size >= MB {
            format!("{:.1} MB", size / MB)
        } else if size >= KB {
            format!("{:.1} KB", size / KB)
        } else {
            format!("{} B", self.file_size)
        }
    }
}

/// Document joined with the tower code of its variant (admin listing).
#[derive(Debug, Clone, Serialize)]
pub struct DocumentWithVariant {
    #[serde(flatten)]
    pub document: Document,
    pub tower_code: String,
}

/// Fields for a freshly uploaded document. New documents are always active.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub variant_id: i32,
    pub pdf_url: String,
    pub page_count: u32,
    pub file_size: u64,
    pub version: String,
}
