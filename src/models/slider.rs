use chrono::{DateTime, Utc};
use serde::Serialize;

/// Homepage promotional banner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slider {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub image_url: String,
    pub link_url: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSlider {
    pub title: String,
    pub description: Option<String>,
    pub image_url: String,
    pub link_url: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
}
