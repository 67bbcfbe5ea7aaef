//! Form parsing and validation for the admin area.
//!
//! Each form deserializes from an urlencoded body with every field as text,
//! then `validate` either produces the typed record or per-field messages
//! that are rendered next to the inputs.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::models::{Category, NewCategory, NewSlider, NewVariant, Slider, StructuralType, Variant};

/// Field name to error message.
pub type FieldErrors = BTreeMap<&'static str, String>;

/// Default document version label.
pub const DEFAULT_VERSION: &str = "1.0";

fn trimmed(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn check_length(
    errors: &mut FieldErrors,
    field: &'static str,
    label: &str,
    value: &str,
    min: usize,
    max: usize,
) {
    let len = value.trim().chars().count();
    if len == 0 {
        errors.insert(field, format!("{} is required.", label));
    } else if len < min || len > max {
        errors.insert(
            field,
            format!("{} must be between {} and {} characters.", label, min, max),
        );
    }
}

/// True for absolute http(s) URLs with a host.
pub fn is_web_url(value: &str) -> bool {
    match url::Url::parse(value.trim()) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

/// Checkbox values as sent by browsers and test clients.
fn checkbox(value: &Option<String>) -> bool {
    matches!(
        value.as_deref().map(str::trim),
        Some("on" | "y" | "yes" | "true" | "1")
    )
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub csrf_token: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.username.trim().is_empty() {
            errors.insert("username", "Username is required.".to_string());
        }
        if self.password.is_empty() {
            errors.insert("password", "Password is required.".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail_url: String,
    #[serde(default)]
    pub csrf_token: String,
}

impl CategoryForm {
    pub fn from_category(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            description: category.description.clone().unwrap_or_default(),
            thumbnail_url: category.thumbnail_url.clone().unwrap_or_default(),
            csrf_token: String::new(),
        }
    }

    pub fn validate(&self) -> Result<NewCategory, FieldErrors> {
        let mut errors = FieldErrors::new();
        check_length(&mut errors, "name", "Category name", &self.name, 2, 100);

        if errors.is_empty() {
            Ok(NewCategory {
                name: self.name.trim().to_string(),
                description: trimmed(&self.description),
                thumbnail_url: trimmed(&self.thumbnail_url),
            })
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VariantForm {
    #[serde(default)]
    pub tower_code: String,
    #[serde(default)]
    pub height: String,
    #[serde(default)]
    pub structural_type: String,
    #[serde(default)]
    pub load_class: String,
    #[serde(default)]
    pub engineering_notes: String,
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub csrf_token: String,
}

impl VariantForm {
    pub fn from_variant(variant: &Variant) -> Self {
        Self {
            tower_code: variant.tower_code.clone(),
            height: variant.height.to_string(),
            structural_type: variant.structural_type.as_str().to_string(),
            load_class: variant.load_class.clone().unwrap_or_default(),
            engineering_notes: variant.engineering_notes.clone().unwrap_or_default(),
            category_id: variant.category_id.to_string(),
            csrf_token: String::new(),
        }
    }

    /// Validate against the categories offered in the form.
    pub fn validate(&self, categories: &[Category]) -> Result<NewVariant, FieldErrors> {
        let mut errors = FieldErrors::new();
        check_length(&mut errors, "tower_code", "Tower code", &self.tower_code, 2, 50);

        let height = match self.height.trim().parse::<f64>() {
            Ok(h) if h.is_finite() && h >= 0.0 => Some(h),
            Ok(_) => {
                errors.insert("height", "Height must be zero or more.".to_string());
                None
            }
            Err(_) if self.height.trim().is_empty() => {
                errors.insert("height", "Height is required.".to_string());
                None
            }
            Err(_) => {
                errors.insert("height", "Height must be a number.".to_string());
                None
            }
        };

        let structural_type = match self.structural_type.parse::<StructuralType>() {
            Ok(kind) => Some(kind),
            Err(_) => {
                errors.insert("structural_type", "Choose a structural type.".to_string());
                None
            }
        };

        let category_id = self
            .category_id
            .trim()
            .parse::<i32>()
            .ok()
            .filter(|id| categories.iter().any(|c| c.id == *id));
        if category_id.is_none() {
            errors.insert("category_id", "Choose a category.".to_string());
        }

        match (height, structural_type, category_id) {
            (Some(height), Some(structural_type), Some(category_id)) if errors.is_empty() => {
                Ok(NewVariant {
                    tower_code: self.tower_code.trim().to_string(),
                    height,
                    structural_type,
                    load_class: trimmed(&self.load_class),
                    engineering_notes: trimmed(&self.engineering_notes),
                    category_id,
                })
            }
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SliderForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub link_url: String,
    #[serde(default)]
    pub order: String,
    #[serde(default)]
    pub is_active: Option<String>,
    #[serde(default)]
    pub csrf_token: String,
}

impl Default for SliderForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            image_url: String::new(),
            link_url: String::new(),
            order: "0".to_string(),
            is_active: Some("on".to_string()),
            csrf_token: String::new(),
        }
    }
}

impl SliderForm {
    pub fn from_slider(slider: &Slider) -> Self {
        Self {
            title: slider.title.clone(),
            description: slider.description.clone().unwrap_or_default(),
            image_url: slider.image_url.clone(),
            link_url: slider.link_url.clone().unwrap_or_default(),
            order: slider.display_order.to_string(),
            is_active: slider.is_active.then(|| "on".to_string()),
            csrf_token: String::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        checkbox(&self.is_active)
    }

    pub fn validate(&self) -> Result<NewSlider, FieldErrors> {
        let mut errors = FieldErrors::new();
        check_length(&mut errors, "title", "Title", &self.title, 2, 200);

        if self.image_url.trim().is_empty() {
            errors.insert("image_url", "Image URL is required.".to_string());
        } else if !is_web_url(&self.image_url) {
            errors.insert("image_url", "Enter a valid http(s) URL.".to_string());
        }

        let link_url = trimmed(&self.link_url);
        if let Some(link) = &link_url {
            if !is_web_url(link) {
                errors.insert("link_url", "Enter a valid http(s) URL.".to_string());
            }
        }

        let order = if self.order.trim().is_empty() {
            Some(0)
        } else {
            self.order.trim().parse::<i32>().ok().filter(|o| *o >= 0)
        };
        if order.is_none() {
            errors.insert("order", "Display order must be a whole number of zero or more.".to_string());
        }

        match order {
            Some(display_order) if errors.is_empty() => Ok(NewSlider {
                title: self.title.trim().to_string(),
                description: trimmed(&self.description),
                image_url: self.image_url.trim().to_string(),
                link_url,
                display_order,
                is_active: self.is_active(),
            }),
            _ => Err(errors),
        }
    }
}

/// Normalize a document version label, defaulting to `1.0`.
pub fn document_version(raw: Option<&str>) -> Result<String, String> {
    let version = raw.map(str::trim).filter(|v| !v.is_empty());
    match version {
        None => Ok(DEFAULT_VERSION.to_string()),
        Some(v) if v.chars().count() > 20 => {
            Err("Version must be at most 20 characters.".to_string())
        }
        Some(v) => Ok(v.to_string()),
    }
}

/// Check an uploaded file before it is stored.
pub fn validate_pdf_upload(filename: &str, data: &[u8], max_bytes: u64) -> Result<(), String> {
    let filename = filename.trim();
    if filename.is_empty() {
        return Err("Choose a PDF file to upload.".to_string());
    }

    let is_pdf_name = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    if !is_pdf_name {
        return Err("Invalid file type. Please upload a PDF file.".to_string());
    }

    if data.is_empty() {
        return Err("The uploaded file is empty.".to_string());
    }
    if data.len() as u64 > max_bytes {
        return Err(format!(
            "File size must be at most {} MB.",
            max_bytes / (1024 * 1024)
        ));
    }

    match infer::get(data) {
        Some(kind) if kind.mime_type() == "application/pdf" => {}
        Some(kind) => {
            tracing::warn!("{} has a .pdf name but looks like {}", filename, kind.mime_type())
        }
        None => tracing::warn!("{} has a .pdf name but no recognizable signature", filename),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn categories() -> Vec<Category> {
        vec![Category {
            id: 7,
            name: "Monopole Tower".to_string(),
            description: None,
            thumbnail_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }]
    }

    #[test]
    fn test_category_name_length() {
        let form = CategoryForm {
            name: " M ".to_string(),
            ..Default::default()
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.contains_key("name"));

        let form = CategoryForm {
            name: "Monopole Tower".to_string(),
            description: "   ".to_string(),
            ..Default::default()
        };
        let category = form.validate().unwrap();
        assert_eq!(category.name, "Monopole Tower");
        assert!(category.description.is_none());
    }

    #[test]
    fn test_variant_form() {
        let form = VariantForm {
            tower_code: "MP-30".to_string(),
            height: "30.5".to_string(),
            structural_type: "monopole".to_string(),
            category_id: "7".to_string(),
            ..Default::default()
        };
        let variant = form.validate(&categories()).unwrap();
        assert_eq!(variant.height, 30.5);
        assert_eq!(variant.structural_type, StructuralType::Monopole);

        let bad = VariantForm {
            tower_code: "M".to_string(),
            height: "-1".to_string(),
            structural_type: "lattice".to_string(),
            category_id: "8".to_string(),
            ..Default::default()
        };
        let errors = bad.validate(&categories()).unwrap_err();
        for field in ["tower_code", "height", "structural_type", "category_id"] {
            assert!(errors.contains_key(field), "missing error for {}", field);
        }
    }

    #[test]
    fn test_slider_urls() {
        let mut form = SliderForm {
            title: "Welcome".to_string(),
            image_url: "https://cdn.example.com/a.jpg".to_string(),
            ..Default::default()
        };
        let slider = form.validate().unwrap();
        assert!(slider.is_active);
        assert!(slider.link_url.is_none());

        form.image_url = "javascript:alert(1)".to_string();
        form.link_url = "not a url".to_string();
        form.order = "-2".to_string();
        form.is_active = None;
        let errors = form.validate().unwrap_err();
        assert!(errors.contains_key("image_url"));
        assert!(errors.contains_key("link_url"));
        assert!(errors.contains_key("order"));
    }

    #[test]
    fn test_pdf_upload_checks() {
        let max = 1024;
        assert!(validate_pdf_upload("spec.PDF", b"%PDF-1.5", max).is_ok());
        assert!(validate_pdf_upload("spec.docx", b"%PDF-1.5", max).is_err());
        assert!(validate_pdf_upload("spec", b"%PDF-1.5", max).is_err());
        assert!(validate_pdf_upload("spec.pdf", b"", max).is_err());
        assert!(validate_pdf_upload("spec.pdf", &vec![b'x'; 2048], max).is_err());
    }

    #[test]
    fn test_document_version_default() {
        assert_eq!(document_version(None).unwrap(), "1.0");
        assert_eq!(document_version(Some("  ")).unwrap(), "1.0");
        assert_eq!(document_version(Some("2.1")).unwrap(), "2.1");
        assert!(document_version(Some(&"9".repeat(30))).is_err());
    }
}
