use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Category;

/// How a tower carries its loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StructuralType {
    SelfSupporting,
    Guyed,
    Monopole,
}

impl StructuralType {
    pub const ALL: [StructuralType; 3] = [
        StructuralType::SelfSupporting,
        StructuralType::Guyed,
        StructuralType::Monopole,
    ];

    /// Storage form, also used in URLs and forms.
    pub fn as_str(&self) -> &'static str {
        match self {
            StructuralType::SelfSupporting => "self-supporting",
            StructuralType::Guyed => "guyed",
            StructuralType::Monopole => "monopole",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            StructuralType::SelfSupporting => "Self-Supporting",
            StructuralType::Guyed => "Guyed",
            StructuralType::Monopole => "Monopole",
        }
    }
}

impl FromStr for StructuralType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "self-supporting" | "self_supporting" => Ok(StructuralType::SelfSupporting),
            "guyed" => Ok(StructuralType::Guyed),
            "monopole" => Ok(StructuralType::Monopole),
            other => Err(format!("unknown structural type '{}'", other)),
        }
    }
}

impl fmt::Display for StructuralType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A specific tower design belonging to a category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variant {
    pub id: i32,
    pub tower_code: String,
    /// Height in metres.
    pub height: f64,
    pub structural_type: StructuralType,
    pub load_class: Option<String>,
    pub engineering_notes: Option<String>,
    pub category_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Variant joined with its category.
#[derive(Debug, Clone, Serialize)]
pub struct VariantWithCategory {
    #[serde(flatten)]
    pub variant: Variant,
    pub category: Category,
}

/// Fields supplied when creating or editing a variant.
#[derive(Debug, Clone)]
pub struct NewVariant {
    pub tower_code: String,
    pub height: f64,
    pub structural_type: StructuralType,
    pub load_class: Option<String>,
    pub engineering_notes: Option<String>,
    pub category_id: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_type_parse() {
        for kind in StructuralType::ALL {
            assert_eq!(kind.as_str().parse::<StructuralType>(), Ok(kind));
        }
        assert_eq!(
            "Self_Supporting".parse::<StructuralType>(),
            Ok(StructuralType::SelfSupporting)
        );
        assert!("lattice".parse::<StructuralType>().is_err());
    }

    #[test]
    fn test_structural_type_serializes_kebab_case() {
        let json = serde_json::to_string(&StructuralType::SelfSupporting).unwrap();
        assert_eq!(json, "\"self-supporting\"");
    }
}
