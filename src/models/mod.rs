//! Domain models for the tower catalog.

mod category;
mod document;
mod slider;
mod variant;
mod visitor;

pub use category::{Category, CategorySummary, NewCategory};
pub use document::{Document, DocumentWithVariant, NewDocument};
pub use slider::{NewSlider, Slider};
pub use variant::{NewVariant, StructuralType, Variant, VariantWithCategory};
pub use visitor::VisitorStat;
