//! Database initialization and sample data.

use console::style;
use serde::Deserialize;

use crate::config::Settings;
use crate::models::{NewCategory, NewDocument, NewSlider, NewVariant, StructuralType};
use crate::repository::DbContext;

use super::super::helpers::open_database;

const SEED_DATA: &str = include_str!("../data/seed.toml");

#[derive(Debug, Deserialize)]
struct SeedFile {
    categories: Vec<SeedCategory>,
    #[serde(default)]
    sliders: Vec<SeedSlider>,
}

#[derive(Debug, Deserialize)]
struct SeedCategory {
    name: String,
    description: Option<String>,
    #[serde(default)]
    variants: Vec<SeedVariant>,
}

#[derive(Debug, Deserialize)]
struct SeedVariant {
    tower_code: String,
    height: f64,
    structural_type: StructuralType,
    load_class: Option<String>,
    engineering_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SeedSlider {
    title: String,
    description: Option<String>,
    image_url: String,
    link_url: Option<String>,
    order: i32,
}

/// What a seed run created.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub variants: usize,
    pub documents: usize,
    pub sliders: usize,
}

/// Create the schema and optionally load the sample catalog.
pub async fn cmd_init(settings: &Settings, seed: bool) -> anyhow::Result<()> {
    let db = open_database(settings)?;
    println!(
        "{} Database ready at {}",
        style("✓").green(),
        settings.database_connection_string()
    );

    if !seed {
        return Ok(());
    }

    if db.categories().count().await? > 0 {
        println!(
            "{} Catalog already has data; skipping sample data",
            style("!").yellow()
        );
        return Ok(());
    }

    let summary = seed_sample_data(&db).await?;
    println!("{} Sample data created", style("✓").green());
    println!("  {} categories", summary.categories);
    println!("  {} tower variants", summary.variants);
    println!("  {} placeholder documents", summary.documents);
    println!("  {} homepage sliders", summary.sliders);
    Ok(())
}

/// Load the bundled sample catalog. Every variant gets a placeholder document.
pub async fn seed_sample_data(db: &DbContext) -> anyhow::Result<SeedSummary> {
    let data: SeedFile = toml::from_str(SEED_DATA)?;
    let mut summary = SeedSummary::default();

    for seed_category in data.categories {
        let category = db
            .categories()
            .create(NewCategory {
                name: seed_category.name,
                description: seed_category.description,
                thumbnail_url: None,
            })
            .await?;
        summary.categories += 1;

        for v in seed_category.variants {
            let variant = db
                .variants()
                .create(NewVariant {
                    tower_code: v.tower_code,
                    height: v.height,
                    structural_type: v.structural_type,
                    load_class: v.load_class,
                    engineering_notes: v.engineering_notes,
                    category_id: category.id,
                })
                .await?;

            let i = summary.variants as u64;
            db.documents()
                .insert_active(NewDocument {
                    variant_id: variant.id,
                    pdf_url: format!("/uploads/sample_{}.pdf", variant.tower_code),
                    page_count: 5 + (i % 3) as u32,
                    file_size: 2_048_000 + i * 500_000,
                    version: "1.0".to_string(),
                })
                .await?;
            summary.variants += 1;
            summary.documents += 1;
        }
    }

    for s in data.sliders {
        db.sliders()
            .create(NewSlider {
                title: s.title,
                description: s.description,
                image_url: s.image_url,
                link_url: s.link_url,
                display_order: s.order,
                is_active: true,
            })
            .await?;
        summary.sliders += 1;
    }

    tracing::info!(?summary, "Seeded sample catalog");
    Ok(summary)
}
