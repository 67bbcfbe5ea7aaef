//! Catalog statistics command.

use console::style;

use crate::config::Settings;

use super::super::helpers::{open_database, truncate};

/// Show catalog totals and per-category variant counts.
pub async fn cmd_stats(settings: &Settings) -> anyhow::Result<()> {
    let db = open_database(settings)?;

    let categories = db.categories().list_with_counts().await?;
    let variants = db.variants().count().await?;
    let documents = db.documents().count().await?;
    let visits = db.visitors().get().await?;
    let sliders = db.sliders().list().await?;

    println!("\n{}", style("Tower Catalog").bold());
    println!("{}", "-".repeat(40));
    println!("{:<20} {}", "Data Directory:", settings.data_dir.display());
    println!("{:<20} {}", "Categories:", categories.len());
    println!("{:<20} {}", "Variants:", variants);
    println!("{:<20} {}", "Documents:", documents);
    println!(
        "{:<20} {} active / {} total",
        "Sliders:",
        sliders.iter().filter(|s| s.is_active).count(),
        sliders.len()
    );
    println!("{:<20} {}", "Visits:", visits.total_visits);
    if let Some(last) = visits.last_visit {
        println!("{:<20} {}", "Last Visit:", last.format("%Y-%m-%d %H:%M"));
    }

    if !categories.is_empty() {
        println!("\n{:<30} Variants", "Category");
        println!("{}", "-".repeat(40));
        for summary in &categories {
            println!(
                "{:<30} {}",
                truncate(&summary.category.name, 29),
                summary.variant_count
            );
        }
    }

    Ok(())
}
