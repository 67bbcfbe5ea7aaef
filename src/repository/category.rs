//! Category repository.

use std::collections::HashMap;

use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;

use super::schema::{tower_categories, tower_documents, tower_variants};
use super::{format_datetime, last_insert_id, like_pattern, parse_datetime};
use super::{DbContext, RepositoryError, Result};
use crate::models::{Category, CategorySummary, NewCategory};

/// Row type for Diesel query mapping.
#[derive(Queryable, Selectable)]
#[diesel(table_name = tower_categories)]
#[diesel(check_for_backend(Sqlite))]
pub(super) struct CategoryRow {
    id: i32,
    name: String,
    description: Option<String>,
    thumbnail_url: Option<String>,
    created_at: String,
    updated_at: String,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            name: row.name,
            description: row.description,
            thumbnail_url: row.thumbnail_url,
            created_at: parse_datetime(&row.created_at),
            updated_at: parse_datetime(&row.updated_at),
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = tower_categories)]
struct CategoryInsert {
    name: String,
    description: Option<String>,
    thumbnail_url: Option<String>,
    created_at: String,
    updated_at: String,
}

fn duplicate_name(name: &str) -> String {
    format!("A category named '{}' already exists.", name)
}

/// Diesel-backed category repository.
#[derive(Clone)]
pub struct CategoryRepository {
    db: DbContext,
}

impl CategoryRepository {
    pub(super) fn new(db: DbContext) -> Self {
        Self { db }
    }

    /// Get all categories ordered by name.
    pub async fn list(&self) -> Result<Vec<Category>> {
        self.db
            .run(|conn| {
                let rows = tower_categories::table
                    .order(tower_categories::name.asc())
                    .select(CategoryRow::as_select())
                    .load(conn)?;
                Ok(rows.into_iter().map(Category::from).collect())
            })
            .await
    }

    /// Get all categories with the number of variants in each.
    pub async fn list_with_counts(&self) -> Result<Vec<CategorySummary>> {
        self.db
            .run(|conn| {
                let rows = tower_categories::table
                    .order(tower_categories::name.asc())
                    .select(CategoryRow::as_select())
                    .load(conn)?;

                let counts: HashMap<i32, i64> = tower_variants::table
                    .group_by(tower_variants::category_id)
                    .select((tower_variants::category_id, diesel::dsl::count_star()))
                    .load::<(i32, i64)>(conn)?
                    .into_iter()
                    .collect();

                Ok(rows
                    .into_iter()
                    .map(|row| {
                        let variant_count = counts.get(&row.id).copied().unwrap_or(0).max(0) as u64;
                        CategorySummary {
                            category: Category::from(row),
                            variant_count,
                        }
                    })
                    .collect())
            })
            .await
    }

    /// Get a category by ID.
    pub async fn get(&self, id: i32) -> Result<Option<Category>> {
        self.db
            .run(move |conn| {
                let row = tower_categories::table
                    .find(id)
                    .select(CategoryRow::as_select())
                    .first(conn)
                    .optional()?;
                Ok(row.map(Category::from))
            })
            .await
    }

    /// Get a category by its exact name.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Category>> {
        let name = name.to_string();
        self.db
            .run(move |conn| {
                let row = tower_categories::table
                    .filter(tower_categories::name.eq(name))
                    .select(CategoryRow::as_select())
                    .first(conn)
                    .optional()?;
                Ok(row.map(Category::from))
            })
            .await
    }

    /// Insert a category, returning the stored record.
    pub async fn create(&self, new: NewCategory) -> Result<Category> {
        self.db
            .run(move |conn| {
                let now = format_datetime(&Utc::now());
                let conflict = duplicate_name(&new.name);
                let insert = CategoryInsert {
                    name: new.name,
                    description: new.description,
                    thumbnail_url: new.thumbnail_url,
                    created_at: now.clone(),
                    updated_at: now,
                };

                conn.transaction::<_, RepositoryError, _>(|conn| {
                    diesel::insert_into(tower_categories::table)
                        .values(&insert)
                        .execute(conn)
                        .map_err(|e| RepositoryError::from_write(e, conflict))?;
                    let id = last_insert_id(conn)?;
                    let row = tower_categories::table
                        .find(id)
                        .select(CategoryRow::as_select())
                        .first(conn)?;
                    Ok(Category::from(row))
                })
            })
            .await
    }

    /// Update a category. Returns false if it does not exist.
    pub async fn update(&self, id: i32, changes: NewCategory) -> Result<bool> {
        self.db
            .run(move |conn| {
                let now = format_datetime(&Utc::now());
                let conflict = duplicate_name(&changes.name);
                let affected = diesel::update(tower_categories::table.find(id))
                    .set((
                        tower_categories::name.eq(changes.name),
                        tower_categories::description.eq(changes.description),
                        tower_categories::thumbnail_url.eq(changes.thumbnail_url),
                        tower_categories::updated_at.eq(now),
                    ))
                    .execute(conn)
                    .map_err(|e| RepositoryError::from_write(e, conflict))?;
                Ok(affected > 0)
            })
            .await
    }

    /// Delete a category together with its variants and their documents.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        self.db
            .run(move |conn| {
                conn.transaction::<_, RepositoryError, _>(|conn| {
                    let variant_ids = tower_variants::table
                        .filter(tower_variants::category_id.eq(id))
                        .select(tower_variants::id);

                    diesel::delete(
                        tower_documents::table
                            .filter(tower_documents::variant_id.eq_any(variant_ids)),
                    )
                    .execute(conn)?;
                    diesel::delete(
                        tower_variants::table.filter(tower_variants::category_id.eq(id)),
                    )
                    .execute(conn)?;
                    let affected =
                        diesel::delete(tower_categories::table.find(id)).execute(conn)?;
                    Ok(affected > 0)
                })
            })
            .await
    }

    /// Total number of categories.
    pub async fn count(&self) -> Result<u64> {
        self.db
            .run(|conn| {
                let count: i64 = tower_categories::table.count().get_result(conn)?;
                Ok(count.max(0) as u64)
            })
            .await
    }

    /// Most recently created categories.
    pub async fn recent(&self, limit: i64) -> Result<Vec<Category>> {
        self.db
            .run(move |conn| {
                let rows = tower_categories::table
                    .order((tower_categories::created_at.desc(), tower_categories::id.desc()))
                    .limit(limit)
                    .select(CategoryRow::as_select())
                    .load(conn)?;
                Ok(rows.into_iter().map(Category::from).collect())
            })
            .await
    }

    /// Case-insensitive substring search on the category name.
    pub async fn search(&self, query: &str) -> Result<Vec<Category>> {
        let pattern = like_pattern(query);
        self.db
            .run(move |conn| {
                let rows = tower_categories::table
                    .filter(tower_categories::name.like(pattern).escape('\\'))
                    .order(tower_categories::name.asc())
                    .select(CategoryRow::as_select())
                    .load(conn)?;
                Ok(rows.into_iter().map(Category::from).collect())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewDocument, NewVariant, StructuralType};
    use crate::repository::test_support::temp_db;

    fn category(name: &str) -> NewCategory {
        NewCategory {
            name: name.to_string(),
            description: Some("Sample".to_string()),
            thumbnail_url: None,
        }
    }

    #[tokio::test]
    async fn test_create_get_and_duplicate_name() {
        let (_dir, db) = temp_db();
        let repo = db.categories();

        let created = repo.create(category("Monopole Tower")).await.unwrap();
        assert!(created.id > 0);
        assert_eq!(created.name, "Monopole Tower");

        let fetched = repo.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);

        let err = repo.create(category("Monopole Tower")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_missing_category() {
        let (_dir, db) = temp_db();
        let updated = db.categories().update(99, category("Guyed Tower")).await.unwrap();
        assert!(!updated);
    }

    #[tokio::test]
    async fn test_list_with_counts_and_search() {
        let (_dir, db) = temp_db();
        let repo = db.categories();
        let mono = repo.create(category("Monopole Tower")).await.unwrap();
        repo.create(category("Guyed Tower")).await.unwrap();

        db.variants()
            .create(NewVariant {
                tower_code: "MP-30".to_string(),
                height: 30.0,
                structural_type: StructuralType::Monopole,
                load_class: None,
                engineering_notes: None,
                category_id: mono.id,
            })
            .await
            .unwrap();

        let summaries = repo.list_with_counts().await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].category.name, "Guyed Tower");
        assert_eq!(summaries[0].variant_count, 0);
        assert_eq!(summaries[1].variant_count, 1);

        let hits = repo.search("mono").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(repo.search("100%").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_empty_category() {
        let (_dir, db) = temp_db();
        let repo = db.categories();
        let created = repo.create(category("Empty")).await.unwrap();

        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.get(created.id).await.unwrap().is_none());
        assert!(!repo.delete(created.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_category_removes_subtree() {
        let (_dir, db) = temp_db();
        let cat = db.categories().create(category("Lattice")).await.unwrap();
        let variant = db
            .variants()
            .create(NewVariant {
                tower_code: "SST-45".to_string(),
                height: 45.0,
                structural_type: StructuralType::SelfSupporting,
                load_class: Some("Class A".to_string()),
                engineering_notes: None,
                category_id: cat.id,
            })
            .await
            .unwrap();
        db.documents()
            .insert_active(NewDocument {
                variant_id: variant.id,
                pdf_url: "/uploads/SST-45_1.0.pdf".to_string(),
                page_count: 3,
                file_size: 1024,
                version: "1.0".to_string(),
            })
            .await
            .unwrap();

        assert!(db.categories().delete(cat.id).await.unwrap());
        assert_eq!(db.variants().count().await.unwrap(), 0);
        assert_eq!(db.documents().count().await.unwrap(), 0);
    }
}
