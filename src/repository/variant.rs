//! Variant repository.

use std::collections::HashMap;

use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;

use super::category::CategoryRow;
use super::schema::{tower_categories, tower_documents, tower_variants};
use super::{format_datetime, last_insert_id, like_pattern, parse_datetime};
use super::{DbContext, RepositoryError, Result};
use crate::models::{Category, NewVariant, StructuralType, Variant, VariantWithCategory};

#[derive(Queryable, Selectable)]
#[diesel(table_name = tower_variants)]
#[diesel(check_for_backend(Sqlite))]
struct VariantRow {
    id: i32,
    tower_code: String,
    height: f64,
    structural_type: String,
    load_class: Option<String>,
    engineering_notes: Option<String>,
    category_id: i32,
    created_at: String,
    updated_at: String,
}

impl From<VariantRow> for Variant {
    fn from(row: VariantRow) -> Self {
        Variant {
            id: row.id,
            tower_code: row.tower_code,
            height: row.height,
            structural_type: row
                .structural_type
                .parse()
                .unwrap_or(StructuralType::SelfSupporting),
            load_class: row.load_class,
            engineering_notes: row.engineering_notes,
            category_id: row.category_id,
            created_at: parse_datetime(&row.created_at),
            updated_at: parse_datetime(&row.updated_at),
        }
    }
}

fn with_category((variant, category): (VariantRow, CategoryRow)) -> VariantWithCategory {
    VariantWithCategory {
        variant: Variant::from(variant),
        category: Category::from(category),
    }
}

#[derive(Insertable)]
#[diesel(table_name = tower_variants)]
struct VariantInsert {
    tower_code: String,
    height: f64,
    structural_type: String,
    load_class: Option<String>,
    engineering_notes: Option<String>,
    category_id: i32,
    created_at: String,
    updated_at: String,
}

fn duplicate_code(code: &str) -> String {
    format!("Tower code '{}' is already in use.", code)
}

/// Diesel-backed variant repository.
#[derive(Clone)]
pub struct VariantRepository {
    db: DbContext,
}

impl VariantRepository {
    pub(super) fn new(db: DbContext) -> Self {
        Self { db }
    }

    /// All variants with their categories, ordered by tower code.
    pub async fn list(&self) -> Result<Vec<VariantWithCategory>> {
        self.db
            .run(|conn| {
                let rows = tower_variants::table
                    .inner_join(tower_categories::table)
                    .order(tower_variants::tower_code.asc())
                    .select((VariantRow::as_select(), CategoryRow::as_select()))
                    .load::<(VariantRow, CategoryRow)>(conn)?;
                Ok(rows.into_iter().map(with_category).collect())
            })
            .await
    }

    /// Variants of one category, shortest first.
    pub async fn list_by_category(&self, category_id: i32) -> Result<Vec<Variant>> {
        self.db
            .run(move |conn| {
                let rows = tower_variants::table
                    .filter(tower_variants::category_id.eq(category_id))
                    .order((tower_variants::height.asc(), tower_variants::tower_code.asc()))
                    .select(VariantRow::as_select())
                    .load(conn)?;
                Ok(rows.into_iter().map(Variant::from).collect())
            })
            .await
    }

    /// Get a variant by ID.
    pub async fn get(&self, id: i32) -> Result<Option<Variant>> {
        self.db
            .run(move |conn| {
                let row = tower_variants::table
                    .find(id)
                    .select(VariantRow::as_select())
                    .first(conn)
                    .optional()?;
                Ok(row.map(Variant::from))
            })
            .await
    }

    /// Get a variant by ID together with its category.
    pub async fn get_with_category(&self, id: i32) -> Result<Option<VariantWithCategory>> {
        self.db
            .run(move |conn| {
                let row = tower_variants::table
                    .inner_join(tower_categories::table)
                    .filter(tower_variants::id.eq(id))
                    .select((VariantRow::as_select(), CategoryRow::as_select()))
                    .first::<(VariantRow, CategoryRow)>(conn)
                    .optional()?;
                Ok(row.map(with_category))
            })
            .await
    }

    /// Insert a variant, returning the stored record.
    pub async fn create(&self, new: NewVariant) -> Result<Variant> {
        self.db
            .run(move |conn| {
                let now = format_datetime(&Utc::now());
                let conflict = duplicate_code(&new.tower_code);
                let insert = VariantInsert {
                    tower_code: new.tower_code,
                    height: new.height,
                    structural_type: new.structural_type.as_str().to_string(),
                    load_class: new.load_class,
                    engineering_notes: new.engineering_notes,
                    category_id: new.category_id,
                    created_at: now.clone(),
                    updated_at: now,
                };

                conn.transaction::<_, RepositoryError, _>(|conn| {
                    diesel::insert_into(tower_variants::table)
                        .values(&insert)
                        .execute(conn)
                        .map_err(|e| RepositoryError::from_write(e, conflict))?;
                    let id = last_insert_id(conn)?;
                    let row = tower_variants::table
                        .find(id)
                        .select(VariantRow::as_select())
                        .first(conn)?;
                    Ok(Variant::from(row))
                })
            })
            .await
    }

    /// Update a variant. Returns false if it does not exist.
    pub async fn update(&self, id: i32, changes: NewVariant) -> Result<bool> {
        self.db
            .run(move |conn| {
                let now = format_datetime(&Utc::now());
                let conflict = duplicate_code(&changes.tower_code);
                let affected = diesel::update(tower_variants::table.find(id))
                    .set((
                        tower_variants::tower_code.eq(changes.tower_code),
                        tower_variants::height.eq(changes.height),
                        tower_variants::structural_type.eq(changes.structural_type.as_str()),
                        tower_variants::load_class.eq(changes.load_class),
                        tower_variants::engineering_notes.eq(changes.engineering_notes),
                        tower_variants::category_id.eq(changes.category_id),
                        tower_variants::updated_at.eq(now),
                    ))
                    .execute(conn)
                    .map_err(|e| RepositoryError::from_write(e, conflict))?;
                Ok(affected > 0)
            })
            .await
    }

    /// Delete a variant and its documents.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        self.db
            .run(move |conn| {
                conn.transaction::<_, RepositoryError, _>(|conn| {
                    diesel::delete(tower_documents::table.filter(tower_documents::variant_id.eq(id)))
                        .execute(conn)?;
                    let affected = diesel::delete(tower_variants::table.find(id)).execute(conn)?;
                    Ok(affected > 0)
                })
            })
            .await
    }

    /// Total number of variants.
    pub async fn count(&self) -> Result<u64> {
        self.db
            .run(|conn| {
                let count: i64 = tower_variants::table.count().get_result(conn)?;
                Ok(count.max(0) as u64)
            })
            .await
    }

    /// Most recently created variants with their categories.
    pub async fn recent(&self, limit: i64) -> Result<Vec<VariantWithCategory>> {
        self.db
            .run(move |conn| {
                let rows = tower_variants::table
                    .inner_join(tower_categories::table)
                    .order((tower_variants::created_at.desc(), tower_variants::id.desc()))
                    .limit(limit)
                    .select((VariantRow::as_select(), CategoryRow::as_select()))
                    .load::<(VariantRow, CategoryRow)>(conn)?;
                Ok(rows.into_iter().map(with_category).collect())
            })
            .await
    }

    /// Case-insensitive substring match on tower code or structural type.
    pub async fn search(&self, query: &str) -> Result<Vec<VariantWithCategory>> {
        let pattern = like_pattern(query);
        self.db
            .run(move |conn| {
                let rows = tower_variants::table
                    .inner_join(tower_categories::table)
                    .filter(
                        tower_variants::tower_code
                            .like(pattern.clone())
                            .escape('\\')
                            .or(tower_variants::structural_type.like(pattern).escape('\\')),
                    )
                    .order(tower_variants::tower_code.asc())
                    .select((VariantRow::as_select(), CategoryRow::as_select()))
                    .load::<(VariantRow, CategoryRow)>(conn)?;
                Ok(rows.into_iter().map(with_category).collect())
            })
            .await
    }

    /// Number of stored documents per variant ID.
    pub async fn document_counts(&self) -> Result<HashMap<i32, u64>> {
        self.db
            .run(|conn| {
                let counts = tower_documents::table
                    .group_by(tower_documents::variant_id)
                    .select((tower_documents::variant_id, diesel::dsl::count_star()))
                    .load::<(i32, i64)>(conn)?;
                Ok(counts
                    .into_iter()
                    .map(|(id, count)| (id, count.max(0) as u64))
                    .collect())
            })
            .await
    }
}
