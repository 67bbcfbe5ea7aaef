//! Document repository.
//!
//! At most one document per variant is active. `insert_active` deactivates
//! and inserts in one transaction, and a partial unique index rejects a
//! concurrent second active row.

use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;

use super::schema::{tower_documents, tower_variants};
use super::{format_datetime, last_insert_id, parse_datetime};
use super::{DbContext, RepositoryError, Result};
use crate::models::{Document, DocumentWithVariant, NewDocument};

#[derive(Queryable, Selectable)]
#[diesel(table_name = tower_documents)]
#[diesel(check_for_backend(Sqlite))]
struct DocumentRow {
    id: i32,
    variant_id: i32,
    pdf_url: String,
    page_count: i32,
    file_size: i64,
    version: String,
    upload_timestamp: String,
    is_active: bool,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Document {
            id: row.id,
            variant_id: row.variant_id,
            pdf_url: row.pdf_url,
            page_count: row.page_count.max(0) as u32,
            file_size: row.file_size.max(0) as u64,
            version: row.version,
            upload_timestamp: parse_datetime(&row.upload_timestamp),
            is_active: row.is_active,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = tower_documents)]
struct DocumentInsert {
    variant_id: i32,
    pdf_url: String,
    page_count: i32,
    file_size: i64,
    version: String,
    upload_timestamp: String,
    is_active: bool,
}

/// Diesel-backed document repository.
#[derive(Clone)]
pub struct DocumentRepository {
    db: DbContext,
}

impl DocumentRepository {
    pub(super) fn new(db: DbContext) -> Self {
        Self { db }
    }

    /// All documents with their variant's tower code, newest first.
    pub async fn list_with_variants(&self) -> Result<Vec<DocumentWithVariant>> {
        self.db
            .run(|conn| {
                let rows = tower_documents::table
                    .inner_join(tower_variants::table)
                    .order((
                        tower_documents::upload_timestamp.desc(),
                        tower_documents::id.desc(),
                    ))
                    .select((DocumentRow::as_select(), tower_variants::tower_code))
                    .load::<(DocumentRow, String)>(conn)?;
                Ok(rows
                    .into_iter()
                    .map(|(row, tower_code)| DocumentWithVariant {
                        document: Document::from(row),
                        tower_code,
                    })
                    .collect())
            })
            .await
    }

    /// Get a document by ID.
    pub async fn get(&self, id: i32) -> Result<Option<Document>> {
        self.db
            .run(move |conn| {
                let row = tower_documents::table
                    .find(id)
                    .select(DocumentRow::as_select())
                    .first(conn)
                    .optional()?;
                Ok(row.map(Document::from))
            })
            .await
    }

    /// Every document of a variant, newest first.
    pub async fn for_variant(&self, variant_id: i32) -> Result<Vec<Document>> {
        self.db
            .run(move |conn| {
                let rows = tower_documents::table
                    .filter(tower_documents::variant_id.eq(variant_id))
                    .order((
                        tower_documents::upload_timestamp.desc(),
                        tower_documents::id.desc(),
                    ))
                    .select(DocumentRow::as_select())
                    .load(conn)?;
                Ok(rows.into_iter().map(Document::from).collect())
            })
            .await
    }

    /// The active document of a variant, if any.
    pub async fn active_for_variant(&self, variant_id: i32) -> Result<Option<Document>> {
        self.db
            .run(move |conn| {
                let row = tower_documents::table
                    .filter(tower_documents::variant_id.eq(variant_id))
                    .filter(tower_documents::is_active.eq(true))
                    .order((
                        tower_documents::upload_timestamp.desc(),
                        tower_documents::id.desc(),
                    ))
                    .select(DocumentRow::as_select())
                    .first(conn)
                    .optional()?;
                Ok(row.map(Document::from))
            })
            .await
    }

    /// Mark every document of a variant inactive. Returns rows changed.
    pub async fn deactivate_for_variant(&self, variant_id: i32) -> Result<usize> {
        self.db
            .run(move |conn| {
                let changed = diesel::update(
                    tower_documents::table
                        .filter(tower_documents::variant_id.eq(variant_id))
                        .filter(tower_documents::is_active.eq(true)),
                )
                .set(tower_documents::is_active.eq(false))
                .execute(conn)?;
                Ok(changed)
            })
            .await
    }

    /// Insert a new active document, deactivating any other in the same transaction.
    pub async fn insert_active(&self, new: NewDocument) -> Result<Document> {
        self.db
            .run(move |conn| {
                let variant_id = new.variant_id;
                let insert = DocumentInsert {
                    variant_id,
                    pdf_url: new.pdf_url,
                    page_count: i32::try_from(new.page_count).unwrap_or(i32::MAX),
                    file_size: i64::try_from(new.file_size).unwrap_or(i64::MAX),
                    version: new.version,
                    upload_timestamp: format_datetime(&Utc::now()),
                    is_active: true,
                };

                conn.transaction::<_, RepositoryError, _>(|conn| {
                    diesel::update(
                        tower_documents::table
                            .filter(tower_documents::variant_id.eq(variant_id))
                            .filter(tower_documents::is_active.eq(true)),
                    )
                    .set(tower_documents::is_active.eq(false))
                    .execute(conn)?;

                    diesel::insert_into(tower_documents::table)
                        .values(&insert)
                        .execute(conn)
                        .map_err(|e| {
                            RepositoryError::from_write(
                                e,
                                "Another document for this variant was activated concurrently.",
                            )
                        })?;
                    let id = last_insert_id(conn)?;
                    let row = tower_documents::table
                        .find(id)
                        .select(DocumentRow::as_select())
                        .first(conn)?;
                    Ok(Document::from(row))
                })
            })
            .await
    }

    /// Delete a document record. The stored file is left in place.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        self.db
            .run(move |conn| {
                let affected = diesel::delete(tower_documents::table.find(id)).execute(conn)?;
                Ok(affected > 0)
            })
            .await
    }

    /// Total number of documents.
    pub async fn count(&self) -> Result<u64> {
        self.db
            .run(|conn| {
                let count: i64 = tower_documents::table.count().get_result(conn)?;
                Ok(count.max(0) as u64)
            })
            .await
    }

    /// Number of active documents of a variant (0 or 1).
    pub async fn count_active_for_variant(&self, variant_id: i32) -> Result<u64> {
        self.db
            .run(move |conn| {
                let count: i64 = tower_documents::table
                    .filter(tower_documents::variant_id.eq(variant_id))
                    .filter(tower_documents::is_active.eq(true))
                    .count()
                    .get_result(conn)?;
                Ok(count.max(0) as u64)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewCategory, NewVariant, StructuralType};
    use crate::repository::test_support::temp_db;

    async fn seed_variant(db: &DbContext) -> i32 {
        let cat = db
            .categories()
            .create(NewCategory {
                name: "Monopole Tower".to_string(),
                description: None,
                thumbnail_url: None,
            })
            .await
            .unwrap();
        db.variants()
            .create(NewVariant {
                tower_code: "MP-30".to_string(),
                height: 30.0,
                structural_type: StructuralType::Monopole,
                load_class: None,
                engineering_notes: None,
                category_id: cat.id,
            })
            .await
            .unwrap()
            .id
    }

    fn document(variant_id: i32, version: &str) -> NewDocument {
        NewDocument {
            variant_id,
            pdf_url: format!("/uploads/MP-30_{}.pdf", version),
            page_count: 4,
            file_size: 2048,
            version: version.to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_active_replaces_previous() {
        let (_dir, db) = temp_db();
        let variant_id = seed_variant(&db).await;
        let repo = db.documents();

        let first = repo.insert_active(document(variant_id, "1.0")).await.unwrap();
        let second = repo.insert_active(document(variant_id, "1.1")).await.unwrap();
        assert!(first.is_active && second.is_active);

        assert_eq!(repo.count_active_for_variant(variant_id).await.unwrap(), 1);
        let active = repo.active_for_variant(variant_id).await.unwrap().unwrap();
        assert_eq!(active.id, second.id);

        let all = repo.for_variant(variant_id).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);
        assert!(!all[1].is_active);
    }

    #[tokio::test]
    async fn test_deactivate_leaves_no_active_document() {
        let (_dir, db) = temp_db();
        let variant_id = seed_variant(&db).await;
        let repo = db.documents();
        repo.insert_active(document(variant_id, "1.0")).await.unwrap();

        assert_eq!(repo.deactivate_for_variant(variant_id).await.unwrap(), 1);
        assert!(repo.active_for_variant(variant_id).await.unwrap().is_none());
        assert_eq!(repo.deactivate_for_variant(variant_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_with_variants_and_delete() {
        let (_dir, db) = temp_db();
        let variant_id = seed_variant(&db).await;
        let repo = db.documents();
        let doc = repo.insert_active(document(variant_id, "2.0")).await.unwrap();

        let listed = repo.list_with_variants().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].tower_code, "MP-30");
        assert_eq!(listed[0].document.page_count, 4);
        assert_eq!(listed[0].document.file_size, 2048);

        assert!(repo.delete(doc.id).await.unwrap());
        assert!(repo.get(doc.id).await.unwrap().is_none());
    }
}
