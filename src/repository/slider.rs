//! Slider repository.

use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;

use super::schema::sliders;
use super::{format_datetime, last_insert_id, parse_datetime};
use super::{DbContext, RepositoryError, Result};
use crate::models::{NewSlider, Slider};

#[derive(Queryable, Selectable)]
#[diesel(table_name = sliders)]
#[diesel(check_for_backend(Sqlite))]
struct SliderRow {
    id: i32,
    title: String,
    description: Option<String>,
    image_url: String,
    link_url: Option<String>,
    display_order: i32,
    is_active: bool,
    created_at: String,
    updated_at: String,
}

impl From<SliderRow> for Slider {
    fn from(row: SliderRow) -> Self {
        Slider {
            id: row.id,
            title: row.title,
            description: row.description,
            image_url: row.image_url,
            link_url: row.link_url,
            display_order: row.display_order,
            is_active: row.is_active,
            created_at: parse_datetime(&row.created_at),
            updated_at: parse_datetime(&row.updated_at),
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = sliders)]
struct SliderInsert {
    title: String,
    description: Option<String>,
    image_url: String,
    link_url: Option<String>,
    display_order: i32,
    is_active: bool,
    created_at: String,
    updated_at: String,
}

/// Diesel-backed slider repository.
#[derive(Clone)]
pub struct SliderRepository {
    db: DbContext,
}

impl SliderRepository {
    pub(super) fn new(db: DbContext) -> Self {
        Self { db }
    }

    /// All sliders in display order.
    pub async fn list(&self) -> Result<Vec<Slider>> {
        self.load(false).await
    }

    /// Active sliders in display order.
    pub async fn list_active(&self) -> Result<Vec<Slider>> {
        self.load(true).await
    }

    async fn load(&self, active_only: bool) -> Result<Vec<Slider>> {
        self.db
            .run(move |conn| {
                let mut query = sliders::table
                    .order((sliders::display_order.asc(), sliders::id.asc()))
                    .select(SliderRow::as_select())
                    .into_boxed();
                if active_only {
                    query = query.filter(sliders::is_active.eq(true));
                }
                let rows = query.load(conn)?;
                Ok(rows.into_iter().map(Slider::from).collect())
            })
            .await
    }

    /// Get a slider by ID.
    pub async fn get(&self, id: i32) -> Result<Option<Slider>> {
        self.db
            .run(move |conn| {
                let row = sliders::table
                    .find(id)
                    .select(SliderRow::as_select())
                    .first(conn)
                    .optional()?;
                Ok(row.map(Slider::from))
            })
            .await
    }

    pub async fn create(&self, new: NewSlider) -> Result<Slider> {
        self.db
            .run(move |conn| {
                let now = format_datetime(&Utc::now());
                let insert = SliderInsert {
                    title: new.title,
                    description: new.description,
                    image_url: new.image_url,
                    link_url: new.link_url,
                    display_order: new.display_order,
                    is_active: new.is_active,
                    created_at: now.clone(),
                    updated_at: now,
                };

                conn.transaction::<_, RepositoryError, _>(|conn| {
                    diesel::insert_into(sliders::table)
                        .values(&insert)
                        .execute(conn)?;
                    let id = last_insert_id(conn)?;
                    let row = sliders::table
                        .find(id)
                        .select(SliderRow::as_select())
                        .first(conn)?;
                    Ok(Slider::from(row))
                })
            })
            .await
    }

    pub async fn update(&self, id: i32, changes: NewSlider) -> Result<bool> {
        self.db
            .run(move |conn| {
                let affected = diesel::update(sliders::table.find(id))
                    .set((
                        sliders::title.eq(changes.title),
                        sliders::description.eq(changes.description),
                        sliders::image_url.eq(changes.image_url),
                        sliders::link_url.eq(changes.link_url),
                        sliders::display_order.eq(changes.display_order),
                        sliders::is_active.eq(changes.is_active),
                        sliders::updated_at.eq(format_datetime(&Utc::now())),
                    ))
                    .execute(conn)?;
                Ok(affected > 0)
            })
            .await
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        self.db
            .run(move |conn| {
                let affected = diesel::delete(sliders::table.find(id)).execute(conn)?;
                Ok(affected > 0)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::temp_db;

    fn slider(title: &str, order: i32, active: bool) -> NewSlider {
        NewSlider {
            title: title.to_string(),
            description: None,
            image_url: "https://example.com/banner.jpg".to_string(),
            link_url: None,
            display_order: order,
            is_active: active,
        }
    }

    #[tokio::test]
    async fn test_list_active_in_display_order() {
        let (_dir, db) = temp_db();
        let repo = db.sliders();
        repo.create(slider("Second", 2, true)).await.unwrap();
        repo.create(slider("Hidden", 0, false)).await.unwrap();
        repo.create(slider("First", 1, true)).await.unwrap();

        let titles: Vec<_> = repo
            .list_active()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, vec!["First", "Second"]);
        assert_eq!(repo.list().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (_dir, db) = temp_db();
        let repo = db.sliders();
        let created = repo.create(slider("Welcome", 0, true)).await.unwrap();

        assert!(repo.update(created.id, slider("Welcome back", 3, false)).await.unwrap());
        let updated = repo.get(created.id).await.unwrap().unwrap();
        assert_eq!(updated.title, "Welcome back");
        assert_eq!(updated.display_order, 3);
        assert!(!updated.is_active);

        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.get(created.id).await.unwrap().is_none());
    }
}
