//! SQLite persistence via Diesel.
//!
//! Diesel is synchronous; every repository method checks a connection out of
//! the r2d2 pool and runs on tokio's blocking pool so handlers stay async.

mod category;
mod document;
pub mod schema;
mod slider;
mod variant;
mod visitor;

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sqlite::SqliteConnection;
use diesel::{QueryableByName, RunQueryDsl};
use thiserror::Error;

pub use category::CategoryRepository;
pub use document::DocumentRepository;
pub use slider::SliderRepository;
pub use variant::VariantRepository;
pub use visitor::VisitorRepository;

/// Pool of SQLite connections.
pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

/// Repository result type.
pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Errors raised by the persistence layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] DieselError),
    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
    /// A unique constraint rejected the write.
    #[error("{0}")]
    Conflict(String),
    #[error("database task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl RepositoryError {
    /// Map unique-constraint violations to `Conflict` with a readable message.
    pub(crate) fn from_write(err: DieselError, conflict_message: impl Into<String>) -> Self {
        match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                RepositoryError::Conflict(conflict_message.into())
            }
            other => RepositoryError::Database(other),
        }
    }
}

/// Per-connection pragmas. Foreign keys are off by default in SQLite.
#[derive(Debug, Clone, Copy)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> std::result::Result<(), diesel::r2d2::Error> {
        conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Format a timestamp for storage (fixed width, sorts lexically).
pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp, falling back to now for corrupt values.
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Parse an optional stored timestamp.
pub(crate) fn parse_datetime_opt(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Escape `%`, `_` and `\` for a LIKE pattern using `\` as escape character.
pub(crate) fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[derive(QueryableByName)]
pub(crate) struct LastInsertId {
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub id: i64,
}

/// Row id of the last insert on this connection.
pub(crate) fn last_insert_id(conn: &mut SqliteConnection) -> std::result::Result<i32, DieselError> {
    let row: LastInsertId =
        diesel::sql_query("SELECT last_insert_rowid() AS id").get_result(conn)?;
    Ok(row.id as i32)
}

#[derive(QueryableByName)]
struct Probe {
    #[diesel(sql_type = diesel::sql_types::Integer)]
    #[allow(dead_code)]
    ok: i32,
}

/// Shared handle to the database; hands out per-entity repositories.
#[derive(Clone)]
pub struct DbContext {
    pool: DbPool,
}

impl DbContext {
    /// Open (creating if needed) the database and ensure the schema exists.
    pub fn open(database_url: &str) -> Result<Self> {
        let manager = ConnectionManager::<SqliteConnection>::new(database_url);
        let pool = Pool::builder()
            .max_size(8)
            .connection_timeout(Duration::from_secs(5))
            .connection_customizer(Box::new(SqlitePragmas))
            .build(manager)?;

        let ctx = Self { pool };
        ctx.init_schema()?;
        Ok(ctx)
    }

    /// Build a pool without connecting or touching the schema.
    ///
    /// Connections are established on first use and fail after `timeout`.
    pub fn lazy(database_url: &str, timeout: Duration) -> Self {
        let manager = ConnectionManager::<SqliteConnection>::new(database_url);
        let pool = Pool::builder()
            .max_size(4)
            .min_idle(Some(0))
            .connection_timeout(timeout)
            .connection_customizer(Box::new(SqlitePragmas))
            .build_unchecked(manager);
        Self { pool }
    }

    /// Create tables and indexes if they do not exist.
    pub fn init_schema(&self) -> Result<()> {
        let mut conn = self.pool.get()?;
        conn.batch_execute("PRAGMA journal_mode = WAL;")?;
        conn.batch_execute(schema::CREATE_SCHEMA)?;
        Ok(())
    }

    /// Run a closure with a pooled connection on the blocking thread pool.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            f(&mut conn)
        })
        .await?
    }

    /// Trivial round trip used by the health check.
    pub async fn ping(&self) -> Result<()> {
        self.run(|conn| {
            let _: Probe = diesel::sql_query("SELECT 1 AS ok").get_result(conn)?;
            Ok(())
        })
        .await
    }

    pub fn categories(&self) -> CategoryRepository {
        CategoryRepository::new(self.clone())
    }

    pub fn variants(&self) -> VariantRepository {
        VariantRepository::new(self.clone())
    }

    pub fn documents(&self) -> DocumentRepository {
        DocumentRepository::new(self.clone())
    }

    pub fn sliders(&self) -> SliderRepository {
        SliderRepository::new(self.clone())
    }

    pub fn visitors(&self) -> VisitorRepository {
        VisitorRepository::new(self.clone())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("MP"), "%MP%");
        assert_eq!(like_pattern("50%_a\\b"), "%50\\%\\_a\\\\b%");
    }

    #[test]
    fn test_datetime_round_trip_is_fixed_width() {
        let now = Utc::now();
        let stored = format_datetime(&now);
        assert!(stored.ends_with('Z'));
        assert_eq!(stored.len(), "2024-01-01T00:00:00.000000Z".len());
        let parsed = parse_datetime(&stored);
        assert_eq!(parsed.timestamp_micros(), now.timestamp_micros());
    }

    #[tokio::test]
    async fn test_ping_and_unreachable_database() {
        let (_dir, ctx) = test_support::temp_db();
        assert!(ctx.ping().await.is_ok());

        let broken = DbContext::lazy(
            "/nonexistent-dir/definitely/missing.db",
            Duration::from_millis(200),
        );
        assert!(broken.ping().await.is_err());
    }
}
