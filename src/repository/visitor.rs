//! Visitor statistics (singleton row).

use chrono::Utc;
use diesel::prelude::*;
use diesel::sql_types::Text;

use super::schema::visitor_stats;
use super::{format_datetime, parse_datetime_opt, DbContext, Result};
use crate::models::VisitorStat;

const STATS_ROW_ID: i32 = 1;

#[derive(Clone)]
pub struct VisitorRepository {
    db: DbContext,
}

impl VisitorRepository {
    pub(super) fn new(db: DbContext) -> Self {
        Self { db }
    }

    /// Current totals; zero before the first visit.
    pub async fn get(&self) -> Result<VisitorStat> {
        self.db
            .run(|conn| {
                let row = visitor_stats::table
                    .find(STATS_ROW_ID)
                    .select((visitor_stats::total_visits, visitor_stats::last_visit))
                    .first::<(i64, Option<String>)>(conn)
                    .optional()?;
                Ok(row
                    .map(|(total, last)| VisitorStat {
                        total_visits: total.max(0) as u64,
                        last_visit: parse_datetime_opt(last),
                    })
                    .unwrap_or_default())
            })
            .await
    }

    /// Count one visit, creating the row on first use.
    pub async fn record_visit(&self) -> Result<()> {
        self.db
            .run(|conn| {
                diesel::sql_query(
                    "INSERT INTO visitor_stats (id, total_visits, last_visit) VALUES (1, 1, ?)
                     ON CONFLICT(id) DO UPDATE SET
                         total_visits = total_visits + 1,
                         last_visit = excluded.last_visit",
                )
                .bind::<Text, _>(format_datetime(&Utc::now()))
                .execute(conn)?;
                Ok(())
            })
            .await
    }
}
