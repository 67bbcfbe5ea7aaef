use chrono::{DateTime, Utc};
use serde::Serialize;

/// Running count of unique-session visits.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VisitorStat {
    pub total_visits: u64,
    pub last_visit: Option<DateTime<Utc>>,
}
