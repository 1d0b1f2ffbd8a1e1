use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, FromRow)]
pub struct StatsRow {
    pub total: i64,
    pub checked_in: i64,
}

/// Check-in progress for one event.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total: i64,
    pub checked_in: i64,
    pub remaining: i64,
    pub check_in_percentage: i64,
}

impl From<StatsRow> for StatsResponse {
    fn from(row: StatsRow) -> Self {
        let remaining = (row.total - row.checked_in).max(0);
        let check_in_percentage = if row.total > 0 {
            ((row.checked_in as f64 / row.total as f64) * 100.0).round() as i64
        } else {
            0
        };

        Self {
            total: row.total,
            checked_in: row.checked_in,
            remaining,
            check_in_percentage,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EventIdQuery {
    pub event_id: Option<i64>,
}
