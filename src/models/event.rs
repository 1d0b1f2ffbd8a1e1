use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Maps to the `event_status` postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "event_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Active,
    Archived,
}

/// Event row joined with creator name and participant count.
#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    pub id: i64,
    pub event_name: String,
    pub event_start_date: NaiveDate,
    pub event_end_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub status: EventStatus,
    pub created_by: Option<i64>,
    pub created_by_name: Option<String>,
    pub participant_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: i64,
    pub event_name: String,
    pub event_start_date: NaiveDate,
    pub event_end_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub status: EventStatus,
    pub created_by_name: Option<String>,
    pub participant_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EventRow> for EventResponse {
    fn from(row: EventRow) -> Self {
        Self {
            id: row.id,
            event_name: row.event_name,
            event_start_date: row.event_start_date,
            event_end_date: row.event_end_date,
            location: row.location,
            description: row.description,
            status: row.status,
            created_by_name: row.created_by_name,
            participant_count: row.participant_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Validated fields for a new event, assembled from the multipart form.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub event_name: String,
    pub event_start_date: NaiveDate,
    pub event_end_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub description: Option<String>,
}

/// Request body for PUT /api/events/:id. The `/manage` form posts snake_case keys.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    #[serde(alias = "event_name")]
    pub event_name: Option<String>,
    #[serde(alias = "event_start_date")]
    pub event_start_date: Option<NaiveDate>,
    #[serde(alias = "event_end_date")]
    pub event_end_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub status: Option<EventStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEventsQuery {
    #[serde(default)]
    pub include_archived: bool,
}

/// Response for POST /api/events.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventResponse {
    pub event_id: i64,
    pub participant_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub participant_errors: Vec<String>,
    pub message: String,
}

/// Parse a calendar date as sent by HTML date inputs. Full timestamps are truncated.
pub fn parse_event_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(value)
            .ok()
            .map(|dt| dt.date_naive())
    })
}

/// Both dates present and the end precedes the start.
pub fn dates_out_of_order(start: NaiveDate, end: Option<NaiveDate>) -> bool {
    matches!(end, Some(end) if end < start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_rfc3339_dates() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert_eq!(parse_event_date("2025-03-09"), Some(expected));
        assert_eq!(parse_event_date(" 2025-03-09 "), Some(expected));
        assert_eq!(parse_event_date("2025-03-09T06:30:00Z"), Some(expected));
        assert_eq!(parse_event_date("09/03/2025"), None);
    }

    #[test]
    fn end_before_start_is_detected() {
        let start = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert!(dates_out_of_order(start, NaiveDate::from_ymd_opt(2025, 3, 8)));
        assert!(!dates_out_of_order(start, Some(start)));
        assert!(!dates_out_of_order(start, None));
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&EventStatus::Archived).unwrap(),
            "\"archived\""
        );
    }

    #[test]
    fn update_request_accepts_snake_and_camel_case() {
        let snake: UpdateEventRequest = serde_json::from_str(
            r#"{"event_name":"Run","event_start_date":"2025-05-10","event_end_date":"2025-05-11"}"#,
        )
        .unwrap();
        assert_eq!(snake.event_name.as_deref(), Some("Run"));
        assert_eq!(snake.event_start_date, NaiveDate::from_ymd_opt(2025, 5, 10));
        assert_eq!(snake.event_end_date, NaiveDate::from_ymd_opt(2025, 5, 11));

        let camel: UpdateEventRequest =
            serde_json::from_str(r#"{"eventName":"Run","eventStartDate":"2025-05-10"}"#).unwrap();
        assert_eq!(camel.event_name.as_deref(), Some("Run"));
        assert_eq!(camel.event_start_date, NaiveDate::from_ymd_opt(2025, 5, 10));
        assert!(camel.status.is_none());
    }
}
