use sqlx::{PgExecutor, PgPool};

use crate::error::AppError;
use crate::models::event::{EventRow, EventStatus, NewEvent, UpdateEventRequest};

const EVENT_SELECT: &str = r#"
    SELECT e.id, e.event_name, e.event_start_date, e.event_end_date,
           e.location, e.description, e.status, e.created_by,
           u.user_name AS created_by_name,
           (SELECT COUNT(*) FROM participants p WHERE p.event_id = e.id) AS participant_count,
           e.created_at, e.updated_at
    FROM events e
    LEFT JOIN users u ON u.id = e.created_by
"#;

/// List events, newest start date first. Archived events only when asked for.
pub async fn list_events(pool: &PgPool, include_archived: bool) -> Result<Vec<EventRow>, AppError> {
    let sql = format!(
        "{EVENT_SELECT} WHERE ($1 OR e.status = 'active') ORDER BY e.event_start_date DESC, e.id DESC"
    );
    let rows = sqlx::query_as::<_, EventRow>(&sql)
        .bind(include_archived)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

pub async fn get_event(pool: &PgPool, id: i64) -> Result<Option<EventRow>, AppError> {
    let sql = format!("{EVENT_SELECT} WHERE e.id = $1");
    let row = sqlx::query_as::<_, EventRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Insert an event and return its id. Accepts a pool or a transaction.
pub async fn insert_event<'e, E>(
    executor: E,
    event: &NewEvent,
    created_by: i64,
) -> Result<i64, AppError>
where
    E: PgExecutor<'e>,
{
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO events (event_name, event_start_date, event_end_date, location, description, created_by)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(&event.event_name)
    .bind(event.event_start_date)
    .bind(event.event_end_date)
    .bind(&event.location)
    .bind(&event.description)
    .bind(created_by)
    .fetch_one(executor)
    .await?;

    Ok(id)
}

/// Update an event. Fields left as `None` keep their current value.
/// Returns false if the event does not exist.
pub async fn update_event(
    pool: &PgPool,
    id: i64,
    req: &UpdateEventRequest,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE events SET
            event_name = COALESCE($2, event_name),
            event_start_date = COALESCE($3, event_start_date),
            event_end_date = COALESCE($4, event_end_date),
            location = COALESCE($5, location),
            description = COALESCE($6, description),
            status = COALESCE($7, status),
            updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(req.event_name.as_deref().map(str::trim))
    .bind(req.event_start_date)
    .bind(req.event_end_date)
    .bind(req.location.as_deref())
    .bind(req.description.as_deref())
    .bind(req.status)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Soft delete. Returns false if the event does not exist.
pub async fn archive_event(pool: &PgPool, id: i64) -> Result<bool, AppError> {
    let result = sqlx::query("UPDATE events SET status = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(EventStatus::Archived)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
