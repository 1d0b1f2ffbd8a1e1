use axum::{
    extract::{Extension, State},
    http::StatusCode,
};
use sqlx::PgPool;

use crate::auth::AuthContext;
use crate::db;
use crate::error::AppError;
use crate::extractors::{Json, MultipartForm, Path, Query};
use crate::metrics;
use crate::models::event::{
    dates_out_of_order, parse_event_date, CreateEventResponse, EventResponse, ListEventsQuery,
    NewEvent, UpdateEventRequest,
};
use crate::roster::{parse_roster, RosterImport};

use super::DataResponse;

/// GET /api/events
/// List events, newest first.
pub async fn list_events(
    State(pool): State<PgPool>,
    Query(query): Query<ListEventsQuery>,
) -> Result<Json<DataResponse<Vec<EventResponse>>>, AppError> {
    let events = db::list_events(&pool, query.include_archived).await?;

    Ok(Json(DataResponse {
        data: events.into_iter().map(EventResponse::from).collect(),
    }))
}

/// GET /api/events/:id
/// Single event with participant count.
pub async fn get_event(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<Json<DataResponse<EventResponse>>, AppError> {
    let event = db::get_event(&pool, id)
        .await?
        .ok_or(AppError::EventNotFound { id })?;

    Ok(Json(DataResponse { data: event.into() }))
}

fn new_event_from_form(form: &MultipartForm) -> Result<NewEvent, AppError> {
    let (Some(event_name), Some(start_raw)) =
        (form.text("event_name"), form.text("event_start_date"))
    else {
        return Err(AppError::validation(
            "Event name and start date are required",
        ));
    };

    let event_start_date = parse_event_date(&start_raw)
        .ok_or_else(|| AppError::validation("event_start_date must be a YYYY-MM-DD date"))?;
    let event_end_date = match form.text("event_end_date") {
        Some(raw) => Some(
            parse_event_date(&raw)
                .ok_or_else(|| AppError::validation("event_end_date must be a YYYY-MM-DD date"))?,
        ),
        None => None,
    };

    if dates_out_of_order(event_start_date, event_end_date) {
        return Err(AppError::validation("End date cannot be before start date"));
    }

    Ok(NewEvent {
        event_name,
        event_start_date,
        event_end_date,
        location: form.text("location"),
        description: form.text("description"),
    })
}

/// POST /api/events
/// Create an event, optionally importing a roster file (`participants_file`)
/// in the same transaction.
pub async fn create_event(
    State(pool): State<PgPool>,
    Extension(auth): Extension<AuthContext>,
    form: MultipartForm,
) -> Result<(StatusCode, Json<DataResponse<CreateEventResponse>>), AppError> {
    let new_event = new_event_from_form(&form)?;

    let roster = match form.file("participants_file") {
        Some(file) => parse_roster(file.file_name.as_deref(), &file.bytes)?,
        None => RosterImport::default(),
    };

    let mut tx = pool.begin().await?;
    let event_id = db::insert_event(&mut *tx, &new_event, auth.user_id).await?;
    for participant in &roster.participants {
        db::insert_participant(&mut *tx, event_id, participant).await?;
    }
    tx.commit().await?;

    let participant_count = roster.participants.len();
    if participant_count > 0 {
        metrics::record_participants_created("roster", participant_count);
    }
    if !roster.errors.is_empty() {
        metrics::record_roster_errors(roster.errors.len());
        tracing::warn!(
            "Event {} roster import skipped {} rows",
            event_id,
            roster.errors.len()
        );
    }

    tracing::info!(
        "Event {} '{}' created by {} with {} participants",
        event_id,
        new_event.event_name,
        auth.user_name,
        participant_count
    );

    let message = if participant_count > 0 {
        format!(
            "Event created successfully with {} participants",
            participant_count
        )
    } else {
        "Event created successfully".to_string()
    };

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: CreateEventResponse {
                event_id,
                participant_count,
                participant_errors: roster.errors,
                message,
            },
        }),
    ))
}

/// PUT /api/events/:id
/// Update event details or status.
pub async fn update_event(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateEventRequest>,
) -> Result<Json<DataResponse<EventResponse>>, AppError> {
    let name_present = req
        .event_name
        .as_deref()
        .is_some_and(|n| !n.trim().is_empty());
    let Some(start) = req.event_start_date.filter(|_| name_present) else {
        return Err(AppError::validation(
            "Event name and start date are required",
        ));
    };

    let existing = db::get_event(&pool, id)
        .await?
        .ok_or(AppError::EventNotFound { id })?;

    let end = req.event_end_date.or(existing.event_end_date);
    if dates_out_of_order(start, end) {
        return Err(AppError::validation("End date cannot be before start date"));
    }

    if !db::update_event(&pool, id, &req).await? {
        return Err(AppError::EventNotFound { id });
    }

    let event = db::get_event(&pool, id)
        .await?
        .ok_or(AppError::EventNotFound { id })?;

    Ok(Json(DataResponse { data: event.into() }))
}

/// DELETE /api/events/:id
/// Archive an event. Participants are kept.
pub async fn archive_event(
    State(pool): State<PgPool>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if !db::archive_event(&pool, id).await? {
        return Err(AppError::EventNotFound { id });
    }

    tracing::info!("Event {} archived by {}", id, auth.user_name);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(fields: &[(&str, &str)]) -> MultipartForm {
        let mut form = MultipartForm::default();
        for (name, value) in fields {
            form.insert_text(*name, *value);
        }
        form
    }

    #[test]
    fn event_form_requires_name_and_start() {
        let err = new_event_from_form(&form(&[("event_name", "City Run")])).unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn event_form_rejects_reversed_dates() {
        let err = new_event_from_form(&form(&[
            ("event_name", "City Run"),
            ("event_start_date", "2025-05-10"),
            ("event_end_date", "2025-05-09"),
        ]))
        .unwrap_err();
        assert_eq!(err.to_string(), "End date cannot be before start date");
    }

    #[test]
    fn event_form_collects_optional_fields() {
        let event = new_event_from_form(&form(&[
            ("event_name", " City Run "),
            ("event_start_date", "2025-05-10"),
            ("location", "Harbour"),
        ]))
        .unwrap();
        assert_eq!(event.event_name, "City Run");
        assert_eq!(event.location.as_deref(), Some("Harbour"));
        assert!(event.event_end_date.is_none());
        assert!(event.description.is_none());
    }
}
