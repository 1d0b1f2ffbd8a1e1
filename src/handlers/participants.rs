use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use sqlx::PgPool;

use crate::auth::AuthContext;
use crate::blob::BlobStore;
use crate::db;
use crate::error::AppError;
use crate::extractors::{Json, MultipartForm, Path, Query};
use crate::metrics;
use crate::models::participant::{
    CreateParticipantResponse, NewParticipant, ParticipantLookupQuery, ParticipantResponse,
    ParticipantRow, SearchQuery,
};
use crate::roster::{export_csv, export_xlsx, ExportFormat};

use super::checkin::{store_and_check_in, CheckInEvidence};
use super::DataResponse;

/// Shorter queries list the whole event instead of searching.
const MIN_SEARCH_CHARS: usize = 2;

/// GET /api/participants/search?event_id=&q=
/// Search an event's roster by bib, first or last name, phone or email.
pub async fn search_participants(
    State(pool): State<PgPool>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<DataResponse<Vec<ParticipantResponse>>>, AppError> {
    let event_id = query
        .event_id
        .ok_or_else(|| AppError::validation("Event ID is required"))?;

    let q = query.q.as_deref().map(str::trim).unwrap_or_default();
    let rows = if q.chars().count() >= MIN_SEARCH_CHARS {
        db::search_participants(&pool, event_id, q).await?
    } else {
        db::list_participants(&pool, event_id).await?
    };

    Ok(Json(DataResponse {
        data: rows.into_iter().map(ParticipantResponse::from).collect(),
    }))
}

/// GET /api/participants/:id
/// Single participant, optionally scoped to an event.
pub async fn get_participant(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Query(query): Query<ParticipantLookupQuery>,
) -> Result<Json<DataResponse<ParticipantResponse>>, AppError> {
    let row = match query.event_id {
        Some(event_id) => db::get_event_participant(&pool, event_id, id).await?,
        None => db::get_participant(&pool, id).await?,
    };
    let row = row.ok_or(AppError::ParticipantNotFound { id })?;

    Ok(Json(DataResponse { data: row.into() }))
}

fn parse_event_id(form: &MultipartForm) -> Result<i64, AppError> {
    form.text("event_id")
        .ok_or_else(|| AppError::validation("Event ID is required"))?
        .parse()
        .map_err(|_| AppError::validation("Event ID must be a number"))
}

/// Participant fields from the manual registration form. `bib_no` may be
/// left empty for the caller to assign.
fn new_participant_from_form(form: &MultipartForm) -> Result<NewParticipant, AppError> {
    let birthday_year = match form.text("birthday_year") {
        Some(raw) => Some(
            raw.parse::<i32>()
                .map_err(|_| AppError::validation("birthday_year must be a number"))?,
        ),
        None => None,
    };

    let mut participant = NewParticipant {
        participant_id: form.text("participant_id"),
        start_time: form.text("start_time"),
        bib_no: form.text("bib_no").unwrap_or_default(),
        category: form.text("category"),
        age_group: form.text("age_group"),
        id_card_passport: form.text("id_card_passport"),
        last_name: form.text("last_name").unwrap_or_else(|| "Unknown".to_string()),
        first_name: form.text("first_name").unwrap_or_else(|| "Unknown".to_string()),
        tshirt_size: form.text("tshirt_size"),
        birthday_year,
        nationality: form.text("nationality"),
        phone: form.text("phone"),
        email: form.text("email"),
        emergency_contact_name: form.text("emergency_contact_name"),
        emergency_contact_phone: form.text("emergency_contact_phone"),
        blood_type: form.text("blood_type"),
        medical_information: form.text("medical_information"),
        medicines_using: form.text("medicines_using"),
        parent_full_name: form.text("parent_full_name"),
        parent_date_of_birth: form.text("parent_date_of_birth"),
        parent_email: form.text("parent_email"),
        parent_id_card_passport: form.text("parent_id_card_passport"),
        parent_relationship: form.text("parent_relationship"),
        full_name: form.text("full_name"),
        name_on_bib: form.text("name_on_bib"),
        note: Some(form.text("note").unwrap_or_else(|| "Manually created".to_string())),
    };
    participant.fill_derived_names();

    Ok(participant)
}

/// POST /api/participants
/// Register a walk-in participant. When both `photo` and `signature` data URIs
/// are sent, the participant is checked in straight away.
pub async fn create_participant(
    State(pool): State<PgPool>,
    State(blobs): State<Arc<dyn BlobStore>>,
    Extension(auth): Extension<AuthContext>,
    form: MultipartForm,
) -> Result<(StatusCode, Json<DataResponse<CreateParticipantResponse>>), AppError> {
    let event_id = parse_event_id(&form)?;
    let mut participant = new_participant_from_form(&form)?;

    let evidence = match (form.text("photo"), form.text("signature")) {
        (Some(photo), Some(signature)) => Some(CheckInEvidence::parse(&photo, &signature)?),
        _ => None,
    };

    if db::get_event(&pool, event_id).await?.is_none() {
        return Err(AppError::EventNotFound { id: event_id });
    }

    if participant.bib_no.is_empty() {
        let count = db::count_participants(&pool, event_id).await?;
        participant.bib_no = format!("BIB-{}", count + 1);
    }

    let row = db::insert_participant(&pool, event_id, &participant).await?;
    metrics::record_participants_created("manual", 1);
    tracing::info!(
        "Participant {} (bib {}) added to event {} by {}",
        row.id,
        row.bib_no,
        event_id,
        auth.user_name
    );

    // Registration stands even if the immediate check-in fails
    let mut checked_in = false;
    if let Some(evidence) = evidence {
        match store_and_check_in(
            &pool,
            blobs.as_ref(),
            &row,
            &evidence,
            &auth.user_name,
            Some("Manually created and checked in"),
        )
        .await
        {
            Ok(_) => {
                checked_in = true;
                metrics::record_checkin("registration");
            }
            Err(e) => {
                tracing::error!("Check-in for new participant {} failed: {}", row.id, e);
            }
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: CreateParticipantResponse {
                participant_id: row.id,
                bib_no: row.bib_no,
                checked_in,
            },
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub event_id: Option<i64>,
    #[serde(default)]
    pub format: ExportFormat,
}

/// An empty CSV export is an error. An empty workbook still carries the header row.
fn render_export(
    event_id: i64,
    format: ExportFormat,
    rows: &[ParticipantRow],
) -> Result<Vec<u8>, AppError> {
    match format {
        ExportFormat::Csv => {
            if rows.is_empty() {
                return Err(AppError::NoParticipants { event_id });
            }
            Ok(export_csv(rows)?)
        }
        ExportFormat::Excel => Ok(export_xlsx(rows)?),
    }
}

/// GET /api/participants/export?event_id=&format=csv|excel
/// Download an event's roster with check-in columns.
pub async fn export_participants(
    State(pool): State<PgPool>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let event_id = query
        .event_id
        .ok_or_else(|| AppError::validation("Event ID is required"))?;

    let rows = db::list_participants(&pool, event_id).await?;
    let body = render_export(event_id, query.format, &rows)?;

    tracing::info!(
        "Exported {} participants of event {} as {}",
        rows.len(),
        event_id,
        query.format.extension()
    );

    let disposition = format!(
        "attachment; filename=\"participants_event_{}.{}\"",
        event_id,
        query.format.extension()
    );

    Ok((
        [
            (header::CONTENT_TYPE, query.format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
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
    fn manual_participant_defaults() {
        let p = new_participant_from_form(&form(&[
            ("first_name", "Ana"),
            ("last_name", "Lima"),
            ("phone", "  "),
        ]))
        .unwrap();

        assert_eq!(p.bib_no, "");
        assert_eq!(p.full_name.as_deref(), Some("Ana Lima"));
        assert_eq!(p.name_on_bib.as_deref(), Some("Ana Lima"));
        assert_eq!(p.note.as_deref(), Some("Manually created"));
        assert!(p.phone.is_none());
    }

    #[test]
    fn manual_participant_rejects_bad_birth_year() {
        let err = new_participant_from_form(&form(&[("birthday_year", "nineteen")])).unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn event_id_must_be_numeric() {
        assert!(parse_event_id(&form(&[("event_id", "abc")])).is_err());
        assert!(parse_event_id(&form(&[])).is_err());
        assert_eq!(parse_event_id(&form(&[("event_id", " 12 ")])).unwrap(), 12);
    }

    #[test]
    fn empty_roster_exports_as_header_only_workbook() {
        let bytes = render_export(99, ExportFormat::Excel, &[]).unwrap();
        assert!(bytes.starts_with(b"PK"));

        let err = render_export(99, ExportFormat::Csv, &[]).unwrap_err();
        assert!(matches!(err, AppError::NoParticipants { event_id: 99 }));
    }

    #[test]
    fn export_query_accepts_excel_aliases() {
        let q: ExportQuery = serde_json::from_str(r#"{"event_id": 3, "format": "xlsx"}"#).unwrap();
        assert_eq!(q.format, ExportFormat::Excel);
        let q: ExportQuery = serde_json::from_str(r#"{"event_id": 3}"#).unwrap();
        assert_eq!(q.format, ExportFormat::Csv);
    }
}
