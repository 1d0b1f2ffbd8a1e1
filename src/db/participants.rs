use sqlx::{PgExecutor, PgPool};

use crate::error::AppError;
use crate::models::checkin::CheckInRecord;
use crate::models::participant::{NewParticipant, ParticipantRow};
use crate::models::stats::StatsRow;

const PARTICIPANT_COLUMNS: &str = r#"
    id, event_id, participant_id, start_time, bib_no, category, age_group,
    id_card_passport, last_name, first_name, tshirt_size, birthday_year, nationality,
    phone, email, emergency_contact_name, emergency_contact_phone,
    blood_type, medical_information, medicines_using,
    parent_full_name, parent_date_of_birth, parent_email, parent_id_card_passport,
    parent_relationship, full_name, name_on_bib,
    checkin_at, checkin_by, note, signature_url, uploaded_image_url,
    created_at, updated_at
"#;

/// Escape LIKE metacharacters and wrap in `%` for a substring match.
pub fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// All participants of an event ordered by bib number.
pub async fn list_participants(
    pool: &PgPool,
    event_id: i64,
) -> Result<Vec<ParticipantRow>, AppError> {
    let sql = format!(
        "SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE event_id = $1 ORDER BY bib_no ASC"
    );
    let rows = sqlx::query_as::<_, ParticipantRow>(&sql)
        .bind(event_id)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Expressions matched by participant search.
const SEARCHABLE: &[&str] = &[
    "bib_no",
    "first_name",
    "last_name",
    "phone",
    "email",
    "(first_name || ' ' || last_name)",
];

fn search_filter() -> String {
    SEARCHABLE
        .iter()
        .map(|expr| format!("{expr} ILIKE $2"))
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// Case-insensitive substring search over bib, first name, last name,
/// "first last", phone and email.
pub async fn search_participants(
    pool: &PgPool,
    event_id: i64,
    query: &str,
) -> Result<Vec<ParticipantRow>, AppError> {
    let sql = format!(
        r#"
        SELECT {PARTICIPANT_COLUMNS}
        FROM participants
        WHERE event_id = $1 AND ({})
        ORDER BY bib_no ASC
        "#,
        search_filter()
    );
    let rows = sqlx::query_as::<_, ParticipantRow>(&sql)
        .bind(event_id)
        .bind(like_pattern(query))
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

pub async fn get_participant(pool: &PgPool, id: i64) -> Result<Option<ParticipantRow>, AppError> {
    let sql = format!("SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE id = $1");
    let row = sqlx::query_as::<_, ParticipantRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Like `get_participant`, but only if the participant belongs to `event_id`.
pub async fn get_event_participant(
    pool: &PgPool,
    event_id: i64,
    id: i64,
) -> Result<Option<ParticipantRow>, AppError> {
    let sql =
        format!("SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE event_id = $1 AND id = $2");
    let row = sqlx::query_as::<_, ParticipantRow>(&sql)
        .bind(event_id)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn count_participants(pool: &PgPool, event_id: i64) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM participants WHERE event_id = $1")
        .bind(event_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Insert one participant. Accepts a pool or a transaction.
pub async fn insert_participant<'e, E>(
    executor: E,
    event_id: i64,
    p: &NewParticipant,
) -> Result<ParticipantRow, AppError>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        r#"
        INSERT INTO participants (
            event_id, participant_id, start_time, bib_no, category, age_group,
            id_card_passport, last_name, first_name, tshirt_size, birthday_year, nationality,
            phone, email, emergency_contact_name, emergency_contact_phone,
            blood_type, medical_information, medicines_using,
            parent_full_name, parent_date_of_birth, parent_email, parent_id_card_passport,
            parent_relationship, full_name, name_on_bib, note
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27)
        RETURNING {PARTICIPANT_COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, ParticipantRow>(&sql)
        .bind(event_id)
        .bind(&p.participant_id)
        .bind(&p.start_time)
        .bind(&p.bib_no)
        .bind(&p.category)
        .bind(&p.age_group)
        .bind(&p.id_card_passport)
        .bind(&p.last_name)
        .bind(&p.first_name)
        .bind(&p.tshirt_size)
        .bind(p.birthday_year)
        .bind(&p.nationality)
        .bind(&p.phone)
        .bind(&p.email)
        .bind(&p.emergency_contact_name)
        .bind(&p.emergency_contact_phone)
        .bind(&p.blood_type)
        .bind(&p.medical_information)
        .bind(&p.medicines_using)
        .bind(&p.parent_full_name)
        .bind(&p.parent_date_of_birth)
        .bind(&p.parent_email)
        .bind(&p.parent_id_card_passport)
        .bind(&p.parent_relationship)
        .bind(&p.full_name)
        .bind(&p.name_on_bib)
        .bind(&p.note)
        .fetch_one(executor)
        .await?;

    Ok(row)
}

/// Record a check-in. Returns `None` if the participant does not exist or
/// was checked in concurrently.
pub async fn mark_checked_in(
    pool: &PgPool,
    id: i64,
    record: &CheckInRecord<'_>,
) -> Result<Option<ParticipantRow>, AppError> {
    let sql = format!(
        r#"
        UPDATE participants SET
            checkin_at = now(),
            checkin_by = $2,
            note = COALESCE($3, note),
            uploaded_image_url = $4,
            signature_url = $5,
            updated_at = now()
        WHERE id = $1 AND checkin_at IS NULL
        RETURNING {PARTICIPANT_COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, ParticipantRow>(&sql)
        .bind(id)
        .bind(record.checkin_by)
        .bind(record.note)
        .bind(record.photo_key)
        .bind(record.signature_key)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Total and checked-in counts for an event.
pub async fn event_stats(pool: &PgPool, event_id: i64) -> Result<StatsRow, AppError> {
    let row = sqlx::query_as::<_, StatsRow>(
        r#"
        SELECT COUNT(*) AS total, COUNT(checkin_at) AS checked_in
        FROM participants
        WHERE event_id = $1
        "#,
    )
    .bind(event_id)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::{like_pattern, search_filter};

    #[test]
    fn search_covers_names_contact_and_bib() {
        let filter = search_filter();
        assert!(filter.starts_with("bib_no ILIKE $2 OR first_name ILIKE $2"));
        assert!(filter.contains("(first_name || ' ' || last_name) ILIKE $2"));
        assert!(filter.contains("email ILIKE $2"));
        assert!(!filter.contains("id_card_passport"));
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("ana"), "%ana%");
        assert_eq!(like_pattern(" 10%_x "), "%10\\%\\_x%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
