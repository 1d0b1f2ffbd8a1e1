use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database row for the participants table.
#[derive(Debug, Clone, FromRow)]
pub struct ParticipantRow {
    pub id: i64,
    pub event_id: i64,
    pub participant_id: Option<String>,
    pub start_time: Option<String>,
    pub bib_no: String,
    pub category: Option<String>,
    pub age_group: Option<String>,
    pub id_card_passport: Option<String>,
    pub last_name: String,
    pub first_name: String,
    pub tshirt_size: Option<String>,
    pub birthday_year: Option<i32>,
    pub nationality: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub blood_type: Option<String>,
    pub medical_information: Option<String>,
    pub medicines_using: Option<String>,
    pub parent_full_name: Option<String>,
    pub parent_date_of_birth: Option<String>,
    pub parent_email: Option<String>,
    pub parent_id_card_passport: Option<String>,
    pub parent_relationship: Option<String>,
    pub full_name: Option<String>,
    pub name_on_bib: Option<String>,
    pub checkin_at: Option<DateTime<Utc>>,
    pub checkin_by: Option<String>,
    pub note: Option<String>,
    pub signature_url: Option<String>,
    pub uploaded_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// API response for a single participant.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantResponse {
    pub id: i64,
    pub event_id: i64,
    pub participant_id: Option<String>,
    pub start_time: Option<String>,
    pub bib_no: String,
    pub category: Option<String>,
    pub age_group: Option<String>,
    pub id_card_passport: Option<String>,
    pub last_name: String,
    pub first_name: String,
    pub full_name: Option<String>,
    pub name_on_bib: Option<String>,
    pub tshirt_size: Option<String>,
    pub birthday_year: Option<i32>,
    pub nationality: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub blood_type: Option<String>,
    pub medical_information: Option<String>,
    pub medicines_using: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guardian: Option<Guardian>,
    pub checked_in: bool,
    pub checkin_at: Option<DateTime<Utc>>,
    pub checkin_by: Option<String>,
    pub note: Option<String>,
    pub signature_url: Option<String>,
    pub uploaded_image_url: Option<String>,
}

/// Parent/guardian details, present for minors registered with a guardian.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Guardian {
    pub full_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub email: Option<String>,
    pub id_card_passport: Option<String>,
    pub relationship: Option<String>,
}

impl From<ParticipantRow> for ParticipantResponse {
    fn from(row: ParticipantRow) -> Self {
        let guardian = if row.parent_full_name.is_some()
            || row.parent_date_of_birth.is_some()
            || row.parent_email.is_some()
            || row.parent_id_card_passport.is_some()
            || row.parent_relationship.is_some()
        {
            Some(Guardian {
                full_name: row.parent_full_name,
                date_of_birth: row.parent_date_of_birth,
                email: row.parent_email,
                id_card_passport: row.parent_id_card_passport,
                relationship: row.parent_relationship,
            })
        } else {
            None
        };

        Self {
            id: row.id,
            event_id: row.event_id,
            participant_id: row.participant_id,
            start_time: row.start_time,
            bib_no: row.bib_no,
            category: row.category,
            age_group: row.age_group,
            id_card_passport: row.id_card_passport,
            last_name: row.last_name,
            first_name: row.first_name,
            full_name: row.full_name,
            name_on_bib: row.name_on_bib,
            tshirt_size: row.tshirt_size,
            birthday_year: row.birthday_year,
            nationality: row.nationality,
            phone: row.phone,
            email: row.email,
            emergency_contact_name: row.emergency_contact_name,
            emergency_contact_phone: row.emergency_contact_phone,
            blood_type: row.blood_type,
            medical_information: row.medical_information,
            medicines_using: row.medicines_using,
            guardian,
            checked_in: row.checkin_at.is_some(),
            checkin_at: row.checkin_at,
            checkin_by: row.checkin_by,
            note: row.note,
            signature_url: row.signature_url,
            uploaded_image_url: row.uploaded_image_url,
        }
    }
}

/// Participant fields accepted on creation, from a roster row or the
/// manual registration form. Empty strings are normalized to `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewParticipant {
    pub participant_id: Option<String>,
    pub start_time: Option<String>,
    pub bib_no: String,
    pub category: Option<String>,
    pub age_group: Option<String>,
    pub id_card_passport: Option<String>,
    pub last_name: String,
    pub first_name: String,
    pub tshirt_size: Option<String>,
    pub birthday_year: Option<i32>,
    pub nationality: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub blood_type: Option<String>,
    pub medical_information: Option<String>,
    pub medicines_using: Option<String>,
    pub parent_full_name: Option<String>,
    pub parent_date_of_birth: Option<String>,
    pub parent_email: Option<String>,
    pub parent_id_card_passport: Option<String>,
    pub parent_relationship: Option<String>,
    pub full_name: Option<String>,
    pub name_on_bib: Option<String>,
    pub note: Option<String>,
}

impl NewParticipant {
    /// Fill derived names: full name from first + last, name on bib from full name.
    pub fn fill_derived_names(&mut self) {
        if self.full_name.is_none() {
            let joined = format!("{} {}", self.first_name, self.last_name)
                .trim()
                .to_string();
            if !joined.is_empty() {
                self.full_name = Some(joined);
            }
        }
        if self.name_on_bib.is_none() {
            self.name_on_bib = self.full_name.clone();
        }
    }
}

/// `Some(trimmed)` for non-blank input.
pub fn non_blank(value: impl AsRef<str>) -> Option<String> {
    let trimmed = value.as_ref().trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Query string for GET /api/participants/search.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub event_id: Option<i64>,
    pub q: Option<String>,
}

/// Query string for GET /api/participants/:id.
#[derive(Debug, Deserialize)]
pub struct ParticipantLookupQuery {
    pub event_id: Option<i64>,
}

/// Response for POST /api/participants.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateParticipantResponse {
    pub participant_id: i64,
    pub bib_no: String,
    pub checked_in: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_names_fall_back_to_first_and_last() {
        let mut p = NewParticipant {
            first_name: "Ana".to_string(),
            last_name: "Lima".to_string(),
            ..Default::default()
        };
        p.fill_derived_names();
        assert_eq!(p.full_name.as_deref(), Some("Ana Lima"));
        assert_eq!(p.name_on_bib.as_deref(), Some("Ana Lima"));
    }

    #[test]
    fn explicit_names_are_kept() {
        let mut p = NewParticipant {
            first_name: "Ana".to_string(),
            last_name: "Lima".to_string(),
            full_name: Some("Ana Maria Lima".to_string()),
            name_on_bib: Some("ANA".to_string()),
            ..Default::default()
        };
        p.fill_derived_names();
        assert_eq!(p.full_name.as_deref(), Some("Ana Maria Lima"));
        assert_eq!(p.name_on_bib.as_deref(), Some("ANA"));
    }

    #[test]
    fn blank_names_leave_full_name_unset() {
        let mut p = NewParticipant::default();
        p.fill_derived_names();
        assert!(p.full_name.is_none());
        assert!(p.name_on_bib.is_none());
    }

    #[test]
    fn non_blank_trims() {
        assert_eq!(non_blank("  x "), Some("x".to_string()));
        assert_eq!(non_blank("   "), None);
    }
}
