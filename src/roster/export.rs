use rust_xlsxwriter::{Format, Workbook};
use serde::Deserialize;

use super::RosterError;
use crate::models::participant::ParticipantRow;

/// Column order of exported files. Names match roster import headers so an
/// export can be re-imported into a new event.
pub const EXPORT_COLUMNS: &[&str] = &[
    "id",
    "event_id",
    "participant_id",
    "bib_no",
    "first_name",
    "last_name",
    "full_name",
    "name_on_bib",
    "category",
    "age_group",
    "start_time",
    "id_card_passport",
    "tshirt_size",
    "birthday_year",
    "nationality",
    "phone",
    "email",
    "emergency_contact_name",
    "emergency_contact_phone",
    "blood_type",
    "medical_information",
    "medicines_using",
    "parent_full_name",
    "parent_date_of_birth",
    "parent_email",
    "parent_id_card_passport",
    "parent_relationship",
    "checkin_at",
    "checkin_by",
    "note",
    "signature_url",
    "uploaded_image_url",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    #[serde(alias = "xlsx")]
    Excel,
}

impl ExportFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Excel => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Excel => "xlsx",
        }
    }
}

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// Cell values for one participant, in `EXPORT_COLUMNS` order.
fn row_values(p: &ParticipantRow) -> Vec<String> {
    vec![
        p.id.to_string(),
        p.event_id.to_string(),
        opt(&p.participant_id),
        p.bib_no.clone(),
        p.first_name.clone(),
        p.last_name.clone(),
        opt(&p.full_name),
        opt(&p.name_on_bib),
        opt(&p.category),
        opt(&p.age_group),
        opt(&p.start_time),
        opt(&p.id_card_passport),
        opt(&p.tshirt_size),
        p.birthday_year.map(|y| y.to_string()).unwrap_or_default(),
        opt(&p.nationality),
        opt(&p.phone),
        opt(&p.email),
        opt(&p.emergency_contact_name),
        opt(&p.emergency_contact_phone),
        opt(&p.blood_type),
        opt(&p.medical_information),
        opt(&p.medicines_using),
        opt(&p.parent_full_name),
        opt(&p.parent_date_of_birth),
        opt(&p.parent_email),
        opt(&p.parent_id_card_passport),
        opt(&p.parent_relationship),
        p.checkin_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
        opt(&p.checkin_by),
        opt(&p.note),
        opt(&p.signature_url),
        opt(&p.uploaded_image_url),
    ]
}

pub fn export_csv(participants: &[ParticipantRow]) -> Result<Vec<u8>, RosterError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_COLUMNS)?;
    for p in participants {
        writer.write_record(row_values(p))?;
    }
    writer
        .into_inner()
        .map_err(|e| RosterError::Export(e.to_string()))
}

pub fn export_xlsx(participants: &[ParticipantRow]) -> Result<Vec<u8>, RosterError> {
    let xlsx_err = |e: rust_xlsxwriter::XlsxError| RosterError::Export(e.to_string());

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Participants").map_err(xlsx_err)?;

    for (col, name) in EXPORT_COLUMNS.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *name, &header_format)
            .map_err(xlsx_err)?;
    }

    for (idx, p) in participants.iter().enumerate() {
        let row = idx as u32 + 1;
        for (col, value) in row_values(p).into_iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            sheet
                .write_string(row, col as u16, value)
                .map_err(xlsx_err)?;
        }
    }

    workbook.save_to_buffer().map_err(xlsx_err)
}
