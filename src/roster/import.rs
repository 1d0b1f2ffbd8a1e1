use std::collections::HashSet;
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};

use super::{detect_format, RosterError, RosterFormat};
use crate::models::participant::{non_blank, NewParticipant};

/// Participants accepted from a roster file plus per-row problems.
#[derive(Debug, Default)]
pub struct RosterImport {
    pub participants: Vec<NewParticipant>,
    pub errors: Vec<String>,
}

/// A roster row with its 1-based line/row number in the source file.
type Table = Vec<(usize, Vec<String>)>;

/// Parse an uploaded roster. The first non-blank row is the header.
pub fn parse_roster(file_name: Option<&str>, bytes: &[u8]) -> Result<RosterImport, RosterError> {
    let table = match detect_format(file_name, bytes) {
        RosterFormat::Csv => read_csv_table(bytes)?,
        RosterFormat::Spreadsheet => read_spreadsheet_table(bytes)?,
    };
    import_table(table)
}

fn read_csv_table(bytes: &[u8]) -> Result<Table, RosterError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let mut table = Vec::new();
    for (idx, record) in reader.byte_records().enumerate() {
        let record = record?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 1);
        let cells = record
            .iter()
            .map(|cell| String::from_utf8_lossy(cell).trim().to_string())
            .collect();
        table.push((line, cells));
    }
    Ok(table)
}

fn read_spreadsheet_table(bytes: &[u8]) -> Result<Table, RosterError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| RosterError::Spreadsheet(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(RosterError::Empty)?
        .map_err(|e| RosterError::Spreadsheet(e.to_string()))?;

    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let first_col = range.start().map(|(_, col)| col as usize).unwrap_or(0);

    let table = range
        .rows()
        .enumerate()
        .map(|(idx, row)| {
            // Keep column positions aligned with the sheet even when column A is empty
            let mut cells = vec![String::new(); first_col];
            cells.extend(row.iter().map(cell_to_string));
            (first_row + idx + 1, cells)
        })
        .collect();
    Ok(table)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        // Whole numbers (bib 101, birth year 1990) come back as floats
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string().trim().to_string(),
    }
}

/// Roster columns we know how to map onto participant fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    BibNo,
    LastName,
    FirstName,
    FullName,
    NameOnBib,
    Phone,
    Email,
    IdCardPassport,
    TshirtSize,
    BirthdayYear,
    Nationality,
    EmergencyContactName,
    EmergencyContactPhone,
    BloodType,
    MedicalInformation,
    MedicinesUsing,
    ParentFullName,
    ParentDateOfBirth,
    ParentEmail,
    ParentIdCardPassport,
    ParentRelationship,
    StartTime,
    ParticipantId,
    Category,
    AgeGroup,
}

impl Column {
    fn from_header(header: &str) -> Option<Self> {
        let normalized = header.trim().to_lowercase();
        let column = match normalized.as_str() {
            "bib_no" | "bib" | "bib number" | "bib_number" => Column::BibNo,
            "last_name" | "lastname" | "surname" => Column::LastName,
            "first_name" | "firstname" | "given name" => Column::FirstName,
            "full_name" | "fullname" | "name" => Column::FullName,
            "name_on_bib" | "bib name" => Column::NameOnBib,
            "phone" | "phone_number" | "mobile" => Column::Phone,
            "email" | "email_address" => Column::Email,
            "id_card" | "id_card_passport" | "id" => Column::IdCardPassport,
            "tshirt_size" | "shirt_size" | "size" => Column::TshirtSize,
            "birthday_year" | "birth_year" | "year" => Column::BirthdayYear,
            "nationality" => Column::Nationality,
            "emergency_contact_name" | "emergency_name" => Column::EmergencyContactName,
            "emergency_contact_phone" | "emergency_phone" => Column::EmergencyContactPhone,
            "blood_type" => Column::BloodType,
            "medical_information" | "medical_info" => Column::MedicalInformation,
            "medicines_using" | "medications" => Column::MedicinesUsing,
            "parent_full_name" | "parent_name" => Column::ParentFullName,
            "parent_date_of_birth" => Column::ParentDateOfBirth,
            "parent_email" => Column::ParentEmail,
            "parent_id_card_passport" | "parent_id" => Column::ParentIdCardPassport,
            "parent_relationship" | "relationship" => Column::ParentRelationship,
            "start_time" => Column::StartTime,
            "participant_id" => Column::ParticipantId,
            "category" => Column::Category,
            "age_group" => Column::AgeGroup,
            _ => return None,
        };
        Some(column)
    }
}

fn import_table(table: Table) -> Result<RosterImport, RosterError> {
    let mut rows = table
        .into_iter()
        .filter(|(_, cells)| cells.iter().any(|c| !c.trim().is_empty()));

    let (header_line, header) = rows.next().ok_or(RosterError::Empty)?;
    let columns: Vec<(usize, Column)> = header
        .iter()
        .enumerate()
        .filter_map(|(idx, h)| Column::from_header(h).map(|c| (idx, c)))
        .collect();

    if columns.is_empty() {
        return Err(RosterError::NoRecognizedColumns);
    }

    let mut import = RosterImport::default();
    let mut seen_bibs: HashSet<String> = HashSet::new();

    for (line, cells) in rows {
        // Reported rows count from the header, which is row 1
        let row_no = line + 1 - header_line;
        let mut participant = NewParticipant::default();

        for &(idx, column) in &columns {
            let value = cells.get(idx).map(|s| s.trim()).unwrap_or("");
            if let Err(message) = apply_column(&mut participant, column, value) {
                import.errors.push(format!("Row {}: {}", row_no, message));
            }
        }

        if participant.bib_no.is_empty() {
            let mut n = import.participants.len() + 1;
            while seen_bibs.contains(&format!("BIB-{}", n)) {
                n += 1;
            }
            participant.bib_no = format!("BIB-{}", n);
        }

        if !seen_bibs.insert(participant.bib_no.clone()) {
            import.errors.push(format!(
                "Row {}: duplicate bib number {}",
                row_no, participant.bib_no
            ));
            continue;
        }

        if participant.first_name.is_empty() {
            participant.first_name = "Unknown".to_string();
        }
        if participant.last_name.is_empty() {
            participant.last_name = "Unknown".to_string();
        }
        participant.fill_derived_names();

        import.participants.push(participant);
    }

    Ok(import)
}

fn apply_column(p: &mut NewParticipant, column: Column, value: &str) -> Result<(), String> {
    let v = non_blank(value);
    match column {
        Column::BibNo => p.bib_no = value.to_string(),
        Column::LastName => p.last_name = value.to_string(),
        Column::FirstName => p.first_name = value.to_string(),
        Column::FullName => p.full_name = v,
        Column::NameOnBib => p.name_on_bib = v,
        Column::Phone => p.phone = v,
        Column::Email => p.email = v,
        Column::IdCardPassport => p.id_card_passport = v,
        Column::TshirtSize => p.tshirt_size = v,
        Column::BirthdayYear => {
            if let Some(raw) = v {
                match raw.parse::<i32>() {
                    Ok(year) => p.birthday_year = Some(year),
                    Err(_) => return Err(format!("invalid birth year '{}' ignored", raw)),
                }
            }
        }
        Column::Nationality => p.nationality = v,
        Column::EmergencyContactName => p.emergency_contact_name = v,
        Column::EmergencyContactPhone => p.emergency_contact_phone = v,
        Column::BloodType => p.blood_type = v,
        Column::MedicalInformation => p.medical_information = v,
        Column::MedicinesUsing => p.medicines_using = v,
        Column::ParentFullName => p.parent_full_name = v,
        Column::ParentDateOfBirth => p.parent_date_of_birth = v,
        Column::ParentEmail => p.parent_email = v,
        Column::ParentIdCardPassport => p.parent_id_card_passport = v,
        Column::ParentRelationship => p.parent_relationship = v,
        Column::StartTime => p.start_time = v,
        Column::ParticipantId => p.participant_id = v,
        Column::Category => p.category = v,
        Column::AgeGroup => p.age_group = v,
    }
    Ok(())
}
