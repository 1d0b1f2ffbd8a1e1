//! Roster import (CSV / spreadsheet upload) and participant export.

pub mod export;
pub mod import;

pub use export::{export_csv, export_xlsx, ExportFormat, EXPORT_COLUMNS};
pub use import::{parse_roster, RosterImport};

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("Roster file is empty")]
    Empty,
    #[error("Roster header has no recognized columns (expected e.g. bib_no, first_name, last_name)")]
    NoRecognizedColumns,
    #[error("Could not read CSV roster: {0}")]
    Csv(#[from] csv::Error),
    #[error("Could not read spreadsheet roster: {0}")]
    Spreadsheet(String),
    #[error("Could not build export: {0}")]
    Export(String),
}

/// Input format of an uploaded roster file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterFormat {
    Csv,
    Spreadsheet,
}

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];

/// Pick a parser from the file name, falling back to content sniffing.
pub fn detect_format(file_name: Option<&str>, bytes: &[u8]) -> RosterFormat {
    if let Some(name) = file_name {
        let lower = name.to_ascii_lowercase();
        if [".xlsx", ".xlsm", ".xls", ".ods"]
            .iter()
            .any(|ext| lower.ends_with(ext))
        {
            return RosterFormat::Spreadsheet;
        }
        if lower.ends_with(".csv") || lower.ends_with(".txt") {
            return RosterFormat::Csv;
        }
    }

    if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) {
        RosterFormat::Spreadsheet
    } else {
        RosterFormat::Csv
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_wins_over_content() {
        assert_eq!(
            detect_format(Some("Runners.XLSX"), b"bib,name"),
            RosterFormat::Spreadsheet
        );
        assert_eq!(detect_format(Some("runners.csv"), ZIP_MAGIC), RosterFormat::Csv);
    }

    #[test]
    fn sniffs_zip_container_without_name() {
        assert_eq!(
            detect_format(None, b"PK\x03\x04rest"),
            RosterFormat::Spreadsheet
        );
        assert_eq!(detect_format(Some("upload"), b"bib_no\n1"), RosterFormat::Csv);
    }
}
