//! Reading attendance workbooks from disk and checking them before they are sent to the server.
//!
//! The server reads one sheet per Sunday and expects each sheet to be named with that Sunday's
//! date as `dd-mm-yy`. Sheets named any other way are skipped by the server, so they are flagged
//! here as warnings before uploading.

use crate::{utils, Result};
use anyhow::{bail, Context};
use calamine::Reader;
use chrono::NaiveDate;
use std::io::Cursor;
use std::path::Path;

/// The date format of a Sunday sheet name, e.g. `07-01-24`.
pub const SHEET_DATE_FORMAT: &str = "%d-%m-%y";

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const XLS_MIME: &str = "application/vnd.ms-excel";

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum WorkbookKind {
    Xlsx,
    Xls,
}

impl WorkbookKind {
    fn from_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "xlsx" => Some(WorkbookKind::Xlsx),
            "xls" => Some(WorkbookKind::Xls),
            _ => None,
        }
    }
}

/// An attendance workbook read into memory, ready to upload.
#[derive(Debug, Clone)]
pub struct WorkbookFile {
    name: String,
    kind: WorkbookKind,
    bytes: Vec<u8>,
}

impl WorkbookFile {
    /// Creates a `WorkbookFile` from a file name and its contents.
    ///
    /// # Errors
    /// Only `.xlsx` and `.xls` files are accepted.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let name = name.into();
        let Some(kind) = WorkbookKind::from_name(&name) else {
            bail!("'{name}' is not an Excel workbook, only .xlsx and .xls files can be uploaded")
        };
        Ok(Self { name, kind, bytes })
    }

    /// Reads the workbook at `path`. The extension is checked before the file is read.
    pub async fn load(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("Bad workbook path '{}'", path.display()))?
            .to_string();
        if WorkbookKind::from_name(&name).is_none() {
            bail!("'{name}' is not an Excel workbook, only .xlsx and .xls files can be uploaded")
        }
        let bytes = utils::read_bytes(path).await?;
        Self::new(name, bytes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub(crate) fn mime_type(&self) -> &'static str {
        match self.kind {
            WorkbookKind::Xlsx => XLSX_MIME,
            WorkbookKind::Xls => XLS_MIME,
        }
    }

    pub(crate) fn into_parts(self) -> (String, Vec<u8>) {
        (self.name, self.bytes)
    }

    /// Opens the workbook and returns a warning for every sheet whose name is not a `dd-mm-yy`
    /// date.
    ///
    /// # Errors
    /// Returns an error if the file is not a readable workbook.
    pub fn preflight(&self) -> Result<Vec<String>> {
        let cursor = Cursor::new(self.bytes.as_slice());
        let sheet_names = match self.kind {
            WorkbookKind::Xlsx => calamine::Xlsx::new(cursor)
                .with_context(|| format!("Unable to read '{}' as an .xlsx workbook", self.name))?
                .sheet_names(),
            WorkbookKind::Xls => calamine::Xls::new(cursor)
                .with_context(|| format!("Unable to read '{}' as an .xls workbook", self.name))?
                .sheet_names(),
        };
        Ok(sheet_names
            .iter()
            .filter(|sheet| parse_sheet_date(sheet).is_none())
            .map(|sheet| {
                format!(
                    "{}: sheet '{sheet}' is not named as a dd-mm-yy date and will be skipped",
                    self.name
                )
            })
            .collect())
    }
}

/// Parses a Sunday sheet name such as `07-01-24`.
pub fn parse_sheet_date(sheet_name: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(sheet_name.trim(), SHEET_DATE_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use tempfile::TempDir;

    fn workbook(sheet_names: &[&str]) -> Vec<u8> {
        let mut workbook = Workbook::new();
        for name in sheet_names {
            let sheet = workbook.add_worksheet();
            sheet.set_name(*name).unwrap();
            sheet.write_string(0, 0, "Congregation").unwrap();
        }
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_parse_sheet_date() {
        assert_eq!(
            parse_sheet_date("07-01-24"),
            NaiveDate::from_ymd_opt(2024, 1, 7)
        );
        assert_eq!(parse_sheet_date("2024-01-07"), None);
        assert_eq!(parse_sheet_date("Summary"), None);
        assert_eq!(parse_sheet_date("32-01-24"), None);
    }

    #[test]
    fn test_rejects_other_extensions() {
        assert!(WorkbookFile::new("report.csv", vec![1, 2, 3]).is_err());
        assert!(WorkbookFile::new("no_extension", vec![]).is_err());
        assert!(WorkbookFile::new("Week 1.XLSX", vec![]).is_ok());
        assert_eq!(
            WorkbookFile::new("old.xls", vec![]).unwrap().mime_type(),
            XLS_MIME
        );
    }

    #[test]
    fn test_preflight_flags_badly_named_sheets() {
        let file =
            WorkbookFile::new("january.xlsx", workbook(&["07-01-24", "Notes", "14-01-24"]))
                .unwrap();
        let warnings = file.preflight().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("'Notes'"));
    }

    #[test]
    fn test_preflight_rejects_garbage() {
        let file = WorkbookFile::new("broken.xlsx", b"not a zip".to_vec()).unwrap();
        assert!(file.preflight().is_err());
    }

    #[tokio::test]
    async fn test_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("feb.xlsx");
        utils::write(&path, workbook(&["04-02-24"])).await.unwrap();
        let file = WorkbookFile::load(&path).await.unwrap();
        assert_eq!(file.name(), "feb.xlsx");
        assert!(!file.is_empty());
        assert!(file.preflight().unwrap().is_empty());

        let missing = dir.path().join("missing.xlsx");
        assert!(WorkbookFile::load(&missing).await.is_err());
        let text = dir.path().join("notes.txt");
        assert!(WorkbookFile::load(&text).await.is_err());
    }
}
