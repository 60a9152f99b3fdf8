//! Builds the spreadsheet that the export command writes: a merged title row, a header row, one
//! row per record and a trailing `SUMMARY` row with column totals.

use crate::model::{short_date, Record, RecordField};
use crate::report::{summarize, Summary};
use crate::{utils, Result};
use anyhow::Context;
use chrono::NaiveDate;
use rust_xlsxwriter::{Format, FormatAlign, Workbook};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const SHEET_NAME: &str = "Attendance";
const SUMMARY_LABEL: &str = "SUMMARY";
/// Rendered in place of a date bound that was not selected.
const NO_DATE: &str = "ALL";

/// The column order of every exported row.
pub const EXPORT_COLUMNS: [RecordField; 13] = RecordField::ALL;

/// Whether an export holds just the page being viewed or the whole filtered result set.
#[derive(
    Debug, Default, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum ExportScope {
    /// Only the records on the current page.
    #[default]
    #[value(name = "page")]
    #[serde(rename = "page")]
    CurrentPage,
    /// Every record matching the filters.
    #[value(name = "all")]
    #[serde(rename = "all")]
    AllPages,
}

serde_plain::derive_display_from_serialize!(ExportScope);

/// The labels and selections that describe what is being exported. The location labels are
/// display names (or the "All ..." placeholders), not ids.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ExportContext {
    pub archdeaconry_label: String,
    pub parish_label: String,
    pub congregation_label: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub scope: ExportScope,
    pub current_page: u32,
}

impl ExportContext {
    fn start(&self) -> String {
        date_label(self.start_date)
    }

    fn end(&self) -> String {
        date_label(self.end_date)
    }

    /// e.g. `ATTENDANCE AND COLLECTION DATA FOR ARCHDEACONRY-NAMBALE ... TO-2024-03-31(PAGE 2)`
    pub fn title(&self) -> String {
        let suffix = match self.scope {
            ExportScope::AllPages => "(ALL PAGES)".to_string(),
            ExportScope::CurrentPage => format!("(PAGE {})", self.current_page),
        };
        format!(
            "Attendance and collection data for Archdeaconry-{} Parish-{} Congregation-{} \
            From-{} To-{}{suffix}",
            self.archdeaconry_label,
            self.parish_label,
            self.congregation_label,
            self.start(),
            self.end(),
        )
        .to_uppercase()
    }

    /// e.g. `ARCHDEACONRY_NAMBALE_PARISH_ALL PARISHES_CONGREGATION_ALL CONGREGATIONS_2024-01-01_ALL.xlsx`
    pub fn filename(&self) -> String {
        let stem = format!(
            "Archdeaconry_{}_Parish_{}_Congregation_{}_{}_{}",
            self.archdeaconry_label,
            self.parish_label,
            self.congregation_label,
            self.start(),
            self.end(),
        )
        .to_uppercase();
        format!("{}.xlsx", sanitize_file_stem(&stem))
    }
}

fn date_label(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| NO_DATE.to_string())
}

/// Replaces characters that cannot appear in a file name.
fn sanitize_file_stem(stem: &str) -> String {
    stem.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect()
}

/// One cell of an exported row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(f64),
    Blank,
}

impl Cell {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// A generated export, ready to be turned into `.xlsx` bytes or saved to disk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportArtifact {
    title: String,
    filename: String,
    rows: Vec<Vec<Cell>>,
    summary: Vec<Cell>,
}

/// Builds the export for `records`. Returns `None` when there is nothing to export.
///
/// The summary row totals every exported record, so an all-pages export totals the whole result
/// set rather than one page.
pub fn build_export(records: &[Record], context: &ExportContext) -> Option<ExportArtifact> {
    let summary = summarize(records)?;

    let rows = records.iter().map(record_row).collect();

    let mut summary_row = Vec::with_capacity(EXPORT_COLUMNS.len());
    for field in EXPORT_COLUMNS {
        let cell = match field {
            RecordField::SundayDate => Cell::Text(SUMMARY_LABEL.to_string()),
            RecordField::Remarks => Cell::Text(format!(
                "Avg Attendance: {}, Avg Collection: {}",
                rounded_average(&summary, RecordField::TotalAttendance),
                rounded_average(&summary, RecordField::TotalCollection),
            )),
            other => summary
                .totals
                .get(other)
                .map(Cell::Number)
                .unwrap_or(Cell::Blank),
        };
        summary_row.push(cell);
    }

    Some(ExportArtifact {
        title: context.title(),
        filename: context.filename(),
        rows,
        summary: summary_row,
    })
}

fn rounded_average(summary: &Summary, field: RecordField) -> String {
    format!("{:.0}", summary.rounded_average(field).unwrap_or_default())
}

fn record_row(record: &Record) -> Vec<Cell> {
    EXPORT_COLUMNS
        .iter()
        .map(|field| match field {
            RecordField::SundayDate => Cell::Text(short_date(record.sunday_date)),
            RecordField::ArchdeaconryName => Cell::Text(record.archdeaconry_name.clone()),
            RecordField::ParishName => Cell::Text(record.parish_name.clone()),
            RecordField::CongregationName => Cell::Text(record.congregation_name.clone()),
            RecordField::SundaySchool => Cell::Number(f64::from(record.sunday_school)),
            RecordField::Adults => Cell::Number(f64::from(record.adults)),
            RecordField::Youth => Cell::Number(f64::from(record.youth)),
            RecordField::DiffAbled => Cell::Number(f64::from(record.diff_abled)),
            RecordField::TotalAttendance => Cell::Number(f64::from(record.total_attendance)),
            RecordField::TotalCollection => Cell::Number(record.total_collection.to_f64()),
            RecordField::Banked => Cell::Number(record.banked.to_f64()),
            RecordField::Unbanked => Cell::Number(record.unbanked.to_f64()),
            RecordField::Remarks => match &record.remarks {
                Some(remarks) => Cell::Text(remarks.clone()),
                None => Cell::Blank,
            },
        })
        .collect()
}

impl ExportArtifact {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn headers(&self) -> Vec<&'static str> {
        EXPORT_COLUMNS.iter().map(|f| f.header()).collect()
    }

    /// One row per exported record.
    pub fn data_rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn summary_row(&self) -> &[Cell] {
        &self.summary
    }

    /// Every row of the sheet in order: title, header, data rows, summary. The title row holds
    /// the title in its first cell; the remaining cells are covered by the merge.
    pub fn sheet_rows(&self) -> Vec<Vec<Cell>> {
        let width = EXPORT_COLUMNS.len();
        let mut title_row = vec![Cell::Blank; width];
        title_row[0] = Cell::Text(self.title.clone());
        let header_row = self
            .headers()
            .into_iter()
            .map(|h| Cell::Text(h.to_string()))
            .collect();

        let mut rows = Vec::with_capacity(self.rows.len() + 3);
        rows.push(title_row);
        rows.push(header_row);
        rows.extend(self.rows.iter().cloned());
        rows.push(self.summary.clone());
        rows
    }

    /// Renders the artifact as an `.xlsx` workbook in memory.
    pub fn to_xlsx(&self) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let title_format = Format::new()
            .set_bold()
            .set_font_size(12)
            .set_align(FormatAlign::Center);
        let header_format = Format::new().set_bold();
        let last_col = (EXPORT_COLUMNS.len() - 1) as u16;

        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME)?;

        for (row_ix, row) in self.sheet_rows().iter().enumerate() {
            let row_num = row_ix as u32;
            if row_ix == 0 {
                worksheet.merge_range(0, 0, 0, last_col, &self.title, &title_format)?;
                continue;
            }
            let bold = row_ix == 1 || row_ix == self.rows.len() + 2;
            for (col_ix, cell) in row.iter().enumerate() {
                let col = col_ix as u16;
                match (cell, bold) {
                    (Cell::Text(s), true) => {
                        worksheet.write_string_with_format(row_num, col, s, &header_format)?;
                    }
                    (Cell::Text(s), false) => {
                        worksheet.write_string(row_num, col, s)?;
                    }
                    (Cell::Number(n), true) => {
                        worksheet.write_number_with_format(row_num, col, *n, &header_format)?;
                    }
                    (Cell::Number(n), false) => {
                        worksheet.write_number(row_num, col, *n)?;
                    }
                    (Cell::Blank, _) => {}
                }
            }
        }

        for col in 0..=last_col {
            let width = if col < 4 || col == last_col { 22.0 } else { 16.0 };
            worksheet.set_column_width(col, width)?;
        }

        let buffer = workbook
            .save_to_buffer()
            .context("Unable to render the export workbook")?;
        Ok(buffer)
    }

    /// Writes the workbook into `dir` under the suggested filename and returns its path.
    pub async fn save(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        utils::make_dir(dir).await?;
        let path = dir.join(&self.filename);
        let artifact = self.clone();
        let bytes = tokio::task::spawn_blocking(move || artifact.to_xlsx())
            .await
            .context("The export task did not complete")??;
        utils::write(&path, bytes).await?;
        Ok(path)
    }
}
