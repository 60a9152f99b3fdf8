//! Text rendering of the records table and the other command output.

use crate::model::{
    format_currency, short_date, Hierarchy, Overview, Pagination, Record, RecordField,
};
use crate::report::{SortConfig, Summary};
use std::fmt::Write;

/// Shown instead of a table when the filters match nothing.
pub const NO_RECORDS: &str = "No attendance records found for the selected filters";

/// Renders `records` as a markdown table in the order given, with the sort arrow on the sorted
/// column and, when `summary` is given, totals and averages rows underneath.
pub fn records_table(records: &[Record], sort: &SortConfig, summary: Option<&Summary>) -> String {
    if records.is_empty() {
        return NO_RECORDS.to_string();
    }

    let headers: Vec<String> = RecordField::ALL
        .iter()
        .map(|field| match sort.key() {
            Some(key) if key == *field => format!("{} {}", field.header(), sort.direction().arrow()),
            _ => field.header().to_string(),
        })
        .collect();

    let mut out = String::new();
    push_row(&mut out, &headers);
    push_row(
        &mut out,
        &RecordField::ALL
            .iter()
            .map(|field| if is_numeric(*field) { "---:" } else { "---" }.to_string())
            .collect::<Vec<_>>(),
    );
    for record in records {
        let cells: Vec<String> = RecordField::ALL
            .iter()
            .map(|field| cell(record, *field))
            .collect();
        push_row(&mut out, &cells);
    }

    if let Some(summary) = summary {
        push_row(&mut out, &footer("**Totals**", |f| summary.totals.get(f)));
        push_row(
            &mut out,
            &footer("**Averages**", |f| {
                if is_currency(f) {
                    summary.averages.get(f)
                } else {
                    summary.rounded_average(f)
                }
            }),
        );
    }
    out
}

/// "Showing a-b of n", or the empty message when there are no records.
pub fn showing(pagination: &Pagination) -> String {
    match pagination.showing_range() {
        Some((first, last)) => format!(
            "Showing {first}-{last} of {}",
            pagination.total_records()
        ),
        None => NO_RECORDS.to_string(),
    }
}

/// The page buttons, with the current page in brackets, e.g. `‹ 1 [2] 3 4 5 ›`. The arrows are
/// only shown when there is a page to move to.
pub fn page_bar(pagination: &Pagination) -> String {
    let mut parts = Vec::new();
    if pagination.has_previous() {
        parts.push("«".to_string());
        parts.push("‹".to_string());
    }
    for page in pagination.visible_pages() {
        if page == pagination.current_page() {
            parts.push(format!("[{page}]"));
        } else {
            parts.push(page.to_string());
        }
    }
    if pagination.has_next() {
        parts.push("›".to_string());
        parts.push("»".to_string());
    }
    format!(
        "{} (page {} of {}, {} per page)",
        parts.join(" "),
        pagination.current_page(),
        pagination.total_pages(),
        pagination.page_size()
    )
}

/// The expanded view of one record.
pub fn record_details(record: &Record) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(
        out,
        "Record {}: {} at {}",
        record.id,
        short_date(record.sunday_date),
        record.location()
    );
    let _ = writeln!(
        out,
        "  Attendance: sunday school {}, adults {}, youth {}, diff abled {}, total {}",
        record.sunday_school,
        record.adults,
        record.youth,
        record.diff_abled,
        record.total_attendance
    );
    let _ = writeln!(
        out,
        "  Collection: {} (banked {}, unbanked {})",
        record.total_collection, record.banked, record.unbanked
    );
    let remarks = match record.remarks() {
        "" => "-",
        remarks => remarks,
    };
    let _ = writeln!(out, "  Remarks: {remarks}");
    if record.attendance_mismatch() {
        let _ = writeln!(
            out,
            "  Note: total attendance {} differs from the sum of its parts {}",
            record.total_attendance,
            record.attendance_parts()
        );
    }
    if record.collection_overrun() {
        let _ = writeln!(out, "  Note: banked plus unbanked exceeds the collection");
    }
    out
}

/// The four headline figures, one per line.
pub fn overview(overview: &Overview) -> String {
    [
        format!(
            "Total Collected: {} (all-time collections)",
            overview.total_collection
        ),
        format!(
            "Avg Weekly Attendance: {} (last 12 months average)",
            overview.attendance_display()
        ),
        format!(
            "Growth Rate: {} (quarterly attendance trend)",
            overview.growth_display()
        ),
        format!(
            "Banked Percentage: {} (of total collections)",
            overview.banked_display()
        ),
    ]
    .join("\n")
}

/// Lists the archdeaconries with their parishes and congregations nested underneath.
pub fn hierarchy_tree(hierarchy: &Hierarchy) -> String {
    let mut out = String::new();
    for archdeaconry in &hierarchy.archdeaconries {
        let _ = writeln!(out, "{} ({})", archdeaconry.name, archdeaconry.id);
        for parish in hierarchy.parishes_in(archdeaconry.id) {
            let _ = writeln!(out, "  {} ({})", parish.name, parish.id);
            for congregation in hierarchy.congregations_in(parish.id) {
                let _ = writeln!(out, "    {} ({})", congregation.name, congregation.id);
            }
        }
    }
    out
}

fn is_numeric(field: RecordField) -> bool {
    !matches!(
        field,
        RecordField::SundayDate
            | RecordField::ArchdeaconryName
            | RecordField::ParishName
            | RecordField::CongregationName
            | RecordField::Remarks
    )
}

fn is_currency(field: RecordField) -> bool {
    matches!(
        field,
        RecordField::TotalCollection | RecordField::Banked | RecordField::Unbanked
    )
}

fn cell(record: &Record, field: RecordField) -> String {
    match field {
        RecordField::SundayDate => short_date(record.sunday_date),
        RecordField::ArchdeaconryName => record.archdeaconry_name.clone(),
        RecordField::ParishName => record.parish_name.clone(),
        RecordField::CongregationName => record.congregation_name.clone(),
        RecordField::SundaySchool => record.sunday_school.to_string(),
        RecordField::Adults => record.adults.to_string(),
        RecordField::Youth => record.youth.to_string(),
        RecordField::DiffAbled => record.diff_abled.to_string(),
        RecordField::TotalAttendance => record.total_attendance.to_string(),
        RecordField::TotalCollection => record.total_collection.to_string(),
        RecordField::Banked => record.banked.to_string(),
        RecordField::Unbanked => record.unbanked.to_string(),
        RecordField::Remarks => record.remarks().to_string(),
    }
}

/// A footer row: `label` in the first column, then counts as whole people and currency to two
/// decimal places.
fn footer(label: &str, value: impl Fn(RecordField) -> Option<f64>) -> Vec<String> {
    RecordField::ALL
        .iter()
        .enumerate()
        .map(|(ix, field)| match value(*field) {
            Some(v) if is_currency(*field) => format_currency(v),
            Some(v) => format!("{v:.0}"),
            None if ix == 0 => label.to_string(),
            None => String::new(),
        })
        .collect()
}

fn push_row(out: &mut String, cells: &[String]) {
    let escaped: Vec<String> = cells
        .iter()
        .map(|c| c.replace('|', "\\|").replace("\r\n", " ").replace('\n', " "))
        .collect();
    let _ = writeln!(out, "| {} |", escaped.join(" | "));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::sample_record;
    use crate::model::PageSize;
    use crate::report::{summarize, SortDirection};

    #[test]
    fn test_empty_table() {
        assert_eq!(records_table(&[], &SortConfig::default(), None), NO_RECORDS);
        assert_eq!(showing(&Pagination::default()), NO_RECORDS);
    }

    #[test]
    fn test_table_with_sort_arrow_and_footer() {
        let mut a = sample_record(1);
        a.adults = 10;
        let mut b = sample_record(2);
        b.adults = 15;
        b.remarks = Some("a|b".to_string());
        let records = vec![a, b];
        let sort = SortConfig::new(Some(RecordField::Adults), SortDirection::Descending);
        let summary = summarize(&records).unwrap();
        let table = records_table(&records, &sort, Some(&summary));
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 6);
        assert!(lines[0].contains("| Adults ↓ |"));
        assert!(lines[0].starts_with("| Date |"));
        assert!(lines[2].starts_with("| Jan 7, 2024 | Nambale | Bujumba | Congregation 1 |"));
        assert!(lines[3].contains("a\\|b"));
        // totals: adults 25, collection 200.00
        assert!(lines[4].starts_with("| **Totals** |  |  |  | 2 | 25 |"));
        assert!(lines[4].contains("Ksh 200.00"));
        // averages: adults 12.5 rounds to 13, collection 100.00
        assert!(lines[5].starts_with("| **Averages** |  |  |  | 1 | 13 |"));
        assert!(lines[5].contains("Ksh 100.00"));
    }

    #[test]
    fn test_multiline_remarks_stay_on_one_row() {
        let mut record = sample_record(1);
        record.remarks = Some("rain\r\nlow turnout\nsee notes".to_string());
        let table = records_table(&[record], &SortConfig::default(), None);
        assert_eq!(table.lines().count(), 3);
        assert!(table.contains("| rain low turnout see notes |"));
    }

    #[test]
    fn test_showing_and_page_bar() {
        let mut p = Pagination::new(2, PageSize::Ten);
        p.set_total_records(36);
        assert_eq!(showing(&p), "Showing 11-20 of 36");
        assert_eq!(
            page_bar(&p),
            "« ‹ 1 [2] 3 4 › » (page 2 of 4, 10 per page)"
        );

        p.set_page(1);
        assert!(page_bar(&p).starts_with("[1] 2 3 4 › »"));
    }

    #[test]
    fn test_record_details_with_huge_counts() {
        let json = r#"{"id": 9, "sunday_date": "2024-01-07", "sunday_school": 4294967295, "adults": 1}"#;
        let record: Record = serde_json::from_str(json).unwrap();
        let details = record_details(&record);
        assert!(details.contains("differs from the sum of its parts 4294967296"));
    }

    #[test]
    fn test_overview() {
        let overview = Overview {
            total_collection: "152340.5".parse().unwrap(),
            avg_weekly_attendance: Some(312.5),
            growth_rate: Some(3.44),
            banked_percentage: None,
        };
        assert_eq!(
            super::overview(&overview),
            "Total Collected: Ksh 152,340.50 (all-time collections)\n\
            Avg Weekly Attendance: 313 (last 12 months average)\n\
            Growth Rate: 3.4% (quarterly attendance trend)\n\
            Banked Percentage: 0% (of total collections)"
        );
    }

    #[test]
    fn test_record_details() {
        let mut record = sample_record(5);
        record.total_attendance = 4;
        let details = record_details(&record);
        assert!(details.starts_with("Record 5: Jan 7, 2024 at Nambale → Bujumba → Congregation 5"));
        assert!(details.contains("Remarks: -"));
        assert!(details.contains("differs from the sum of its parts 3"));
        assert!(!details.contains("exceeds the collection"));
    }
}
