use crate::model::{Amount, Record, RecordField};
use serde::Serialize;

/// Totals and averages over a set of records, used for the table footer and the export summary
/// row.
///
/// Averages are plain `sum / count` floats; rounding is left to whoever displays them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub totals: Totals,
    pub averages: Averages,
}

#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize)]
pub struct Totals {
    pub sunday_school: u64,
    pub adults: u64,
    pub youth: u64,
    pub diff_abled: u64,
    pub total_attendance: u64,
    pub total_collection: Amount,
    pub banked: Amount,
    pub unbanked: Amount,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Averages {
    pub sunday_school: f64,
    pub adults: f64,
    pub youth: f64,
    pub diff_abled: f64,
    pub total_attendance: f64,
    pub total_collection: f64,
    pub banked: f64,
    pub unbanked: f64,
}

/// Computes totals and averages over `records`. Returns `None` when there are no records.
pub fn summarize(records: &[Record]) -> Option<Summary> {
    if records.is_empty() {
        return None;
    }

    let count_sum = |f: fn(&Record) -> u32| records.iter().map(|r| u64::from(f(r))).sum::<u64>();
    let amount_sum = |f: fn(&Record) -> Amount| records.iter().map(f).sum::<Amount>();

    let totals = Totals {
        sunday_school: count_sum(|r| r.sunday_school),
        adults: count_sum(|r| r.adults),
        youth: count_sum(|r| r.youth),
        diff_abled: count_sum(|r| r.diff_abled),
        total_attendance: count_sum(|r| r.total_attendance),
        total_collection: amount_sum(|r| r.total_collection),
        banked: amount_sum(|r| r.banked),
        unbanked: amount_sum(|r| r.unbanked),
    };

    let n = records.len() as f64;
    let averages = Averages {
        sunday_school: totals.sunday_school as f64 / n,
        adults: totals.adults as f64 / n,
        youth: totals.youth as f64 / n,
        diff_abled: totals.diff_abled as f64 / n,
        total_attendance: totals.total_attendance as f64 / n,
        total_collection: totals.total_collection.to_f64() / n,
        banked: totals.banked.to_f64() / n,
        unbanked: totals.unbanked.to_f64() / n,
    };

    Some(Summary {
        count: records.len(),
        totals,
        averages,
    })
}

impl Summary {
    /// The average of `field` rounded half away from zero, the way the table footer and the
    /// export summary row show averages. `None` for columns that have no average.
    pub fn rounded_average(&self, field: RecordField) -> Option<f64> {
        self.averages.get(field).map(f64::round)
    }
}

impl Totals {
    /// The total of a numeric field as a float. `None` for the date, location and remarks
    /// columns, which have no total.
    pub fn get(&self, field: RecordField) -> Option<f64> {
        Some(match field {
            RecordField::SundaySchool => self.sunday_school as f64,
            RecordField::Adults => self.adults as f64,
            RecordField::Youth => self.youth as f64,
            RecordField::DiffAbled => self.diff_abled as f64,
            RecordField::TotalAttendance => self.total_attendance as f64,
            RecordField::TotalCollection => self.total_collection.to_f64(),
            RecordField::Banked => self.banked.to_f64(),
            RecordField::Unbanked => self.unbanked.to_f64(),
            RecordField::SundayDate
            | RecordField::ArchdeaconryName
            | RecordField::ParishName
            | RecordField::CongregationName
            | RecordField::Remarks => return None,
        })
    }
}

impl Averages {
    /// The average of a numeric field. `None` for columns that have no average.
    pub fn get(&self, field: RecordField) -> Option<f64> {
        Some(match field {
            RecordField::SundaySchool => self.sunday_school,
            RecordField::Adults => self.adults,
            RecordField::Youth => self.youth,
            RecordField::DiffAbled => self.diff_abled,
            RecordField::TotalAttendance => self.total_attendance,
            RecordField::TotalCollection => self.total_collection,
            RecordField::Banked => self.banked,
            RecordField::Unbanked => self.unbanked,
            RecordField::SundayDate
            | RecordField::ArchdeaconryName
            | RecordField::ParishName
            | RecordField::CongregationName
            | RecordField::Remarks => return None,
        })
    }
}
