use crate::model::Amount;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The opaque identity of an attendance record. The API uses integers, but nothing here depends on
/// that, so both JSON numbers and strings are accepted.
#[derive(Debug, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl FromStr for RecordId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().to_string()))
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(u64),
            Text(String),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(i) => RecordId::from(i),
            Raw::Text(s) => RecordId(s),
        })
    }
}

/// One dated attendance and collection observation for a congregation, as returned by the
/// `records/` endpoint.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Record {
    pub id: RecordId,
    pub sunday_date: NaiveDate,
    #[serde(default)]
    pub archdeaconry_name: String,
    #[serde(default)]
    pub parish_name: String,
    #[serde(default)]
    pub congregation_name: String,
    #[serde(default, deserialize_with = "count")]
    pub sunday_school: u32,
    #[serde(default, deserialize_with = "count")]
    pub adults: u32,
    #[serde(default, deserialize_with = "count")]
    pub youth: u32,
    #[serde(default, deserialize_with = "count")]
    pub diff_abled: u32,
    #[serde(default, deserialize_with = "count")]
    pub total_attendance: u32,
    #[serde(default)]
    pub total_collection: Amount,
    #[serde(default)]
    pub banked: Amount,
    #[serde(default)]
    pub unbanked: Amount,
    #[serde(default)]
    pub remarks: Option<String>,
}

/// Missing and null counts are treated as zero.
fn count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or_default())
}

impl Record {
    /// The sum of the four attendance categories. Summed as `u64` so large counts cannot
    /// overflow.
    pub fn attendance_parts(&self) -> u64 {
        [self.sunday_school, self.adults, self.youth, self.diff_abled]
            .into_iter()
            .map(u64::from)
            .sum()
    }

    /// True when the reported `total_attendance` differs from the sum of its parts. The API does
    /// not enforce this, so it is only reported, never corrected.
    pub fn attendance_mismatch(&self) -> bool {
        u64::from(self.total_attendance) != self.attendance_parts()
    }

    /// True when more money is accounted as banked or unbanked than was collected.
    pub fn collection_overrun(&self) -> bool {
        (self.banked + self.unbanked).value() > self.total_collection.value()
    }

    /// The remarks, or an empty string.
    pub fn remarks(&self) -> &str {
        self.remarks.as_deref().unwrap_or_default()
    }

    /// `Archdeaconry → Parish → Congregation`
    pub fn location(&self) -> String {
        format!(
            "{} → {} → {}",
            self.archdeaconry_name, self.parish_name, self.congregation_name
        )
    }
}

/// Formats a date the way the report shows it, e.g. `Jan 5, 2024`.
pub fn short_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// The columns of a record that can be used as a sort key.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    SundayDate,
    ArchdeaconryName,
    ParishName,
    CongregationName,
    SundaySchool,
    Adults,
    Youth,
    DiffAbled,
    TotalAttendance,
    TotalCollection,
    Banked,
    Unbanked,
    Remarks,
}

serde_plain::derive_display_from_serialize!(RecordField);
serde_plain::derive_fromstr_from_deserialize!(RecordField);

impl RecordField {
    pub const ALL: [RecordField; 13] = [
        RecordField::SundayDate,
        RecordField::ArchdeaconryName,
        RecordField::ParishName,
        RecordField::CongregationName,
        RecordField::SundaySchool,
        RecordField::Adults,
        RecordField::Youth,
        RecordField::DiffAbled,
        RecordField::TotalAttendance,
        RecordField::TotalCollection,
        RecordField::Banked,
        RecordField::Unbanked,
        RecordField::Remarks,
    ];

    /// The column heading used in tables and exports.
    pub fn header(&self) -> &'static str {
        match self {
            RecordField::SundayDate => "Date",
            RecordField::ArchdeaconryName => "Archdeaconry",
            RecordField::ParishName => "Parish",
            RecordField::CongregationName => "Congregation",
            RecordField::SundaySchool => "Sunday School",
            RecordField::Adults => "Adults",
            RecordField::Youth => "Youth",
            RecordField::DiffAbled => "Diff Abled",
            RecordField::TotalAttendance => "Total Attendance",
            RecordField::TotalCollection => "Total Collected",
            RecordField::Banked => "Total Banked",
            RecordField::Unbanked => "Total Unbanked",
            RecordField::Remarks => "Remarks",
        }
    }

    /// Compares two records by this field using its natural ordering.
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        match self {
            RecordField::SundayDate => a.sunday_date.cmp(&b.sunday_date),
            RecordField::ArchdeaconryName => a.archdeaconry_name.cmp(&b.archdeaconry_name),
            RecordField::ParishName => a.parish_name.cmp(&b.parish_name),
            RecordField::CongregationName => a.congregation_name.cmp(&b.congregation_name),
            RecordField::SundaySchool => a.sunday_school.cmp(&b.sunday_school),
            RecordField::Adults => a.adults.cmp(&b.adults),
            RecordField::Youth => a.youth.cmp(&b.youth),
            RecordField::DiffAbled => a.diff_abled.cmp(&b.diff_abled),
            RecordField::TotalAttendance => a.total_attendance.cmp(&b.total_attendance),
            RecordField::TotalCollection => a.total_collection.cmp(&b.total_collection),
            RecordField::Banked => a.banked.cmp(&b.banked),
            RecordField::Unbanked => a.unbanked.cmp(&b.unbanked),
            RecordField::Remarks => a.remarks.cmp(&b.remarks),
        }
    }
}
