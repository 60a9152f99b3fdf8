use crate::model::{Record, RecordField};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

serde_plain::derive_display_from_serialize!(SortDirection);
serde_plain::derive_fromstr_from_deserialize!(SortDirection);

impl SortDirection {
    /// The arrow shown next to a sorted column heading.
    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "↑",
            SortDirection::Descending => "↓",
        }
    }

    fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// The active sort column and direction. With no key, records stay in the order the API returned
/// them.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SortConfig {
    key: Option<RecordField>,
    direction: SortDirection,
}

impl SortConfig {
    pub fn new(key: Option<RecordField>, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    pub fn key(&self) -> Option<RecordField> {
        self.key
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// Selects `key` the way clicking a column heading does: the same key while ascending flips
    /// to descending, anything else sorts ascending by `key`.
    pub fn toggle(&mut self, key: RecordField) {
        self.direction = if self.key == Some(key) && self.direction == SortDirection::Ascending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        self.key = Some(key);
    }

    /// Returns a sorted copy of `records` according to this configuration.
    pub fn sort(&self, records: &[Record]) -> Vec<Record> {
        sort(records, self.key, self.direction)
    }
}

/// Returns a copy of `records` ordered by `key`. The sort is stable in both directions: records
/// with equal keys keep their relative input order. With no key the copy is in input order.
pub fn sort(records: &[Record], key: Option<RecordField>, direction: SortDirection) -> Vec<Record> {
    let mut sorted = records.to_vec();
    if let Some(key) = key {
        sorted.sort_by(|a, b| direction.apply(key.compare(a, b)));
    }
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Amount, RecordId};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn record(id: u64, day: u32, adults: u32, collection: i64, parish: &str) -> Record {
        Record {
            id: RecordId::from(id),
            sunday_date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            archdeaconry_name: "Nambale".to_string(),
            parish_name: parish.to_string(),
            congregation_name: format!("Congregation {id}"),
            sunday_school: 0,
            adults,
            youth: 0,
            diff_abled: 0,
            total_attendance: adults,
            total_collection: Amount::new(Decimal::from(collection)),
            banked: Amount::ZERO,
            unbanked: Amount::ZERO,
            remarks: None,
        }
    }

    fn ids(records: &[Record]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    fn sample() -> Vec<Record> {
        vec![
            record(1, 7, 30, 500, "Bujumba"),
            record(2, 14, 10, 1500, "Amukura"),
            record(3, 21, 30, 200, "Bujumba"),
            record(4, 28, 20, 900, "Chakol"),
            record(5, 7, 10, 1500, "Amukura"),
        ]
    }

    #[test]
    fn test_no_key_keeps_order() {
        let records = sample();
        let sorted = sort(&records, None, SortDirection::Descending);
        assert_eq!(sorted, records);
    }

    #[test]
    fn test_numeric_ascending_is_stable() {
        let sorted = sort(&sample(), Some(RecordField::Adults), SortDirection::Ascending);
        assert_eq!(ids(&sorted), vec!["2", "5", "4", "1", "3"]);
    }

    #[test]
    fn test_numeric_descending_is_stable() {
        let sorted = sort(&sample(), Some(RecordField::Adults), SortDirection::Descending);
        assert_eq!(ids(&sorted), vec!["1", "3", "4", "2", "5"]);
    }

    #[test]
    fn test_text_and_date_and_amount_keys() {
        let records = sample();
        let by_parish = sort(&records, Some(RecordField::ParishName), SortDirection::Ascending);
        assert_eq!(ids(&by_parish), vec!["2", "5", "1", "3", "4"]);

        let by_date = sort(&records, Some(RecordField::SundayDate), SortDirection::Descending);
        assert_eq!(ids(&by_date), vec!["4", "3", "2", "1", "5"]);

        let by_collection = sort(
            &records,
            Some(RecordField::TotalCollection),
            SortDirection::Ascending,
        );
        assert_eq!(ids(&by_collection), vec!["3", "1", "4", "2", "5"]);
    }

    #[test]
    fn test_sort_is_idempotent() {
        let records = sample();
        for field in RecordField::ALL {
            for direction in [SortDirection::Ascending, SortDirection::Descending] {
                let once = sort(&records, Some(field), direction);
                let twice = sort(&once, Some(field), direction);
                assert_eq!(once, twice, "{field} {direction}");
            }
        }
    }

    #[test]
    fn test_reverse_direction_reverses_distinct_keys() {
        let records: Vec<Record> = (1..=6)
            .map(|i| record(i, i as u32, (i * 7 % 5) as u32, i as i64, "P"))
            .collect();
        let asc = sort(&records, Some(RecordField::Adults), SortDirection::Ascending);
        let mut desc = sort(&records, Some(RecordField::Adults), SortDirection::Descending);
        // 7 % 5, 14 % 5, ... are 2, 4, 1, 3, 0, 2; only ids 1 and 6 tie
        assert_eq!(ids(&asc), vec!["5", "3", "1", "6", "4", "2"]);
        assert_eq!(ids(&desc), vec!["2", "4", "1", "6", "3", "5"]);
        desc.reverse();
        let distinct: Vec<&str> = ids(&desc)
            .into_iter()
            .filter(|id| *id != "1" && *id != "6")
            .collect();
        assert_eq!(distinct, vec!["5", "3", "4", "2"]);
    }

    #[test]
    fn test_input_not_mutated() {
        let records = sample();
        let copy = records.clone();
        let _ = sort(&records, Some(RecordField::Adults), SortDirection::Descending);
        assert_eq!(records, copy);
    }

    #[test]
    fn test_toggle() {
        let mut config = SortConfig::default();
        assert_eq!(config.key(), None);

        config.toggle(RecordField::Adults);
        assert_eq!(config.key(), Some(RecordField::Adults));
        assert_eq!(config.direction(), SortDirection::Ascending);

        config.toggle(RecordField::Adults);
        assert_eq!(config.direction(), SortDirection::Descending);

        config.toggle(RecordField::Adults);
        assert_eq!(config.direction(), SortDirection::Ascending);

        config.toggle(RecordField::Adults);
        config.toggle(RecordField::Youth);
        assert_eq!(config.key(), Some(RecordField::Youth));
        assert_eq!(config.direction(), SortDirection::Ascending);
    }
}
