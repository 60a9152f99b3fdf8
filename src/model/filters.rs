use crate::model::HierarchyId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The filter selections that scope which records are fetched. All fields are optional; an unset
/// field means "all".
///
/// The setters cascade the way the filter panel does: choosing an archdeaconry clears the parish
/// and congregation, and choosing a parish clears the congregation.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Filters {
    #[serde(skip_serializing_if = "Option::is_none")]
    archdeaconry: Option<HierarchyId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parish: Option<HierarchyId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    congregation: Option<HierarchyId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_date: Option<NaiveDate>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn archdeaconry(&self) -> Option<HierarchyId> {
        self.archdeaconry
    }

    pub fn parish(&self) -> Option<HierarchyId> {
        self.parish
    }

    pub fn congregation(&self) -> Option<HierarchyId> {
        self.congregation
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    pub fn set_archdeaconry(&mut self, id: Option<HierarchyId>) {
        self.archdeaconry = id;
        self.parish = None;
        self.congregation = None;
    }

    pub fn set_parish(&mut self, id: Option<HierarchyId>) {
        self.parish = id;
        self.congregation = None;
    }

    pub fn set_congregation(&mut self, id: Option<HierarchyId>) {
        self.congregation = id;
    }

    pub fn set_date_range(&mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) {
        self.start_date = start;
        self.end_date = end;
    }

    /// Builder form of the setters, applied in cascade order.
    pub fn with(
        archdeaconry: Option<HierarchyId>,
        parish: Option<HierarchyId>,
        congregation: Option<HierarchyId>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Self {
        let mut filters = Self::new();
        filters.set_archdeaconry(archdeaconry);
        filters.set_parish(parish);
        filters.set_congregation(congregation);
        filters.set_date_range(start_date, end_date);
        filters
    }

    /// The filters as API query parameters. Unset fields are omitted.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(id) = self.archdeaconry {
            pairs.push(("archdeaconry", id.to_string()));
        }
        if let Some(id) = self.parish {
            pairs.push(("parish", id.to_string()));
        }
        if let Some(id) = self.congregation {
            pairs.push(("congregation", id.to_string()));
        }
        if let Some(date) = self.start_date {
            pairs.push(("start_date", date.format("%Y-%m-%d").to_string()));
        }
        if let Some(date) = self.end_date {
            pairs.push(("end_date", date.format("%Y-%m-%d").to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_cascade() {
        let mut filters = Filters::with(Some(1), Some(10), Some(100), None, None);
        assert_eq!(filters.congregation(), Some(100));

        filters.set_parish(Some(11));
        assert_eq!(filters.parish(), Some(11));
        assert_eq!(filters.congregation(), None);

        filters.set_congregation(Some(101));
        filters.set_archdeaconry(Some(2));
        assert_eq!(filters.archdeaconry(), Some(2));
        assert_eq!(filters.parish(), None);
        assert_eq!(filters.congregation(), None);
    }

    #[test]
    fn test_date_range_survives_cascade() {
        let mut filters = Filters::new();
        filters.set_date_range(Some(date(2024, 1, 1)), Some(date(2024, 3, 31)));
        filters.set_archdeaconry(Some(3));
        assert_eq!(filters.start_date(), Some(date(2024, 1, 1)));
        assert_eq!(filters.end_date(), Some(date(2024, 3, 31)));
    }

    #[test]
    fn test_query_pairs_omit_unset() {
        assert!(Filters::new().query_pairs().is_empty());
        let filters = Filters::with(Some(1), None, None, Some(date(2024, 1, 7)), None);
        assert_eq!(
            filters.query_pairs(),
            vec![
                ("archdeaconry", "1".to_string()),
                ("start_date", "2024-01-07".to_string())
            ]
        );
    }
}
