//! Holds the state behind the records table: the page being viewed, the full filtered result set
//! used for exports, pagination, sorting and which rows are expanded.

use crate::api::{Analyzer, PagedRecords};
use crate::model::{Filters, PageSize, Pagination, Record, RecordField, RecordId};
use crate::report::{summarize, SortConfig, Summary};
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use tracing::{debug, error, trace};

/// Which piece of state a fetch fills.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Page,
    Full,
}

/// Issued when a fetch starts. A response is only applied if its ticket is still the newest one
/// for its slot, so a slow response for old filters cannot overwrite a newer one.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct FetchTicket {
    slot: Slot,
    generation: u64,
}

/// What happened to one slot during a refresh.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    Applied,
    Stale,
    Failed(#[serde(serialize_with = "error_chain")] crate::Error),
}

fn error_chain<S>(e: &crate::Error, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&format_args!("{e:#}"))
}

impl FetchStatus {
    pub fn is_applied(&self) -> bool {
        matches!(self, FetchStatus::Applied)
    }

    /// A failed fetch as the original error, context chain included. Applied and stale responses
    /// are both fine.
    pub fn into_result(self) -> crate::Result<()> {
        match self {
            FetchStatus::Failed(e) => Err(e),
            FetchStatus::Applied | FetchStatus::Stale => Ok(()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Refresh {
    pub page: FetchStatus,
    pub full: FetchStatus,
}

#[derive(Debug, Clone, Default)]
pub struct PageStore {
    page: Vec<Record>,
    full: Vec<Record>,
    pagination: Pagination,
    sort: SortConfig,
    expanded: BTreeSet<RecordId>,
    page_generation: u64,
    full_generation: u64,
}

impl PageStore {
    pub fn new(pagination: Pagination) -> Self {
        Self {
            pagination,
            ..Default::default()
        }
    }

    /// The current page in the order the API returned it.
    pub fn page(&self) -> &[Record] {
        &self.page
    }

    /// The full filtered result set in the order the API returned it.
    pub fn full(&self) -> &[Record] {
        &self.full
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn sort_config(&self) -> &SortConfig {
        &self.sort
    }

    pub fn is_empty(&self) -> bool {
        self.page.is_empty()
    }

    pub fn sorted_page(&self) -> Vec<Record> {
        self.sort.sort(&self.page)
    }

    pub fn sorted_full(&self) -> Vec<Record> {
        self.sort.sort(&self.full)
    }

    /// Totals and averages for the current page.
    pub fn summary(&self) -> Option<Summary> {
        summarize(&self.page)
    }

    pub fn toggle_sort(&mut self, field: RecordField) {
        self.sort.toggle(field);
        debug!(
            "Sorting by {field} {}",
            self.sort.direction().to_string().to_lowercase()
        );
    }

    /// Moves to `page`. Expanded rows belong to the old page, so they are collapsed.
    pub fn set_page(&mut self, page: u32) {
        self.pagination.set_page(page);
        self.expanded.clear();
    }

    /// Changes the page size, which also returns to the first page.
    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.pagination.set_page_size(page_size);
        self.expanded.clear();
    }

    pub fn toggle_expanded(&mut self, id: &RecordId) {
        if !self.expanded.remove(id) {
            self.expanded.insert(id.clone());
        }
    }

    pub fn is_expanded(&self, id: &RecordId) -> bool {
        self.expanded.contains(id)
    }

    pub fn expanded(&self) -> &BTreeSet<RecordId> {
        &self.expanded
    }

    pub fn begin_page_fetch(&mut self) -> FetchTicket {
        self.page_generation += 1;
        FetchTicket {
            slot: Slot::Page,
            generation: self.page_generation,
        }
    }

    pub fn begin_full_fetch(&mut self) -> FetchTicket {
        self.full_generation += 1;
        FetchTicket {
            slot: Slot::Full,
            generation: self.full_generation,
        }
    }

    /// Applies a page response. Returns false, leaving the state untouched, if `ticket` has been
    /// superseded or belongs to the other slot.
    pub fn apply_page(&mut self, ticket: FetchTicket, response: PagedRecords) -> bool {
        if ticket.slot != Slot::Page || ticket.generation != self.page_generation {
            debug!(
                "Dropping stale page response (generation {} < {})",
                ticket.generation, self.page_generation
            );
            return false;
        }
        self.pagination.set_total_records(response.total);
        self.page = response.records;
        true
    }

    /// Applies a full result set response, with the same staleness rule as `apply_page`.
    pub fn apply_full(&mut self, ticket: FetchTicket, records: Vec<Record>) -> bool {
        if ticket.slot != Slot::Full || ticket.generation != self.full_generation {
            debug!(
                "Dropping stale full result response (generation {} < {})",
                ticket.generation, self.full_generation
            );
            return false;
        }
        self.full = records;
        true
    }

    /// Fetches the current page for `filters`. A failure is logged and the previous page is kept.
    pub async fn refresh_page(&mut self, analyzer: &dyn Analyzer, filters: &Filters) -> FetchStatus {
        let ticket = self.begin_page_fetch();
        let page = self.pagination.current_page();
        let page_size = self.pagination.page_size();
        trace!("Fetching page {page} ({page_size} per page)");
        let result = analyzer.fetch_paged_records(filters, page, page_size).await;
        self.settle_page(ticket, result)
    }

    /// Fetches the full filtered result set. A failure is logged and the previous set is kept.
    pub async fn refresh_full(&mut self, analyzer: &dyn Analyzer, filters: &Filters) -> FetchStatus {
        let ticket = self.begin_full_fetch();
        let result = analyzer.fetch_all_records(filters).await;
        self.settle_full(ticket, result)
    }

    /// Fetches the current page and the full result set concurrently. Each response only touches
    /// its own slot, so they may complete in either order.
    pub async fn refresh(&mut self, analyzer: &dyn Analyzer, filters: &Filters) -> Refresh {
        let page_ticket = self.begin_page_fetch();
        let full_ticket = self.begin_full_fetch();
        let page = self.pagination.current_page();
        let page_size = self.pagination.page_size();

        let (page_result, full_result) = tokio::join!(
            analyzer.fetch_paged_records(filters, page, page_size),
            analyzer.fetch_all_records(filters),
        );

        Refresh {
            page: self.settle_page(page_ticket, page_result),
            full: self.settle_full(full_ticket, full_result),
        }
    }

    fn settle_page(
        &mut self,
        ticket: FetchTicket,
        result: crate::Result<PagedRecords>,
    ) -> FetchStatus {
        match result {
            Ok(response) => {
                if self.apply_page(ticket, response) {
                    FetchStatus::Applied
                } else {
                    FetchStatus::Stale
                }
            }
            Err(e) => {
                error!("Error loading table data: {e:#}");
                FetchStatus::Failed(e)
            }
        }
    }

    fn settle_full(
        &mut self,
        ticket: FetchTicket,
        result: crate::Result<Vec<Record>>,
    ) -> FetchStatus {
        match result {
            Ok(records) => {
                if self.apply_full(ticket, records) {
                    FetchStatus::Applied
                } else {
                    FetchStatus::Stale
                }
            }
            Err(e) => {
                error!("Error loading the full result set: {e:#}");
                FetchStatus::Failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TestAnalyzer;
    use crate::report::SortDirection;

    fn page_of(n: u64, total: u64) -> PagedRecords {
        let records = (1..=n)
            .map(|i| {
                let mut r = crate::api::sample_record(i);
                r.adults = (10 - i) as u32;
                r
            })
            .collect();
        PagedRecords { records, total }
    }

    #[test]
    fn test_stale_page_response_dropped() {
        let mut store = PageStore::default();
        let first = store.begin_page_fetch();
        let second = store.begin_page_fetch();

        assert!(store.apply_page(second, page_of(3, 30)));
        assert!(!store.apply_page(first, page_of(1, 99)));
        assert_eq!(store.page().len(), 3);
        assert_eq!(store.pagination().total_records(), 30);
    }

    #[test]
    fn test_ticket_for_other_slot_rejected() {
        let mut store = PageStore::default();
        let full = store.begin_full_fetch();
        let _page = store.begin_page_fetch();
        assert!(!store.apply_page(full, page_of(2, 2)));
        assert!(store.apply_full(full, page_of(2, 2).records));
        assert_eq!(store.full().len(), 2);
        assert!(store.page().is_empty());
    }

    #[test]
    fn test_slots_are_independent() {
        let mut store = PageStore::default();
        let page = store.begin_page_fetch();
        let full = store.begin_full_fetch();
        // The full result can land first
        assert!(store.apply_full(full, page_of(5, 5).records));
        assert!(store.apply_page(page, page_of(2, 5)));
        assert_eq!(store.page().len(), 2);
        assert_eq!(store.full().len(), 5);
    }

    #[test]
    fn test_sorted_views_and_summary() {
        let mut store = PageStore::default();
        let ticket = store.begin_page_fetch();
        store.apply_page(ticket, page_of(3, 3));
        store.toggle_sort(RecordField::Adults);
        let sorted: Vec<u32> = store.sorted_page().iter().map(|r| r.adults).collect();
        assert_eq!(sorted, vec![7, 8, 9]);
        // the stored page keeps API order
        assert_eq!(store.page()[0].adults, 9);
        assert_eq!(store.sort_config().direction(), SortDirection::Ascending);
        assert_eq!(store.summary().unwrap().totals.adults, 24);
    }

    #[test]
    fn test_page_change_collapses_rows_and_keeps_sort() {
        let mut store = PageStore::default();
        let id = RecordId::from(1);
        store.toggle_expanded(&id);
        assert!(store.is_expanded(&id));
        store.toggle_sort(RecordField::Youth);

        store.set_page(2);
        assert!(!store.is_expanded(&id));
        assert_eq!(store.pagination().current_page(), 2);
        assert_eq!(store.sort_config().key(), Some(RecordField::Youth));

        store.toggle_expanded(&id);
        store.toggle_expanded(&id);
        assert!(store.expanded().is_empty());
    }

    #[test]
    fn test_page_size_change_returns_to_first_page() {
        let mut store = PageStore::new(Pagination::new(3, PageSize::Ten));
        store.set_page_size(PageSize::TwentyFive);
        assert_eq!(store.pagination().current_page(), 1);
        assert_eq!(store.pagination().page_size(), PageSize::TwentyFive);
    }

    #[tokio::test]
    async fn test_refresh_fills_both_slots() {
        let analyzer = TestAnalyzer::default();
        let mut store = PageStore::new(Pagination::new(2, PageSize::Ten));
        let refresh = store.refresh(&analyzer, &Filters::new()).await;
        assert!(refresh.page.is_applied());
        assert!(refresh.full.is_applied());
        let total = analyzer.record_count() as u64;
        assert_eq!(store.pagination().total_records(), total);
        assert_eq!(store.page().len(), 10);
        assert_eq!(store.full().len() as u64, total);
        assert_eq!(store.page()[0], store.full()[10]);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_state() {
        let analyzer = TestAnalyzer::default();
        let mut store = PageStore::default();
        assert!(store
            .refresh_page(&analyzer, &Filters::new())
            .await
            .is_applied());
        let before = store.page().to_vec();

        analyzer.fail_requests(true);
        let status = store.refresh_page(&analyzer, &Filters::new()).await;
        assert!(matches!(status, FetchStatus::Failed(_)));
        assert_eq!(store.page(), before.as_slice());

        let status = store.refresh_full(&analyzer, &Filters::new()).await;
        assert!(matches!(status, FetchStatus::Failed(_)));
        assert!(store.full().is_empty());
    }

    #[test]
    fn test_failed_fetch_keeps_error_chain() {
        let mut store = PageStore::default();
        let ticket = store.begin_page_fetch();
        let e = anyhow::anyhow!("connection refused").context("Error fetching records/");
        let status = store.settle_page(ticket, Err(e));
        assert_eq!(
            serde_json::to_string(&status).unwrap(),
            r#"{"failed":"Error fetching records/: connection refused"}"#
        );

        let e = status.into_result().unwrap_err();
        assert_eq!(e.chain().count(), 2);
        assert_eq!(e.to_string(), "Error fetching records/");
        assert_eq!(e.root_cause().to_string(), "connection refused");
    }
}
