use crate::api::{self, Mode};
use crate::args::RecordsArgs;
use crate::commands::{page_store, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::{Pagination, Record, RecordId};
use crate::render;
use crate::report::{SortConfig, Summary};
use crate::{Config, Result};
use anyhow::bail;
use serde::Serialize;
use tracing::warn;

/// What the `records` command shows, as data.
#[derive(Debug, Clone, Serialize)]
pub struct RecordsView {
    /// The current page in display order.
    pub records: Vec<Record>,
    pub pagination: Pagination,
    pub visible_pages: Vec<u32>,
    pub sort: SortConfig,
    pub summary: Option<Summary>,
    pub expanded: Vec<RecordId>,
}

/// Fetches one page of records for the filters and renders it as a table with a totals and
/// averages footer, the record range and the page buttons.
///
/// # Errors
/// - Returns an error if the page cannot be fetched or if the requested page is past the last one.
pub async fn records(config: &Config, mode: Mode, args: &RecordsArgs) -> Result<Out<RecordsView>> {
    let analyzer = api::analyzer(config, mode).pub_result(ErrorType::Fetch)?;
    let filters = args.filters().filters();
    let mut store = page_store(config, args.page());

    store
        .refresh_page(analyzer.as_ref(), &filters)
        .await
        .into_result()
        .pub_result(ErrorType::Fetch)?;

    let pagination = *store.pagination();
    if pagination.total_records() > 0 && pagination.current_page() > pagination.total_pages() {
        bail!(
            "Page {} is out of range, there are {} pages of {} records",
            pagination.current_page(),
            pagination.total_pages(),
            pagination.page_size()
        );
    }

    for id in args.expand() {
        if store.page().iter().any(|r| &r.id == id) {
            store.toggle_expanded(id);
        } else {
            warn!("Record {id} is not on this page");
        }
    }

    let records = store.sorted_page();
    let summary = store.summary();
    if records.is_empty() {
        return Ok(Out::new(
            render::NO_RECORDS,
            RecordsView {
                records,
                pagination,
                visible_pages: Vec::new(),
                sort: *store.sort_config(),
                summary,
                expanded: Vec::new(),
            },
        ));
    }

    let mut message = render::records_table(&records, store.sort_config(), summary.as_ref());
    for record in records.iter().filter(|r| store.is_expanded(&r.id)) {
        message.push('\n');
        message.push_str(&render::record_details(record));
    }
    message.push('\n');
    message.push_str(&render::showing(&pagination));
    message.push('\n');
    message.push_str(&render::page_bar(&pagination));

    Ok(Out::new(
        message,
        RecordsView {
            records,
            pagination,
            visible_pages: pagination.visible_pages(),
            sort: *store.sort_config(),
            summary,
            expanded: store.expanded().iter().cloned().collect(),
        },
    ))
}
