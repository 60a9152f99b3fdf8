//! Types that represent the data model: attendance `Record`s, the `Filters` that scope them, the
//! church `Hierarchy` used for labels, `Pagination` state and the dashboard `Overview`.
mod amount;
mod dashboard;
mod filters;
mod hierarchy;
mod pagination;
mod record;

pub use amount::{format_currency, Amount, AmountError, CURRENCY};
pub use dashboard::{Dashboard, Overview};
pub use filters::Filters;
pub use hierarchy::{
    Archdeaconry, Congregation, Hierarchy, HierarchyId, Parish, ALL_ARCHDEACONRIES,
    ALL_CONGREGATIONS, ALL_PARISHES,
};
pub use pagination::{total_pages, visible_page_numbers, PageSize, Pagination, PAGE_WINDOW};
pub use record::{short_date, Record, RecordField, RecordId};
