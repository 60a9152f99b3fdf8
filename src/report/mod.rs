//! The report engine: sorting, totals and averages, the records page store and the spreadsheet
//! export.

mod export;
mod sort;
mod store;
mod summary;

pub use export::{build_export, Cell, ExportArtifact, ExportContext, ExportScope, EXPORT_COLUMNS};
pub use sort::{sort, SortConfig, SortDirection};
pub use store::{FetchStatus, FetchTicket, PageStore, Refresh, Slot};
pub use summary::{summarize, Averages, Summary, Totals};
