//! The analyzer API: the server that stores attendance records, serves the church hierarchy and
//! the dashboard overview, and accepts workbook uploads.
//!
//! Everything the app needs from the server goes through the `Analyzer` trait so that the whole
//! app can run, top-to-bottom, against the in-memory `TestAnalyzer`.

mod http;
mod test_analyzer;

use crate::model::{Dashboard, Filters, Hierarchy, PageSize, Record};
use crate::upload::WorkbookFile;
use crate::{Config, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use http::HttpAnalyzer;
pub use test_analyzer::TestAnalyzer;

#[cfg(test)]
pub(crate) use test_analyzer::sample_record;

pub(crate) const RECORDS: &str = "records/";
pub(crate) const ARCHDEACONRIES: &str = "archdeaconries/";
pub(crate) const PARISHES: &str = "parishes/";
pub(crate) const CONGREGATIONS: &str = "congregations/";
pub(crate) const DASHBOARD: &str = "dashboard/";
pub(crate) const UPLOAD_WORKBOOK: &str = "upload-workbook/";

/// When this environment variable is set and non-empty the app talks to the `TestAnalyzer`
/// instead of the server.
pub const TEST_MODE_ENV: &str = "ATTENDANCE_IN_TEST_MODE";

/// Which `Analyzer` implementation the app uses.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Mode {
    #[default]
    Http,
    Test,
}

impl Mode {
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Http,
        }
    }
}

/// One page of records plus the size of the whole filtered result set.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PagedRecords {
    #[serde(rename = "data")]
    pub records: Vec<Record>,
    pub total: u64,
}

/// The server's verdict on one uploaded workbook.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct UploadOutcome {
    pub file: String,
    /// False when a workbook with the same name had been uploaded before and was re-processed.
    #[serde(default)]
    pub new_upload: bool,
    #[serde(default)]
    pub processed: bool,
    #[serde(default)]
    pub errors: Vec<String>,
}

#[async_trait::async_trait]
pub trait Analyzer: Send + Sync {
    /// Fetches page `page` (1-based) of the records matching `filters`.
    async fn fetch_paged_records(
        &self,
        filters: &Filters,
        page: u32,
        page_size: PageSize,
    ) -> Result<PagedRecords>;

    /// Fetches every record matching `filters`.
    async fn fetch_all_records(&self, filters: &Filters) -> Result<Vec<Record>>;

    /// Fetches all archdeaconries, parishes and congregations.
    async fn fetch_hierarchy(&self) -> Result<Hierarchy>;

    /// Fetches the dashboard overview for the records matching `filters`. `None` when the server
    /// has no data for them.
    async fn fetch_dashboard(&self, filters: &Filters) -> Result<Option<Dashboard>>;

    async fn upload_workbooks(&self, files: Vec<WorkbookFile>) -> Result<Vec<UploadOutcome>>;
}

/// Creates the `Analyzer` for `mode`.
pub fn analyzer(config: &Config, mode: Mode) -> Result<Box<dyn Analyzer>> {
    debug!("Creating the analyzer client in {mode:?} mode");
    let analyzer: Box<dyn Analyzer> = match mode {
        Mode::Http => Box::new(HttpAnalyzer::new(config.api_url().clone())?),
        Mode::Test => Box::new(TestAnalyzer::default()),
    };
    Ok(analyzer)
}
