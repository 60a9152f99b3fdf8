//! These structs provide the CLI interface for the attendance CLI.

use crate::model::{Filters, HierarchyId, PageSize, RecordField, RecordId};
use crate::report::ExportScope;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// attendance: A command-line tool for church attendance and collection reports.
///
/// Browse the attendance and collection records held by the analyzer API as a sortable, paged
/// table with totals and averages, export them to an Excel workbook, and upload new Sunday
/// workbooks for the server to process.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the home directory and initialize the configuration file.
    ///
    /// This is the first command you should run. Decide where you want to keep the configuration
    /// and exports and pass it as --attendance-home (by default $HOME/attendance), and pass the
    /// base URL of the analyzer API as --api-url.
    Init(InitArgs),
    /// Show one page of attendance records with totals and averages.
    Records(RecordsArgs),
    /// Export attendance records to an Excel workbook.
    Export(ExportArgs),
    /// Upload Sunday attendance workbooks for the server to process.
    Upload(UploadArgs),
    /// List the archdeaconries, parishes and congregations with their ids.
    Hierarchy,
    /// Show the headline figures: total collected, average weekly attendance, growth rate and
    /// banked percentage.
    Dashboard(DashboardArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where the configuration and exports are held. Defaults to ~/attendance
    #[arg(long, env = "ATTENDANCE_HOME", default_value_t = default_attendance_home())]
    attendance_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, attendance_home: PathBuf) -> Self {
        Self {
            log_level,
            attendance_home: attendance_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn attendance_home(&self) -> &DisplayPath {
        &self.attendance_home
    }
}

/// (Not shown): Args for the `attendance init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The base URL of the analyzer API, e.g. http://localhost:8000/analyzer/
    #[arg(long)]
    api_url: String,
}

impl InitArgs {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

/// Narrows the records to one part of the hierarchy and a date range. Choosing a level clears the
/// levels below it unless they are also given.
#[derive(Debug, Default, Parser, Clone)]
pub struct FilterArgs {
    /// Only records from this archdeaconry id (see `attendance hierarchy`).
    #[arg(long)]
    archdeaconry: Option<HierarchyId>,

    /// Only records from this parish id.
    #[arg(long)]
    parish: Option<HierarchyId>,

    /// Only records from this congregation id.
    #[arg(long)]
    congregation: Option<HierarchyId>,

    /// Only records on or after this date, as YYYY-MM-DD.
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// Only records on or before this date, as YYYY-MM-DD.
    #[arg(long)]
    end_date: Option<NaiveDate>,
}

impl FilterArgs {
    pub fn new(
        archdeaconry: Option<HierarchyId>,
        parish: Option<HierarchyId>,
        congregation: Option<HierarchyId>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            archdeaconry,
            parish,
            congregation,
            start_date,
            end_date,
        }
    }

    pub fn filters(&self) -> Filters {
        Filters::with(
            self.archdeaconry,
            self.parish,
            self.congregation,
            self.start_date,
            self.end_date,
        )
    }
}

/// Which page to look at and how it is ordered.
#[derive(Debug, Parser, Clone)]
pub struct PageArgs {
    /// The page to show, starting at 1.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    page: u32,

    /// Records per page: 10, 25, 50 or 100. Defaults to the configured default_page_size.
    #[arg(long)]
    page_size: Option<PageSize>,

    /// Sort by this column. Giving the same column again flips the direction, the way clicking a
    /// column heading twice does. One of: sunday_date, archdeaconry_name, parish_name,
    /// congregation_name, sunday_school, adults, youth, diff_abled, total_attendance,
    /// total_collection, banked, unbanked, remarks
    #[arg(long = "sort")]
    sort: Vec<RecordField>,
}

impl PageArgs {
    pub fn new(page: u32, page_size: Option<PageSize>, sort: Vec<RecordField>) -> Self {
        Self {
            page,
            page_size,
            sort,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> Option<PageSize> {
        self.page_size
    }

    pub fn sort(&self) -> &[RecordField] {
        &self.sort
    }
}

/// (Not shown): Args for the `attendance records` command.
#[derive(Debug, Parser, Clone)]
pub struct RecordsArgs {
    #[clap(flatten)]
    filters: FilterArgs,

    #[clap(flatten)]
    page: PageArgs,

    /// Show the detail view of the record with this id. Can be repeated.
    #[arg(long = "expand")]
    expand: Vec<RecordId>,
}

impl RecordsArgs {
    pub fn new(filters: FilterArgs, page: PageArgs, expand: Vec<RecordId>) -> Self {
        Self {
            filters,
            page,
            expand,
        }
    }

    pub fn filters(&self) -> &FilterArgs {
        &self.filters
    }

    pub fn page(&self) -> &PageArgs {
        &self.page
    }

    pub fn expand(&self) -> &[RecordId] {
        &self.expand
    }
}

/// (Not shown): Args for the `attendance export` command.
#[derive(Debug, Parser, Clone)]
pub struct ExportArgs {
    #[clap(flatten)]
    filters: FilterArgs,

    #[clap(flatten)]
    page: PageArgs,

    /// Export only the selected page, or every record matching the filters.
    #[arg(long, value_enum, default_value_t = ExportScope::CurrentPage)]
    scope: ExportScope,

    /// Write the workbook here instead of the configured exports directory.
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

impl ExportArgs {
    pub fn new(
        filters: FilterArgs,
        page: PageArgs,
        scope: ExportScope,
        out_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            filters,
            page,
            scope,
            out_dir,
        }
    }

    pub fn filters(&self) -> &FilterArgs {
        &self.filters
    }

    pub fn page(&self) -> &PageArgs {
        &self.page
    }

    pub fn scope(&self) -> ExportScope {
        self.scope
    }

    pub fn out_dir(&self) -> Option<&Path> {
        self.out_dir.as_deref()
    }
}

/// (Not shown): Args for the `attendance dashboard` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct DashboardArgs {
    #[clap(flatten)]
    filters: FilterArgs,
}

impl DashboardArgs {
    pub fn new(filters: FilterArgs) -> Self {
        Self { filters }
    }

    pub fn filters(&self) -> &FilterArgs {
        &self.filters
    }
}

/// (Not shown): Args for the `attendance upload` command.
#[derive(Debug, Parser, Clone)]
pub struct UploadArgs {
    /// The .xlsx or .xls workbooks to upload. Each sheet should hold one Sunday and be named
    /// with its date as dd-mm-yy.
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

impl UploadArgs {
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self { files }
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

fn default_attendance_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("attendance"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --attendance-home or ATTENDANCE_HOME instead of relying on the \
                default attendance home directory. If you continue using the program right now, \
                you may have problems!",
            );
            PathBuf::from("attendance")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        let mut argv = vec!["attendance", "--attendance-home", "/tmp/attendance"];
        argv.extend_from_slice(args);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_records_args() {
        let args = parse(&[
            "records",
            "--archdeaconry",
            "1",
            "--start-date",
            "2024-01-14",
            "--page",
            "3",
            "--page-size",
            "25",
            "--sort",
            "adults",
            "--sort",
            "adults",
            "--expand",
            "7",
        ]);
        let Command::Records(records) = args.command() else {
            panic!("expected the records command")
        };
        let filters = records.filters().filters();
        assert_eq!(filters.archdeaconry(), Some(1));
        assert_eq!(filters.start_date(), NaiveDate::from_ymd_opt(2024, 1, 14));
        assert_eq!(records.page().page(), 3);
        assert_eq!(records.page().page_size(), Some(PageSize::TwentyFive));
        assert_eq!(records.page().sort(), &[RecordField::Adults, RecordField::Adults]);
        assert_eq!(records.expand(), &[RecordId::from(7)]);
        assert_eq!(args.common().attendance_home().path(), Path::new("/tmp/attendance"));
    }

    #[test]
    fn test_bad_values_rejected() {
        let argv = |extra: &[&str]| {
            let mut v = vec!["attendance", "records"];
            v.extend_from_slice(extra);
            Args::try_parse_from(v)
        };
        assert!(argv(&["--page-size", "30"]).is_err());
        assert!(argv(&["--page", "0"]).is_err());
        assert!(argv(&["--sort", "colour"]).is_err());
        assert!(argv(&["--start-date", "14/01/2024"]).is_err());
    }

    #[test]
    fn test_export_and_upload_args() {
        let args = parse(&["export", "--scope", "all"]);
        let Command::Export(export) = args.command() else {
            panic!("expected the export command")
        };
        assert_eq!(export.scope(), ExportScope::AllPages);
        assert_eq!(export.page().page(), 1);

        let args = parse(&["upload", "a.xlsx", "b.xls"]);
        let Command::Upload(upload) = args.command() else {
            panic!("expected the upload command")
        };
        assert_eq!(upload.files().len(), 2);
        assert!(Args::try_parse_from(["attendance", "upload"]).is_err());
    }

    #[test]
    fn test_dashboard_args() {
        let args = parse(&["dashboard", "--parish", "2", "--end-date", "2024-02-11"]);
        let Command::Dashboard(dashboard) = args.command() else {
            panic!("expected the dashboard command")
        };
        let filters = dashboard.filters().filters();
        assert_eq!(filters.parish(), Some(2));
        assert_eq!(filters.end_date(), NaiveDate::from_ymd_opt(2024, 2, 11));
        assert!(Args::try_parse_from(["attendance", "dashboard", "--page", "2"]).is_err());
    }
}
