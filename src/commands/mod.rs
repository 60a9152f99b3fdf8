//! Command handlers for the attendance CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod dashboard;
mod export;
mod hierarchy;
mod init;
mod records;
mod upload;

use crate::args::PageArgs;
use crate::model::Pagination;
use crate::report::PageStore;
use crate::Config;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

pub use dashboard::dashboard;
pub use export::export;
pub use hierarchy::hierarchy;
pub use init::init;
pub use records::{records, RecordsView};
pub use upload::upload;

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data for callers that want more than the text.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// Sets up a `PageStore` for the requested page, page size and sort. Each `--sort` is applied in
/// order, so repeating a column flips its direction.
fn page_store(config: &Config, args: &PageArgs) -> PageStore {
    let page_size = args.page_size().unwrap_or(config.default_page_size());
    let mut store = PageStore::new(Pagination::new(args.page(), page_size));
    for field in args.sort() {
        store.toggle_sort(*field);
    }
    store
}
