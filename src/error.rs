//! The crate-wide `Result` type and the classification attached to errors that reach the user.

use serde::Serialize;
use std::fmt::{Display, Formatter};

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// The broad category of a failure. Commands attach one of these to any error they return so that
/// the message printed on exit says what kind of thing went wrong before the detailed chain.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The configuration or home directory is missing or invalid.
    Config,
    /// A request to the analyzer API failed or returned something unreadable.
    Fetch,
    /// An export artifact could not be generated or written.
    Export,
    /// A workbook could not be validated or uploaded.
    Upload,
    /// A local file operation failed.
    Filesystem,
}

impl Display for ErrorType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorType::Config => "Configuration error",
            ErrorType::Fetch => "Unable to fetch data from the analyzer API",
            ErrorType::Export => "Unable to export records",
            ErrorType::Upload => "Unable to upload workbook",
            ErrorType::Filesystem => "File system error",
        };
        f.write_str(s)
    }
}

/// Attaches an `ErrorType` to the error side of a `Result`.
pub trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| e.into().context(error_type))
    }
}

/// Returns the outermost `ErrorType` attached to `e`, if any.
pub fn error_type(e: &Error) -> Option<ErrorType> {
    e.downcast_ref::<ErrorType>().copied()
}
