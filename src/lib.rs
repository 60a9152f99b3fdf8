//! attendance_report: browse, summarize and export church attendance and collection records held
//! by the analyzer API.

pub mod api;
pub mod args;
pub mod commands;
mod config;
mod error;
pub mod model;
pub mod render;
pub mod report;
pub mod upload;
mod utils;


pub use api::Mode;
pub use config::Config;
pub use error::{error_type, Error, ErrorType, IntoResult, Result};
