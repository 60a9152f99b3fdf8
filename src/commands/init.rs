use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the home directory, its `exports` subdirectory and an initial `config.json` pointing
/// at the analyzer API.
///
/// # Arguments
/// - `attendance_home` - The directory that will be the root of the home directory, e.g.
///   `$HOME/attendance`
/// - `api_url` - The base URL of the analyzer API, e.g. `http://localhost:8000/analyzer/`
///
/// # Errors
/// - Returns an error if the URL is invalid or any file operations fail.
pub async fn init(attendance_home: &Path, api_url: &str) -> Result<Out<()>> {
    let config = Config::create(attendance_home, api_url)
        .await
        .context("Unable to create the home directory and config")
        .pub_result(ErrorType::Config)?;
    Ok(format!(
        "Successfully created the attendance directory and config at {}",
        config.root().display()
    )
    .into())
}
