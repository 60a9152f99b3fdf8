//! Configuration file handling.
//!
//! The configuration file is stored at `$ATTENDANCE_HOME/config.json` and holds the analyzer API
//! base URL, the default page size for record listings and where exports are written.

use crate::model::PageSize;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

const APP_NAME: &str = "attendance";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const EXPORTS: &str = "exports";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$ATTENDANCE_HOME` and from there it loads `$ATTENDANCE_HOME/config.json`.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    api_url: Url,
}

impl Config {
    /// Creates the home directory, its `exports` subdirectory and an initial `config.json`.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of the home directory, e.g. `$HOME/attendance`
    /// - `api_url` - The base URL of the analyzer API, e.g. `http://localhost:8000/analyzer/`
    ///
    /// # Errors
    /// - Returns an error if `api_url` is not a valid http(s) URL or if any file operations fail.
    pub async fn create(dir: impl Into<PathBuf>, api_url: &str) -> Result<Self> {
        let api_url = parse_api_url(api_url)?;

        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the attendance home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;
        utils::make_dir(&root.join(EXPORTS)).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            api_url: api_url.to_string(),
            ..Default::default()
        };
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            config_path,
            config_file,
            api_url,
        })
    }

    /// This will
    /// - validate that `attendance_home` exists and that the config file exists
    /// - load and validate the config file
    /// - return the loaded configuration object
    pub async fn load(attendance_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = attendance_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("Attendance home is missing, run 'attendance init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;
        let api_url = parse_api_url(&config_file.api_url)
            .with_context(|| format!("Bad api_url in '{}'", config_path.display()))?;

        Ok(Self {
            root,
            config_path,
            config_file,
            api_url,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// The analyzer API base URL, always ending in `/` so endpoints can be joined onto it.
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    pub fn default_page_size(&self) -> PageSize {
        self.config_file.default_page_size
    }

    /// Returns the configured exports directory, resolving a relative path against the home
    /// directory. Defaults to `$ATTENDANCE_HOME/exports`.
    pub fn exports_dir(&self) -> PathBuf {
        match &self.config_file.exports_dir {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => self.root.join(p),
            None => self.root.join(EXPORTS),
        }
    }
}

/// Parses and normalizes the API base URL. Only http and https are accepted and a trailing slash
/// is added if missing.
fn parse_api_url(s: &str) -> Result<Url> {
    let mut url = Url::parse(s.trim()).with_context(|| format!("Invalid API URL '{s}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("The API URL must use http or https, got '{}'", url.scheme());
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "attendance",
///   "config_version": 1,
///   "api_url": "http://localhost:8000/analyzer/",
///   "default_page_size": 25,
///   "exports_dir": "exports"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "attendance"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Base URL of the analyzer API
    api_url: String,

    /// Page size used when `--page-size` is not given, one of 10, 25, 50 or 100
    #[serde(default)]
    default_page_size: PageSize,

    /// Where exported workbooks are written (optional, relative to the home or absolute)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exports_dir: Option<PathBuf>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            api_url: String::new(),
            default_page_size: PageSize::default(),
            exports_dir: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if it belongs to another app.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path)
            .await
            .with_context(|| format!("Failed to load config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }
}
