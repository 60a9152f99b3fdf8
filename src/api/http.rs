//! Implements the `Analyzer` trait against the analyzer HTTP API.

use crate::api::{
    Analyzer, PagedRecords, UploadOutcome, ARCHDEACONRIES, CONGREGATIONS, DASHBOARD, PARISHES,
    RECORDS, UPLOAD_WORKBOOK,
};
use crate::model::{
    Archdeaconry, Congregation, Dashboard, Filters, Hierarchy, PageSize, Parish, Record,
};
use crate::upload::WorkbookFile;
use crate::Result;
use anyhow::Context;
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

/// Requested as the page size when every matching record is wanted.
const ALL_RECORDS: &str = "all";

pub struct HttpAnalyzer {
    base: Url,
    client: reqwest::Client,
}

impl HttpAnalyzer {
    /// `base` must end in `/`, which `Config` guarantees.
    pub fn new(base: Url) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Unable to build the HTTP client")?;
        Ok(Self { base, client })
    }

    /// Builds `{base}{endpoint}?{pairs}`.
    fn endpoint_url(&self, endpoint: &str, pairs: &[(&str, String)]) -> Result<Url> {
        let mut url = self
            .base
            .join(endpoint)
            .with_context(|| format!("Unable to build the URL for '{endpoint}'"))?;
        if !pairs.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(pairs.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    /// Sends a GET without looking at the status.
    async fn get(&self, endpoint: &str, pairs: &[(&str, String)]) -> Result<Response> {
        let url = self.endpoint_url(endpoint, pairs)?;
        trace!("GET {url}");
        self.client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to send request to '{endpoint}'"))
    }

    async fn get_json<T>(&self, endpoint: &str, pairs: &[(&str, String)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self.get(endpoint, pairs).await?;
        let response = check_status(endpoint, response).await?;
        parse_json(endpoint, response).await
    }

    fn records_query(
        filters: &Filters,
        page: u32,
        page_size: impl ToString,
    ) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", page.to_string()),
            ("pageSize", page_size.to_string()),
        ];
        pairs.extend(filters.query_pairs());
        pairs
    }
}

async fn parse_json<T>(endpoint: &str, response: Response) -> Result<T>
where
    T: DeserializeOwned,
{
    response
        .json()
        .await
        .with_context(|| format!("Failed to parse the response from '{endpoint}'"))
}

/// Turns a non-2xx response into an error carrying the status and body.
async fn check_status(endpoint: &str, response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read response body".to_string());
    anyhow::bail!("Request to '{endpoint}' failed with status {status}: {body}")
}

#[async_trait::async_trait]
impl Analyzer for HttpAnalyzer {
    async fn fetch_paged_records(
        &self,
        filters: &Filters,
        page: u32,
        page_size: PageSize,
    ) -> Result<PagedRecords> {
        let pairs = Self::records_query(filters, page, page_size);
        self.get_json(RECORDS, &pairs).await
    }

    async fn fetch_all_records(&self, filters: &Filters) -> Result<Vec<Record>> {
        let pairs = Self::records_query(filters, 1, ALL_RECORDS);
        let response: PagedRecords = self.get_json(RECORDS, &pairs).await?;
        Ok(response.records)
    }

    async fn fetch_hierarchy(&self) -> Result<Hierarchy> {
        let (archdeaconries, parishes, congregations) = tokio::try_join!(
            self.get_json::<Vec<Archdeaconry>>(ARCHDEACONRIES, &[]),
            self.get_json::<Vec<Parish>>(PARISHES, &[]),
            self.get_json::<Vec<Congregation>>(CONGREGATIONS, &[]),
        )?;
        Ok(Hierarchy {
            archdeaconries,
            parishes,
            congregations,
        })
    }

    async fn fetch_dashboard(&self, filters: &Filters) -> Result<Option<Dashboard>> {
        let response = self.get(DASHBOARD, &filters.query_pairs()).await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!("The analyzer has no dashboard data for {filters:?}");
            return Ok(None);
        }
        let response = check_status(DASHBOARD, response).await?;
        parse_json(DASHBOARD, response).await.map(Some)
    }

    async fn upload_workbooks(&self, files: Vec<WorkbookFile>) -> Result<Vec<UploadOutcome>> {
        let url = self.endpoint_url(UPLOAD_WORKBOOK, &[])?;
        let mut form = Form::new();
        for file in files {
            let mime = file.mime_type();
            let (name, bytes) = file.into_parts();
            let part = Part::bytes(bytes)
                .file_name(name.clone())
                .mime_str(mime)
                .with_context(|| format!("Bad content type for '{name}'"))?;
            form = form.part("files", part);
        }

        trace!("POST {url}");
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("Failed to send request to '{UPLOAD_WORKBOOK}'"))?;
        let response = check_status(UPLOAD_WORKBOOK, response).await?;
        parse_json(UPLOAD_WORKBOOK, response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn analyzer() -> HttpAnalyzer {
        HttpAnalyzer::new(Url::parse("http://localhost:8000/analyzer/").unwrap()).unwrap()
    }

    #[test]
    fn test_endpoint_url_without_query() {
        let url = analyzer().endpoint_url(PARISHES, &[]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/analyzer/parishes/");
    }

    #[test]
    fn test_records_query() {
        let filters = Filters::with(
            Some(2),
            None,
            None,
            NaiveDate::from_ymd_opt(2024, 1, 1),
            None,
        );
        let pairs = HttpAnalyzer::records_query(&filters, 3, PageSize::TwentyFive);
        let url = analyzer().endpoint_url(RECORDS, &pairs).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/analyzer/records/?page=3&pageSize=25&archdeaconry=2&start_date=2024-01-01"
        );
    }

    #[test]
    fn test_dashboard_query() {
        let filters = Filters::with(
            None,
            Some(3),
            None,
            None,
            NaiveDate::from_ymd_opt(2024, 2, 11),
        );
        let url = analyzer()
            .endpoint_url(DASHBOARD, &filters.query_pairs())
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/analyzer/dashboard/?parish=3&end_date=2024-02-11"
        );
    }

    #[test]
    fn test_all_records_query() {
        let pairs = HttpAnalyzer::records_query(&Filters::new(), 1, ALL_RECORDS);
        assert_eq!(pairs[1], ("pageSize", "all".to_string()));
    }
}
