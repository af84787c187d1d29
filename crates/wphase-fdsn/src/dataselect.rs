use async_trait::async_trait;
use reqwest::StatusCode;
use wphase_core::config::AcquisitionConfig;
use wphase_core::error::{Result, WphaseError};
use wphase_core::models::Trace;
use wphase_core::ports::{BulkRequestLine, WaveformArchive};

use crate::mseed::decode_records;

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// FDSN dataselect client using the bulk POST interface
pub struct FdsnDataselectClient {
    /// Base URL of the data centre (e.g., "http://service.iris.edu")
    base_url: String,

    /// Full query URL
    query_url: String,

    client: reqwest::Client,
}

impl FdsnDataselectClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let query_url = format!("{}/fdsnws/dataselect/1/query", base_url);
        Self { base_url, query_url, client: reqwest::Client::new() }
    }

    pub fn from_config(config: &AcquisitionConfig) -> Self {
        Self::new(config.server.value.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Render request lines as an FDSN bulk request body.
///
/// An empty location code is written as `--`.
pub fn format_bulk_body(lines: &[BulkRequestLine]) -> String {
    let mut body = String::new();
    for line in lines {
        let location = if line.location.is_empty() { "--" } else { line.location.as_str() };
        body.push_str(&format!(
            "{} {} {} {} {} {}\n",
            line.network,
            line.station,
            location,
            line.channel,
            line.start.format(TIME_FORMAT),
            line.end.format(TIME_FORMAT),
        ));
    }
    body
}

#[async_trait]
impl WaveformArchive for FdsnDataselectClient {
    async fn fetch_bulk(&self, lines: &[BulkRequestLine]) -> Result<Vec<Trace>> {
        if lines.is_empty() {
            return Ok(Vec::new());
        }

        let remote_error = |reason: String| WphaseError::RemoteFetch { endpoint: self.query_url.clone(), reason };

        let response = self
            .client
            .post(&self.query_url)
            .body(format_bulk_body(lines))
            .send()
            .await
            .map_err(|e| remote_error(format!("request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT || status == StatusCode::NOT_FOUND {
            tracing::debug!(endpoint = %self.query_url, lines = lines.len(), "No data for request");
            return Ok(Vec::new());
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(remote_error(format!("HTTP {}: {}", status, error_text.trim())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| remote_error(format!("failed to read response body: {}", e)))?;

        let traces = decode_records(&bytes);
        tracing::debug!(
            endpoint = %self.query_url,
            lines = lines.len(),
            bytes = bytes.len(),
            traces = traces.len(),
            "Bulk request complete"
        );
        Ok(traces)
    }

    fn endpoint(&self) -> &str {
        &self.query_url
    }
}
