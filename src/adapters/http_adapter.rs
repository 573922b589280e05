//! HTTP data adapter (feature `http`).

use crate::adapters::json_adapter::parse_dataset;
use crate::domain::dataset::RawDataset;
use crate::domain::error::ExplorerError;
use crate::ports::data_port::DataPort;
use std::time::Duration;

pub struct HttpAdapter {
    url: String,
    client: reqwest::blocking::Client,
}

impl HttpAdapter {
    pub fn new(url: &str) -> Result<Self, ExplorerError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| ExplorerError::DataSource {
                reason: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self {
            url: url.to_string(),
            client,
        })
    }
}

impl DataPort for HttpAdapter {
    fn fetch_dataset(&self) -> Result<RawDataset, ExplorerError> {
        log::info!("fetching {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| ExplorerError::DataSource {
                reason: format!("GET {} failed: {}", self.url, e),
            })?;
        let body = response.text().map_err(|e| ExplorerError::DataSource {
            reason: format!("failed to read body from {}: {}", self.url, e),
        })?;
        parse_dataset(&body)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}
