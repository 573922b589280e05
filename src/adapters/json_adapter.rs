//! JSON file data adapter.
//!
//! Reads the `country -> [{date, confirmed, deaths, recovered}]` document
//! published by pomber/covid19 as `timeseries.json`.

use crate::domain::dataset::RawDataset;
use crate::domain::error::ExplorerError;
use crate::ports::data_port::DataPort;
use std::fs;
use std::path::PathBuf;

pub struct JsonFileAdapter {
    path: PathBuf,
}

impl JsonFileAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

/// Deserialize a dataset document. Record-level problems are left for the
/// deriver; only a document that is not a map of arrays fails here.
pub fn parse_dataset(content: &str) -> Result<RawDataset, ExplorerError> {
    serde_json::from_str(content).map_err(|e| ExplorerError::DataSource {
        reason: format!("invalid dataset JSON: {}", e),
    })
}

impl DataPort for JsonFileAdapter {
    fn fetch_dataset(&self) -> Result<RawDataset, ExplorerError> {
        let content = fs::read_to_string(&self.path).map_err(|e| ExplorerError::DataSource {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;
        parse_dataset(&content)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
