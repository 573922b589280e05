#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use covid_explorer::domain::dataset::RawDataset;
pub use covid_explorer::domain::daily_record::RawRecord;
use covid_explorer::domain::error::ExplorerError;
use covid_explorer::ports::data_port::DataPort;
use std::io::Write;

pub struct MockDataPort {
    pub data: RawDataset,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: RawDataset::new(),
            error: None,
        }
    }

    pub fn with_country(mut self, country: &str, records: Vec<RawRecord>) -> Self {
        self.data.insert(country.to_string(), records);
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_dataset(&self) -> Result<RawDataset, ExplorerError> {
        if let Some(reason) = &self.error {
            return Err(ExplorerError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self.data.clone())
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}

/// Daily records from 2020-1-1 with the given confirmed counts; deaths and
/// recovered are a tenth and a half of confirmed.
pub fn make_records(confirmed: &[u64]) -> Vec<RawRecord> {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    confirmed
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let date = start + Duration::days(i as i64);
            RawRecord::new(&date.format("%Y-%-m-%-d").to_string(), c, c / 10, c / 2)
        })
        .collect()
}

pub fn sample_port() -> MockDataPort {
    MockDataPort::new()
        .with_country("France", make_records(&[0, 100, 250, 400, 800]))
        .with_country("US", make_records(&[50, 200, 300, 500, 1000]))
        .with_country("China", make_records(&[500, 600, 700, 800, 900]))
        .with_country("Ghana", make_records(&[0, 1, 2, 3, 4]))
}

pub fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
