//! CSV file data adapter.
//!
//! Long format, one row per country and date:
//! `country,date,confirmed,deaths,recovered`. Rows are grouped by country in
//! file order.

use crate::domain::daily_record::RawRecord;
use crate::domain::dataset::RawDataset;
use crate::domain::error::ExplorerError;
use crate::ports::data_port::DataPort;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

/// A blank cell is a missing field; an unparseable cell is kept as text so
/// the deriver can name it when rejecting the country.
fn count_cell(cell: Option<&str>) -> Option<Value> {
    let cell = cell?.trim();
    if cell.is_empty() {
        return None;
    }
    Some(match cell.parse::<u64>() {
        Ok(n) => Value::from(n),
        Err(_) => Value::from(cell),
    })
}

pub fn parse_csv(content: &str) -> Result<RawDataset, ExplorerError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());
    let mut dataset = RawDataset::new();

    for result in rdr.records() {
        let record = result.map_err(|e| ExplorerError::DataSource {
            reason: format!("CSV parse error: {}", e),
        })?;

        let country = record
            .get(0)
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ExplorerError::DataSource {
                reason: format!(
                    "missing country column on line {}",
                    record.position().map(|p| p.line()).unwrap_or(0)
                ),
            })?;

        let raw = RawRecord {
            date: record
                .get(1)
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            confirmed: count_cell(record.get(2)),
            deaths: count_cell(record.get(3)),
            recovered: count_cell(record.get(4)),
        };

        dataset.entry(country.to_string()).or_default().push(raw);
    }

    Ok(dataset)
}

impl DataPort for CsvAdapter {
    fn fetch_dataset(&self) -> Result<RawDataset, ExplorerError> {
        let content = fs::read_to_string(&self.path).map_err(|e| ExplorerError::DataSource {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;
        parse_csv(&content)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::deriver::derive_all;
    use tempfile::TempDir;

    const SAMPLE: &str = "country,date,confirmed,deaths,recovered\n\
        France,2020-1-22,0,0,0\n\
        Italy,2020-1-22,0,0,0\n\
        France,2020-1-23,250,1,2\n\
        Italy,2020-1-23,5,0,0\n";

    #[test]
    fn fetch_dataset_groups_rows_by_country() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("timeseries.csv");
        fs::write(&path, SAMPLE).unwrap();

        let dataset = CsvAdapter::new(path).fetch_dataset().unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset["France"].len(), 2);
        assert_eq!(
            dataset["France"][1],
            RawRecord::new("2020-1-23", 250, 1, 2)
        );
        assert_eq!(dataset["Italy"][1].confirmed, Some(Value::from(5)));
    }

    #[test]
    fn blank_and_bad_cells_are_rejected_per_country() {
        let content = "country,date,confirmed,deaths,recovered\n\
            France,2020-1-22,0,,0\n\
            Italy,2020-1-22,abc,0,0\n\
            Spain,2020-1-22,300,0,0\n";
        let dataset = parse_csv(content).unwrap();
        assert!(dataset["France"][0].deaths.is_none());
        assert_eq!(dataset["Italy"][0].confirmed, Some(Value::from("abc")));

        let derived = derive_all(&dataset, 200);
        assert_eq!(derived.country_names().collect::<Vec<_>>(), vec!["Spain"]);
        assert_eq!(derived.skipped.len(), 2);
    }

    #[test]
    fn short_rows_become_missing_fields() {
        let dataset = parse_csv("country,date,confirmed,deaths,recovered\nFrance,2020-1-22,3\n").unwrap();
        assert_eq!(dataset["France"][0].confirmed, Some(Value::from(3)));
        assert!(dataset["France"][0].recovered.is_none());
    }

    #[test]
    fn missing_country_is_rejected() {
        let err = parse_csv("country,date,confirmed,deaths,recovered\n,2020-1-22,0,0,0\n").unwrap_err();
        assert!(err.to_string().contains("missing country"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let adapter = CsvAdapter::new(PathBuf::from("/nonexistent/timeseries.csv"));
        assert!(adapter.fetch_dataset().is_err());
    }
}
