//! Whole-dataset containers: the raw document and its derived form.

use crate::domain::daily_record::{DailyRecord, RawRecord};
use crate::domain::error::ExplorerError;
use std::collections::BTreeMap;

/// Country name to its raw records, in source order.
pub type RawDataset = BTreeMap<String, Vec<RawRecord>>;

#[derive(Debug)]
pub struct SkippedCountry {
    pub country: String,
    pub error: ExplorerError,
}

#[derive(Debug, Default)]
pub struct DerivedDataset {
    pub countries: BTreeMap<String, Vec<DailyRecord>>,
    pub skipped: Vec<SkippedCountry>,
}

impl DerivedDataset {
    pub fn country_count(&self) -> usize {
        self.countries.len()
    }

    pub fn get(&self, country: &str) -> Option<&[DailyRecord]> {
        self.countries.get(country).map(Vec::as_slice)
    }

    pub fn country_names(&self) -> impl Iterator<Item = &str> {
        self.countries.keys().map(String::as_str)
    }

    /// Index and record of the first point aligned at relative day 0, if the
    /// country ever reached the threshold.
    pub fn crossing_point(&self, country: &str) -> Option<(usize, &DailyRecord)> {
        self.get(country)?
            .iter()
            .enumerate()
            .find(|(_, r)| r.relative_days_after_n_confirmed == Some(0))
    }
}
