//! Per-country daily records, raw and derived.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of the input dataset, before validation.
///
/// Every field is optional so that a single bad record rejects only its own
/// country instead of the whole document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawRecord {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub confirmed: Option<Value>,
    #[serde(default)]
    pub deaths: Option<Value>,
    #[serde(default)]
    pub recovered: Option<Value>,
}

impl RawRecord {
    pub fn new(date: &str, confirmed: u64, deaths: u64, recovered: u64) -> Self {
        Self {
            date: Some(date.to_string()),
            confirmed: Some(Value::from(confirmed)),
            deaths: Some(Value::from(deaths)),
            recovered: Some(Value::from(recovered)),
        }
    }
}

/// A validated record augmented with rate fields and the relative day index.
/// Counts never exceed `i64::MAX`.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub date_label: String,
    pub confirmed: u64,
    pub deaths: u64,
    pub recovered: u64,
    pub confirmed_rate: i64,
    pub deaths_rate: i64,
    pub recovered_rate: i64,
    pub relative_days_after_n_confirmed: Option<u32>,
}

impl DailyRecord {
    /// Signed difference of the three cumulative counts against `prev`.
    pub fn deltas_from(&self, prev: &DailyRecord) -> (i64, i64, i64) {
        (
            delta(self.confirmed, prev.confirmed),
            delta(self.deaths, prev.deaths),
            delta(self.recovered, prev.recovered),
        )
    }
}

fn delta(current: u64, previous: u64) -> i64 {
    current as i64 - previous as i64
}
