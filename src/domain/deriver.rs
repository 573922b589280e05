//! Time-series derivation: rate fields and relative day alignment.
//!
//! Single forward pass per country:
//! - record 0 gets zero rates, later records `current - previous`
//! - the first record with `confirmed >= threshold` is the crossing point `c`
//! - every record `i >= c` gets `relative_days_after_n_confirmed = i - c`

use crate::domain::daily_record::{DailyRecord, RawRecord};
use crate::domain::dataset::{DerivedDataset, RawDataset, SkippedCountry};
use crate::domain::error::ExplorerError;
use chrono::NaiveDate;
use rayon::prelude::*;
use serde_json::Value;

pub const DEFAULT_THRESHOLD: u64 = 200;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Largest accepted count. Rates are signed differences of two counts and
/// must fit in an `i64`.
const MAX_COUNT: u64 = i64::MAX as u64;

pub fn derive_series(
    country: &str,
    raw: &[RawRecord],
    threshold: u64,
) -> Result<Vec<DailyRecord>, ExplorerError> {
    let mut out: Vec<DailyRecord> = Vec::with_capacity(raw.len());
    let mut crossing: Option<usize> = None;

    for (i, rec) in raw.iter().enumerate() {
        let mut current = validate(country, i, rec)?;

        if let Some(prev) = out.last() {
            if current.date < prev.date {
                return Err(malformed(
                    country,
                    i,
                    format!(
                        "date {} precedes previous record {}",
                        current.date_label, prev.date_label
                    ),
                ));
            }
            let (c, d, r) = current.deltas_from(prev);
            current.confirmed_rate = c;
            current.deaths_rate = d;
            current.recovered_rate = r;
        }

        if crossing.is_none() && current.confirmed >= threshold {
            crossing = Some(i);
        }
        if let Some(c) = crossing {
            current.relative_days_after_n_confirmed = Some((i - c) as u32);
        }

        out.push(current);
    }

    Ok(out)
}

/// Derive every country independently. Malformed countries are logged and
/// reported in `skipped`; the others are kept.
pub fn derive_all(dataset: &RawDataset, threshold: u64) -> DerivedDataset {
    let results: Vec<(String, Result<Vec<DailyRecord>, ExplorerError>)> = dataset
        .par_iter()
        .map(|(country, raw)| (country.clone(), derive_series(country, raw, threshold)))
        .collect();

    let mut derived = DerivedDataset::default();
    for (country, result) in results {
        match result {
            Ok(series) => {
                derived.countries.insert(country, series);
            }
            Err(error) => {
                log::warn!("skipping {} ({})", country, error);
                derived.skipped.push(SkippedCountry { country, error });
            }
        }
    }
    derived
}

fn validate(country: &str, index: usize, rec: &RawRecord) -> Result<DailyRecord, ExplorerError> {
    let date_label = rec
        .date
        .as_deref()
        .ok_or_else(|| malformed(country, index, "missing field 'date'".into()))?;
    let date = NaiveDate::parse_from_str(date_label.trim(), DATE_FORMAT).map_err(|e| {
        malformed(
            country,
            index,
            format!("invalid date '{}': {}", date_label, e),
        )
    })?;

    Ok(DailyRecord {
        date,
        date_label: date_label.to_string(),
        confirmed: count_field(country, index, "confirmed", rec.confirmed.as_ref())?,
        deaths: count_field(country, index, "deaths", rec.deaths.as_ref())?,
        recovered: count_field(country, index, "recovered", rec.recovered.as_ref())?,
        confirmed_rate: 0,
        deaths_rate: 0,
        recovered_rate: 0,
        relative_days_after_n_confirmed: None,
    })
}

fn count_field(
    country: &str,
    index: usize,
    field: &str,
    value: Option<&Value>,
) -> Result<u64, ExplorerError> {
    match value {
        None => Err(malformed(country, index, format!("missing field '{}'", field))),
        Some(v) => v
            .as_u64()
            .filter(|&n| n <= MAX_COUNT)
            .ok_or_else(|| {
                malformed(
                    country,
                    index,
                    format!(
                        "field '{}' must be an integer between 0 and {}, found {}",
                        field, MAX_COUNT, v
                    ),
                )
            }),
    }
}

fn malformed(country: &str, index: usize, reason: String) -> ExplorerError {
    ExplorerError::MalformedInput {
        country: country.to_string(),
        index,
        reason,
    }
}
