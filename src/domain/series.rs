//! Chart series assembly: one named `(x, y)` series per country and formula.

use crate::domain::dataset::DerivedDataset;
use crate::domain::error::ExplorerError;
use crate::domain::formula::FormulaSpec;
use crate::domain::formula_eval::CompiledFormula;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOrigin {
    /// x is the calendar date.
    #[default]
    Absolute,
    /// x is the number of days since the crossing point.
    Relative,
}

impl FromStr for TimeOrigin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "absolute" => Ok(TimeOrigin::Absolute),
            "relative" => Ok(TimeOrigin::Relative),
            other => Err(format!(
                "unknown time origin '{}' (expected absolute or relative)",
                other
            )),
        }
    }
}

impl fmt::Display for TimeOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeOrigin::Absolute => f.write_str("absolute"),
            TimeOrigin::Relative => f.write_str("relative"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum XValue {
    Date(String),
    Day(u32),
}

impl fmt::Display for XValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XValue::Date(d) => f.write_str(d),
            XValue::Day(n) => write!(f, "{}", n),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: XValue,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub name: String,
    pub country: String,
    pub formula: String,
    pub points: Vec<ChartPoint>,
}

/// Compile every active spec. The first invalid expression aborts with its
/// compile error.
pub fn compile_active(specs: &[FormulaSpec]) -> Result<Vec<CompiledFormula>, ExplorerError> {
    specs
        .iter()
        .filter(|s| s.is_active())
        .map(|s| CompiledFormula::compile(&s.expression).map_err(ExplorerError::from))
        .collect()
}

/// Series for each selected country (in selection order) crossed with each
/// formula (in order). Unknown countries are skipped with a warning.
pub fn build_series(
    dataset: &DerivedDataset,
    countries: &[String],
    formulas: &[CompiledFormula],
    origin: TimeOrigin,
) -> Vec<ChartSeries> {
    let pairs: Vec<(&str, &CompiledFormula)> = countries
        .iter()
        .filter(|c| {
            let known = dataset.get(c).is_some();
            if !known {
                log::warn!("selected country {} not in dataset", c);
            }
            known
        })
        .flat_map(|c| formulas.iter().map(move |f| (c.as_str(), f)))
        .collect();

    pairs
        .par_iter()
        .map(|&(country, formula)| build_one(dataset, country, formula, origin))
        .collect()
}

fn build_one(
    dataset: &DerivedDataset,
    country: &str,
    formula: &CompiledFormula,
    origin: TimeOrigin,
) -> ChartSeries {
    let records = dataset.get(country).unwrap_or(&[]);
    let points = records
        .iter()
        .filter_map(|r| {
            let x = match origin {
                TimeOrigin::Absolute => XValue::Date(r.date_label.clone()),
                TimeOrigin::Relative => XValue::Day(r.relative_days_after_n_confirmed?),
            };
            Some(ChartPoint {
                x,
                y: formula.evaluate_record(r),
            })
        })
        .collect();

    ChartSeries {
        name: format!("{} - {}", country, formula.source()),
        country: country.to_string(),
        formula: formula.source().to_string(),
        points,
    }
}
