//! Formula evaluation engine.
//!
//! Evaluates a compiled formula against the six per-day metric values.
//!
//! # Evaluation Semantics
//!
//! - Arithmetic is plain IEEE-754 `f64`
//! - A NaN or infinite result (for example a division by zero) yields `0.0`
//! - Finite fractional results are returned unmodified
//! - Nothing but the supplied `MetricValues` is reachable from a formula

use crate::domain::daily_record::DailyRecord;
use crate::domain::error::ParseError;
use crate::domain::formula::{BinaryOp, Expr, Metric};
use crate::domain::formula_parser;
use std::fmt;

/// The six named inputs of one data point.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricValues {
    pub confirmed: f64,
    pub deaths: f64,
    pub recovered: f64,
    pub confirmed_rate: f64,
    pub deaths_rate: f64,
    pub recovered_rate: f64,
}

impl MetricValues {
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Confirmed => self.confirmed,
            Metric::Deaths => self.deaths,
            Metric::Recovered => self.recovered,
            Metric::ConfirmedRate => self.confirmed_rate,
            Metric::DeathsRate => self.deaths_rate,
            Metric::RecoveredRate => self.recovered_rate,
        }
    }
}

impl From<&DailyRecord> for MetricValues {
    fn from(r: &DailyRecord) -> Self {
        Self {
            confirmed: r.confirmed as f64,
            deaths: r.deaths as f64,
            recovered: r.recovered as f64,
            confirmed_rate: r.confirmed_rate as f64,
            deaths_rate: r.deaths_rate as f64,
            recovered_rate: r.recovered_rate as f64,
        }
    }
}

/// Evaluate without the non-finite fallback.
pub fn evaluate(expr: &Expr, values: &MetricValues) -> f64 {
    match expr {
        Expr::Number(v) => *v,
        Expr::Variable(m) => values.get(*m),
        Expr::Neg(inner) => -evaluate(inner, values),
        Expr::Binary { op, left, right } => {
            let l = evaluate(left, values);
            let r = evaluate(right, values);
            match op {
                BinaryOp::Add => l + r,
                BinaryOp::Sub => l - r,
                BinaryOp::Mul => l * r,
                BinaryOp::Div => l / r,
            }
        }
    }
}

/// A formula parsed once from user text, ready for per-point evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFormula {
    source: String,
    expr: Expr,
}

impl CompiledFormula {
    pub fn compile(source: &str) -> Result<Self, ParseError> {
        let expr = formula_parser::parse(source)?;
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn evaluate(&self, values: &MetricValues) -> f64 {
        let v = evaluate(&self.expr, values);
        if v.is_finite() { v } else { 0.0 }
    }

    pub fn evaluate_record(&self, record: &DailyRecord) -> f64 {
        self.evaluate(&MetricValues::from(record))
    }
}

impl fmt::Display for CompiledFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)
    }
}
