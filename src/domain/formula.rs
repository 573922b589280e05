//! Formula AST data structures.
//!
//! - `Metric`: one of the six per-day inputs a formula may reference
//! - `BinaryOp`: the four arithmetic operators
//! - `Expr`: the expression tree produced by the formula parser

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Confirmed,
    Deaths,
    Recovered,
    ConfirmedRate,
    DeathsRate,
    RecoveredRate,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::Confirmed,
        Metric::Deaths,
        Metric::Recovered,
        Metric::ConfirmedRate,
        Metric::DeathsRate,
        Metric::RecoveredRate,
    ];

    /// The identifier used for this metric in formula text.
    pub fn name(self) -> &'static str {
        match self {
            Metric::Confirmed => "confirmed",
            Metric::Deaths => "deaths",
            Metric::Recovered => "recovered",
            Metric::ConfirmedRate => "confirmedRate",
            Metric::DeathsRate => "deathsRate",
            Metric::RecoveredRate => "recoveredRate",
        }
    }

    pub fn from_name(name: &str) -> Option<Metric> {
        Metric::ALL.into_iter().find(|m| m.name() == name)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    fn symbol(self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Sub => '-',
            BinaryOp::Mul => '*',
            BinaryOp::Div => '/',
        }
    }

    fn precedence(self) -> u8 {
        match self {
            BinaryOp::Add | BinaryOp::Sub => 1,
            BinaryOp::Mul | BinaryOp::Div => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Variable(Metric),
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Metrics referenced anywhere in the expression, in first-use order.
    pub fn metrics(&self) -> Vec<Metric> {
        let mut out = Vec::new();
        self.collect_metrics(&mut out);
        out
    }

    fn collect_metrics(&self, out: &mut Vec<Metric>) {
        match self {
            Expr::Number(_) => {}
            Expr::Variable(m) => {
                if !out.contains(m) {
                    out.push(*m);
                }
            }
            Expr::Neg(inner) => inner.collect_metrics(out),
            Expr::Binary { left, right, .. } => {
                left.collect_metrics(out);
                right.collect_metrics(out);
            }
        }
    }

    fn fmt_with_parent(&self, f: &mut fmt::Formatter<'_>, parent: u8, right_side: bool) -> fmt::Result {
        match self {
            Expr::Number(v) => write!(f, "{}", v),
            Expr::Variable(m) => write!(f, "{}", m),
            Expr::Neg(inner) => {
                f.write_str("-")?;
                inner.fmt_with_parent(f, 3, false)
            }
            Expr::Binary { op, left, right } => {
                let prec = op.precedence();
                // Left-associative: equal precedence on the right needs parens.
                let parens = prec < parent || (right_side && prec == parent);
                if parens {
                    f.write_str("(")?;
                }
                left.fmt_with_parent(f, prec, false)?;
                write!(f, " {} ", op.symbol())?;
                right.fmt_with_parent(f, prec, true)?;
                if parens {
                    f.write_str(")")?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_with_parent(f, 0, false)
    }
}

/// A user-defined formula as stored in the dashboard state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaSpec {
    #[serde(rename = "value")]
    pub expression: String,
    pub enabled: bool,
}

impl FormulaSpec {
    pub fn new(expression: &str, enabled: bool) -> Self {
        Self {
            expression: expression.to_string(),
            enabled,
        }
    }

    /// Enabled with a non-blank expression.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.expression.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_round_trip() {
        for m in Metric::ALL {
            assert_eq!(Metric::from_name(m.name()), Some(m));
        }
        assert_eq!(Metric::from_name("Confirmed"), None);
        assert_eq!(Metric::from_name("population"), None);
    }

    #[test]
    fn display_adds_only_needed_parens() {
        let expr = Expr::binary(
            BinaryOp::Sub,
            Expr::Variable(Metric::Confirmed),
            Expr::binary(
                BinaryOp::Sub,
                Expr::Variable(Metric::Recovered),
                Expr::Variable(Metric::Deaths),
            ),
        );
        assert_eq!(expr.to_string(), "confirmed - (recovered - deaths)");

        let expr = Expr::binary(
            BinaryOp::Add,
            Expr::binary(BinaryOp::Mul, Expr::Number(2.0), Expr::Variable(Metric::Deaths)),
            Expr::Number(1.5),
        );
        assert_eq!(expr.to_string(), "2 * deaths + 1.5");
    }

    #[test]
    fn display_negation() {
        let expr = Expr::Neg(Box::new(Expr::binary(
            BinaryOp::Add,
            Expr::Variable(Metric::DeathsRate),
            Expr::Number(1.0),
        )));
        assert_eq!(expr.to_string(), "-(deathsRate + 1)");
    }

    #[test]
    fn metrics_are_deduplicated_in_order() {
        let expr = Expr::binary(
            BinaryOp::Div,
            Expr::Variable(Metric::Deaths),
            Expr::binary(
                BinaryOp::Add,
                Expr::Variable(Metric::Confirmed),
                Expr::Variable(Metric::Deaths),
            ),
        );
        assert_eq!(expr.metrics(), vec![Metric::Deaths, Metric::Confirmed]);
    }

    #[test]
    fn formula_spec_activity() {
        assert!(FormulaSpec::new("confirmed", true).is_active());
        assert!(!FormulaSpec::new("confirmed", false).is_active());
        assert!(!FormulaSpec::new("   ", true).is_active());
        assert!(!FormulaSpec::new("", true).is_active());
    }

    #[test]
    fn formula_spec_serializes_like_stored_state() {
        let json = serde_json::to_string(&FormulaSpec::new("deaths", false)).unwrap();
        assert_eq!(json, r#"{"value":"deaths","enabled":false}"#);
    }
}
