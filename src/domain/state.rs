//! Dashboard state snapshot and its pure reducer.
//!
//! The state is never mutated in place: `reduce` returns the next snapshot or
//! an error, leaving the input untouched. Persisting the result is the
//! caller's job (see `ports::state_port`).

use crate::domain::error::ExplorerError;
use crate::domain::formula::FormulaSpec;
use crate::domain::formula_eval::CompiledFormula;
use crate::domain::series::TimeOrigin;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DashboardState {
    pub version: u32,
    pub log_scale: bool,
    pub selected_countries: Vec<String>,
    pub time_origin: TimeOrigin,
    pub formulas: Vec<FormulaSpec>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            version: 0,
            log_scale: false,
            selected_countries: vec!["France".into(), "US".into(), "China".into()],
            time_origin: TimeOrigin::Absolute,
            formulas: vec![
                FormulaSpec::new("confirmed", true),
                FormulaSpec::new("deaths", false),
                FormulaSpec::new("recovered", false),
                FormulaSpec::new("confirmedRate", false),
                FormulaSpec::new("confirmed - (recovered - deaths)", true),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    AddFormula {
        expression: String,
    },
    EditFormula {
        index: usize,
        expression: String,
        enabled: bool,
    },
    DeleteFormula {
        index: usize,
    },
    SetTimeOrigin(TimeOrigin),
    ToggleCountry(String),
    SetLogScale(bool),
}

pub fn reduce(state: &DashboardState, action: Action) -> Result<DashboardState, ExplorerError> {
    let mut next = state.clone();
    match action {
        Action::AddFormula { expression } => {
            check_expression(&expression)?;
            next.formulas.push(FormulaSpec {
                expression,
                enabled: true,
            });
        }
        Action::EditFormula {
            index,
            expression,
            enabled,
        } => {
            check_expression(&expression)?;
            let slot = formula_slot(&mut next, index)?;
            slot.expression = expression;
            slot.enabled = enabled;
        }
        Action::DeleteFormula { index } => {
            formula_slot(&mut next, index)?;
            next.formulas.remove(index);
        }
        Action::SetTimeOrigin(origin) => next.time_origin = origin,
        Action::ToggleCountry(country) => {
            match next.selected_countries.iter().position(|c| *c == country) {
                Some(pos) => {
                    next.selected_countries.remove(pos);
                }
                None => next.selected_countries.push(country),
            }
        }
        Action::SetLogScale(on) => next.log_scale = on,
    }
    Ok(next)
}

/// Blank expressions are allowed (an inactive placeholder); anything else
/// must compile.
fn check_expression(expression: &str) -> Result<(), ExplorerError> {
    if expression.trim().is_empty() {
        return Ok(());
    }
    CompiledFormula::compile(expression)?;
    Ok(())
}

fn formula_slot(state: &mut DashboardState, index: usize) -> Result<&mut FormulaSpec, ExplorerError> {
    let len = state.formulas.len();
    state.formulas.get_mut(index).ok_or_else(|| ExplorerError::State {
        reason: format!("formula index {} out of range ({} formulas)", index, len),
    })
}
