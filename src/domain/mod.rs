//! Core domain types and logic.

pub mod daily_record;
pub mod dataset;
pub mod deriver;
pub mod formula;
pub mod formula_parser;
pub mod formula_eval;
pub mod series;
pub mod state;
pub mod explorer_config;
pub mod config_validation;
pub mod error;
