//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod file_config_adapter;
pub mod file_state_adapter;
#[cfg(feature = "http")]
pub mod http_adapter;
pub mod json_adapter;
pub mod series_writer;
pub mod svg_chart;
