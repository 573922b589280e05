//! Chart output port trait.

use crate::domain::error::ExplorerError;
use crate::domain::series::{ChartSeries, TimeOrigin};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct ChartOptions {
    pub title: String,
    pub log_scale: bool,
    pub time_origin: TimeOrigin,
    pub threshold: u64,
}

/// Port for writing chart series.
pub trait ReportPort {
    fn render(&self, series: &[ChartSeries], options: &ChartOptions) -> Result<String, ExplorerError>;

    /// Default implementation: renders and writes the result to `output_path`.
    fn write(
        &self,
        series: &[ChartSeries],
        options: &ChartOptions,
        output_path: &Path,
    ) -> Result<(), ExplorerError> {
        let content = self.render(series, options)?;
        fs::write(output_path, content).map_err(|e| ExplorerError::Report {
            reason: format!("failed to write {}: {}", output_path.display(), e),
        })
    }
}
