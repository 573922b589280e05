//! Resolved explorer configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_URL: &str = "https://pomber.github.io/covid19/timeseries.json";

#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    Json(PathBuf),
    Csv(PathBuf),
    Http(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Csv,
    #[default]
    Svg,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Svg => "svg",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "svg" => Ok(OutputFormat::Svg),
            other => Err(format!(
                "unknown output format '{}' (expected json, csv or svg)",
                other
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExplorerConfig {
    pub source: DataSource,
    pub threshold: u64,
    pub state_file: PathBuf,
    pub output_format: OutputFormat,
    pub output_path: Option<PathBuf>,
}

impl ExplorerConfig {
    /// Configured output path, or `chart.<ext>` for the given format.
    pub fn output_path_for(&self, format: OutputFormat) -> PathBuf {
        self.output_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("chart.{}", format.extension())))
    }
}
