//! Plain data writers for chart series: JSON and long-format CSV.

use crate::domain::error::ExplorerError;
use crate::domain::series::ChartSeries;
use crate::ports::report_port::{ChartOptions, ReportPort};
use serde::Serialize;

pub struct JsonSeriesWriter;

#[derive(Serialize)]
struct JsonDocument<'a> {
    title: &'a str,
    log_scale: bool,
    time_origin: String,
    threshold: u64,
    series: &'a [ChartSeries],
}

impl ReportPort for JsonSeriesWriter {
    fn render(&self, series: &[ChartSeries], options: &ChartOptions) -> Result<String, ExplorerError> {
        let doc = JsonDocument {
            title: &options.title,
            log_scale: options.log_scale,
            time_origin: options.time_origin.to_string(),
            threshold: options.threshold,
            series,
        };
        serde_json::to_string_pretty(&doc).map_err(|e| ExplorerError::Report {
            reason: format!("failed to serialize series: {}", e),
        })
    }
}

pub struct CsvSeriesWriter;

impl ReportPort for CsvSeriesWriter {
    fn render(&self, series: &[ChartSeries], _options: &ChartOptions) -> Result<String, ExplorerError> {
        let report_err = |e: csv::Error| ExplorerError::Report {
            reason: format!("CSV write error: {}", e),
        };

        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(["series", "country", "formula", "x", "y"])
            .map_err(report_err)?;
        for s in series {
            for p in &s.points {
                let x = p.x.to_string();
                let y = p.y.to_string();
                wtr.write_record([
                    s.name.as_str(),
                    s.country.as_str(),
                    s.formula.as_str(),
                    x.as_str(),
                    y.as_str(),
                ])
                .map_err(report_err)?;
            }
        }

        let bytes = wtr.into_inner().map_err(|e| ExplorerError::Report {
            reason: format!("CSV flush error: {}", e),
        })?;
        String::from_utf8(bytes).map_err(|e| ExplorerError::Report {
            reason: format!("CSV output is not UTF-8: {}", e),
        })
    }
}
