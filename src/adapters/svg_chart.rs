//! Standalone SVG line chart writer.
//!
//! One polyline per series. Colours follow the turbo colour map per country,
//! with opacity ramped from 0.5 to 1.0 across that country's formulas. On a
//! log scale, non-positive values cannot be placed and are dropped.

use crate::domain::error::ExplorerError;
use crate::domain::series::{ChartSeries, TimeOrigin, XValue};
use crate::ports::report_port::{ChartOptions, ReportPort};
use chrono::NaiveDate;
use std::fmt::Write;

const WIDTH: f64 = 960.0;
const HEIGHT: f64 = 480.0;
const PADDING: f64 = 60.0;
const LEGEND_WIDTH: f64 = 260.0;

pub struct SvgChartWriter;

/// Polynomial approximation of the turbo colour map, `t` in [0, 1].
pub fn turbo(t: f64) -> (u8, u8, u8) {
    let t = t.clamp(0.0, 1.0);
    let r = 34.61 + t * (1172.33 - t * (10793.56 - t * (33300.12 - t * (38394.49 - t * 14825.05))));
    let g = 23.31 + t * (557.33 + t * (1225.33 - t * (3574.96 - t * (1073.77 + t * 707.56))));
    let b = 27.2 + t * (3211.1 - t * (15327.97 - t * (27814.0 - t * (22569.18 - t * 6838.66))));
    let channel = |v: f64| v.round().clamp(0.0, 255.0) as u8;
    (channel(r), channel(g), channel(b))
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

struct Style {
    color: (u8, u8, u8),
    opacity: f64,
}

/// Colour per country in order of first appearance, opacity per formula
/// within that country.
fn styles(series: &[ChartSeries]) -> Vec<Style> {
    let mut countries: Vec<&str> = Vec::new();
    for s in series {
        if !countries.contains(&s.country.as_str()) {
            countries.push(&s.country);
        }
    }

    series
        .iter()
        .map(|s| {
            let ci = countries.iter().position(|c| *c == s.country).unwrap_or(0);
            let siblings: Vec<&ChartSeries> =
                series.iter().filter(|o| o.country == s.country).collect();
            let fi = siblings
                .iter()
                .position(|o| std::ptr::eq(*o, s))
                .unwrap_or(0);
            let opacity = if siblings.len() > 1 {
                0.5 + 0.5 * fi as f64 / (siblings.len() - 1) as f64
            } else {
                1.0
            };
            Style {
                color: turbo((ci + 1) as f64 / countries.len() as f64),
                opacity,
            }
        })
        .collect()
}

fn x_coord(x: &XValue, index: usize, origin: Option<NaiveDate>) -> f64 {
    match x {
        XValue::Day(d) => *d as f64,
        XValue::Date(label) => match (origin, NaiveDate::parse_from_str(label, "%Y-%m-%d")) {
            (Some(o), Ok(d)) => (d - o).num_days() as f64,
            _ => index as f64,
        },
    }
}

fn y_coord(y: f64, log_scale: bool) -> Option<f64> {
    if log_scale {
        if y > 0.0 { Some(y.log10()) } else { None }
    } else {
        Some(y)
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

impl ReportPort for SvgChartWriter {
    fn render(&self, series: &[ChartSeries], options: &ChartOptions) -> Result<String, ExplorerError> {
        let date_origin = series
            .iter()
            .flat_map(|s| s.points.iter())
            .filter_map(|p| match &p.x {
                XValue::Date(label) => NaiveDate::parse_from_str(label, "%Y-%m-%d").ok(),
                XValue::Day(_) => None,
            })
            .min();

        // (x, y) in data space per series, after the scale transform.
        let placed: Vec<Vec<(f64, f64)>> = series
            .iter()
            .map(|s| {
                s.points
                    .iter()
                    .enumerate()
                    .filter_map(|(i, p)| {
                        let y = y_coord(p.y, options.log_scale)?;
                        Some((x_coord(&p.x, i, date_origin), y))
                    })
                    .collect()
            })
            .collect();

        let total_width = WIDTH + LEGEND_WIDTH;
        let mut svg = String::new();
        let fmt_err = |e: std::fmt::Error| ExplorerError::Report {
            reason: format!("failed to format SVG: {}", e),
        };

        writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{:.0}" height="{:.0}" viewBox="0 0 {:.0} {:.0}">"#,
            total_width, HEIGHT, total_width, HEIGHT
        )
        .map_err(fmt_err)?;
        writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#).map_err(fmt_err)?;
        writeln!(
            svg,
            r#"<text x="{:.0}" y="{:.0}" font-family="monospace" font-size="16">{}</text>"#,
            PADDING,
            PADDING / 2.0,
            escape(&options.title)
        )
        .map_err(fmt_err)?;

        let xs = bounds(placed.iter().flatten().map(|p| p.0));
        let ys = bounds(placed.iter().flatten().map(|p| p.1));
        let ((x_min, x_max), (y_min, y_max)) = match (xs, ys) {
            (Some(x), Some(y)) => (x, y),
            _ => {
                writeln!(
                    svg,
                    r#"<text x="{:.0}" y="{:.0}" font-family="monospace">No data available.</text>"#,
                    WIDTH / 2.0 - PADDING,
                    HEIGHT / 2.0
                )
                .map_err(fmt_err)?;
                svg.push_str("</svg>\n");
                return Ok(svg);
            }
        };

        let plot_width = WIDTH - 2.0 * PADDING;
        let plot_height = HEIGHT - 2.0 * PADDING;
        let scale_x = if x_max > x_min { plot_width / (x_max - x_min) } else { 0.0 };
        let scale_y = if y_max > y_min { plot_height / (y_max - y_min) } else { 0.0 };

        // Axes.
        writeln!(
            svg,
            r#"<line x1="{p:.0}" y1="{p:.0}" x2="{p:.0}" y2="{b:.0}" stroke="black"/>"#,
            p = PADDING,
            b = HEIGHT - PADDING
        )
        .map_err(fmt_err)?;
        writeln!(
            svg,
            r#"<line x1="{p:.0}" y1="{b:.0}" x2="{r:.0}" y2="{b:.0}" stroke="black"/>"#,
            p = PADDING,
            b = HEIGHT - PADDING,
            r = WIDTH - PADDING
        )
        .map_err(fmt_err)?;

        let y_label = |v: f64| {
            if options.log_scale {
                format!("{:.0}", 10f64.powf(v))
            } else {
                format!("{:.0}", v)
            }
        };
        writeln!(
            svg,
            r#"<text x="{:.0}" y="{:.0}" font-family="monospace" font-size="10" text-anchor="end">{}</text>"#,
            PADDING - 4.0,
            PADDING,
            y_label(y_max)
        )
        .map_err(fmt_err)?;
        writeln!(
            svg,
            r#"<text x="{:.0}" y="{:.0}" font-family="monospace" font-size="10" text-anchor="end">{}</text>"#,
            PADDING - 4.0,
            HEIGHT - PADDING,
            y_label(y_min)
        )
        .map_err(fmt_err)?;

        let x_caption = match options.time_origin {
            TimeOrigin::Absolute => "date".to_string(),
            TimeOrigin::Relative => format!("days after {} confirmed cases", options.threshold),
        };
        writeln!(
            svg,
            r#"<text x="{:.0}" y="{:.0}" font-family="monospace" font-size="10">{}</text>"#,
            PADDING,
            HEIGHT - PADDING / 3.0,
            escape(&x_caption)
        )
        .map_err(fmt_err)?;

        for ((s, points), style) in series.iter().zip(&placed).zip(styles(series)) {
            let coords: Vec<String> = points
                .iter()
                .map(|&(x, y)| {
                    let px = PADDING + (x - x_min) * scale_x;
                    let py = HEIGHT - PADDING - (y - y_min) * scale_y;
                    format!("{:.1},{:.1}", px, py)
                })
                .collect();
            let (r, g, b) = style.color;
            writeln!(
                svg,
                r#"<polyline fill="none" stroke="rgb({},{},{})" stroke-opacity="{:.2}" stroke-width="1" points="{}"><title>{}</title></polyline>"#,
                r,
                g,
                b,
                style.opacity,
                coords.join(" "),
                escape(&s.name)
            )
            .map_err(fmt_err)?;
        }

        for (i, (s, style)) in series.iter().zip(styles(series)).enumerate() {
            let y = PADDING + i as f64 * 16.0;
            let (r, g, b) = style.color;
            writeln!(
                svg,
                r#"<rect x="{:.0}" y="{:.0}" width="12" height="3" fill="rgb({},{},{})" fill-opacity="{:.2}"/>"#,
                WIDTH,
                y - 4.0,
                r,
                g,
                b,
                style.opacity
            )
            .map_err(fmt_err)?;
            writeln!(
                svg,
                r#"<text x="{:.0}" y="{:.0}" font-family="monospace" font-size="10">{}</text>"#,
                WIDTH + 18.0,
                y,
                escape(&s.name)
            )
            .map_err(fmt_err)?;
        }

        svg.push_str("</svg>\n");
        Ok(svg)
    }
}
