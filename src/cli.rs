//! CLI definition and dispatch.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::file_state_adapter::{FileStateAdapter, DEFAULT_STATE_FILE};
use crate::adapters::json_adapter::JsonFileAdapter;
use crate::adapters::series_writer::{CsvSeriesWriter, JsonSeriesWriter};
use crate::adapters::svg_chart::SvgChartWriter;
use crate::domain::config_validation::validate_config;
use crate::domain::dataset::DerivedDataset;
use crate::domain::deriver::{derive_all, DEFAULT_THRESHOLD};
use crate::domain::error::ExplorerError;
use crate::domain::explorer_config::{DataSource, ExplorerConfig, OutputFormat, DEFAULT_URL};
use crate::domain::formula::FormulaSpec;
use crate::domain::formula_eval::{CompiledFormula, MetricValues};
use crate::domain::series::{build_series, compile_active, TimeOrigin};
use crate::domain::state::{reduce, Action, DashboardState};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::{ChartOptions, ReportPort};
use crate::ports::state_port::StatePort;

const CHART_TITLE: &str = "COVID-19 - Simple Data Explorer";

#[derive(Parser, Debug)]
#[command(name = "covid-explorer", about = "COVID-19 time-series explorer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build chart series for the selected countries and formulas
    Plot {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        state: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long)]
        format: Option<OutputFormat>,
        /// Replaces the stored country selection (repeatable)
        #[arg(long = "country")]
        countries: Vec<String>,
        /// Replaces the stored formulas (repeatable)
        #[arg(long = "formula")]
        formulas: Vec<String>,
        /// Align on days after the confirmed-case threshold
        #[arg(long)]
        relative: bool,
        #[arg(long)]
        log_scale: bool,
    },
    /// List countries with their record count and crossing date
    Countries {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Compile a formula and show its normalised form
    Check { expression: String },
    /// Evaluate a formula once against explicit metric values
    Eval {
        expression: String,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        confirmed: f64,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        deaths: f64,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        recovered: f64,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        confirmed_rate: f64,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        deaths_rate: f64,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        recovered_rate: f64,
    },
    /// Show or edit the stored dashboard state
    State {
        #[arg(short, long, default_value = DEFAULT_STATE_FILE)]
        state: PathBuf,
        #[command(subcommand)]
        action: StateCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum StateCommand {
    /// Print the current state
    Show,
    /// Append an enabled formula
    AddFormula {
        #[arg(default_value = "")]
        expression: String,
    },
    /// Replace a formula's text and enabled flag
    EditFormula {
        index: usize,
        expression: String,
        #[arg(long)]
        disabled: bool,
    },
    /// Remove a formula
    DeleteFormula { index: usize },
    /// Add the country to the selection, or remove it if already selected
    ToggleCountry { country: String },
    /// Align on calendar dates or on days after the threshold
    TimeOrigin { origin: TimeOrigin },
    /// Switch the y-axis between linear and logarithmic
    LogScale { mode: Toggle },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Toggle {
    On,
    Off,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Plot {
            config,
            state,
            output,
            format,
            countries,
            formulas,
            relative,
            log_scale,
        } => run_plot(
            &config,
            state.as_deref(),
            output.as_deref(),
            format,
            PlotOverrides {
                countries,
                formulas,
                relative,
                log_scale,
            },
        ),
        Command::Countries { config } => run_countries(&config),
        Command::Check { expression } => run_check(&expression),
        Command::Eval {
            expression,
            confirmed,
            deaths,
            recovered,
            confirmed_rate,
            deaths_rate,
            recovered_rate,
        } => run_eval(
            &expression,
            &MetricValues {
                confirmed,
                deaths,
                recovered,
                confirmed_rate,
                deaths_rate,
                recovered_rate,
            },
        ),
        Command::State { state, action } => run_state(&FileStateAdapter::new(state), action),
    }
}

fn fail(err: &ExplorerError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(err)
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExplorerError> {
    FileConfigAdapter::from_file(path).map_err(|e| ExplorerError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

pub fn build_explorer_config(adapter: &dyn ConfigPort) -> Result<ExplorerConfig, ExplorerError> {
    validate_config(adapter)?;

    let source = match adapter
        .get_string("data", "source")
        .unwrap_or_else(|| "json".to_string())
        .to_lowercase()
        .as_str()
    {
        "http" => DataSource::Http(
            adapter
                .get_string("data", "url")
                .unwrap_or_else(|| DEFAULT_URL.to_string()),
        ),
        kind => {
            let path = adapter
                .get_string("data", "path")
                .map(PathBuf::from)
                .ok_or_else(|| ExplorerError::ConfigMissing {
                    section: "data".into(),
                    key: "path".into(),
                })?;
            if kind == "csv" {
                DataSource::Csv(path)
            } else {
                DataSource::Json(path)
            }
        }
    };

    let output_format = match adapter.get_string("output", "format") {
        Some(f) => f.parse().map_err(|reason| ExplorerError::ConfigInvalid {
            section: "output".into(),
            key: "format".into(),
            reason,
        })?,
        None => OutputFormat::default(),
    };

    Ok(ExplorerConfig {
        source,
        threshold: adapter.get_int("explorer", "threshold", DEFAULT_THRESHOLD as i64) as u64,
        state_file: adapter
            .get_string("explorer", "state_file")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE)),
        output_format,
        output_path: adapter.get_string("output", "path").map(PathBuf::from),
    })
}

pub fn make_data_port(source: &DataSource) -> Result<Box<dyn DataPort>, ExplorerError> {
    match source {
        DataSource::Json(path) => Ok(Box::new(JsonFileAdapter::new(path.clone()))),
        DataSource::Csv(path) => Ok(Box::new(CsvAdapter::new(path.clone()))),
        #[cfg(feature = "http")]
        DataSource::Http(url) => Ok(Box::new(crate::adapters::http_adapter::HttpAdapter::new(
            url,
        )?)),
        #[cfg(not(feature = "http"))]
        DataSource::Http(url) => Err(ExplorerError::DataSource {
            reason: format!("http feature is required to fetch {}", url),
        }),
    }
}

pub fn make_writer(format: OutputFormat) -> Box<dyn ReportPort> {
    match format {
        OutputFormat::Json => Box::new(JsonSeriesWriter),
        OutputFormat::Csv => Box::new(CsvSeriesWriter),
        OutputFormat::Svg => Box::new(SvgChartWriter),
    }
}

/// Command-line replacements for the stored state.
#[derive(Debug, Clone, Default)]
pub struct PlotOverrides {
    pub countries: Vec<String>,
    pub formulas: Vec<String>,
    pub relative: bool,
    pub log_scale: bool,
}

pub fn apply_overrides(state: &DashboardState, overrides: &PlotOverrides) -> DashboardState {
    let mut next = state.clone();
    if !overrides.countries.is_empty() {
        next.selected_countries = overrides.countries.clone();
    }
    if !overrides.formulas.is_empty() {
        next.formulas = overrides
            .formulas
            .iter()
            .map(|f| FormulaSpec::new(f, true))
            .collect();
    }
    if overrides.relative {
        next.time_origin = TimeOrigin::Relative;
    }
    if overrides.log_scale {
        next.log_scale = true;
    }
    next
}

/// Print the first active formula that fails to compile, with a caret under
/// the offending position.
fn report_compile_failure(specs: &[FormulaSpec]) {
    for spec in specs.iter().filter(|s| s.is_active()) {
        if let Err(e) = CompiledFormula::compile(&spec.expression) {
            eprintln!(
                "error: failed to compile formula:\n{}",
                e.display_with_context(&spec.expression)
            );
            return;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlotSummary {
    pub series: usize,
    pub points: usize,
    pub countries: usize,
    pub skipped: Vec<String>,
}

pub fn run_plot_pipeline(
    data_port: &dyn DataPort,
    state: &DashboardState,
    threshold: u64,
    writer: &dyn ReportPort,
    output_path: &Path,
) -> Result<PlotSummary, ExplorerError> {
    let formulas = compile_active(&state.formulas)?;
    if formulas.is_empty() {
        log::warn!("no active formulas, chart will be empty");
    }

    log::info!("loading dataset from {}", data_port.describe());
    let raw = data_port.fetch_dataset()?;
    let derived: DerivedDataset = derive_all(&raw, threshold);
    log::info!(
        "derived {} countries ({} skipped), threshold {}",
        derived.country_count(),
        derived.skipped.len(),
        threshold
    );

    let series = build_series(
        &derived,
        &state.selected_countries,
        &formulas,
        state.time_origin,
    );

    let options = ChartOptions {
        title: CHART_TITLE.to_string(),
        log_scale: state.log_scale,
        time_origin: state.time_origin,
        threshold,
    };
    writer.write(&series, &options, output_path)?;

    Ok(PlotSummary {
        series: series.len(),
        points: series.iter().map(|s| s.points.len()).sum(),
        countries: derived.country_count(),
        skipped: derived.skipped.iter().map(|s| s.country.clone()).collect(),
    })
}

fn run_plot(
    config_path: &Path,
    state_path: Option<&Path>,
    output_path: Option<&Path>,
    format: Option<OutputFormat>,
    overrides: PlotOverrides,
) -> ExitCode {
    log::info!("loading config from {}", config_path.display());
    let config = match load_config(config_path).and_then(|a| build_explorer_config(&a)) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };

    let state_port = FileStateAdapter::new(
        state_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| config.state_file.clone()),
    );
    let state = match state_port.load() {
        Ok(s) => apply_overrides(&s, &overrides),
        Err(e) => return fail(&e),
    };

    let data_port = match make_data_port(&config.source) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    let format = format.unwrap_or(config.output_format);
    let output = output_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.output_path_for(format));
    let writer = make_writer(format);

    match run_plot_pipeline(data_port.as_ref(), &state, config.threshold, writer.as_ref(), &output) {
        Ok(summary) => {
            log::info!(
                "wrote {} series ({} points) to {}",
                summary.series,
                summary.points,
                output.display()
            );
            ExitCode::SUCCESS
        }
        Err(e @ ExplorerError::FormulaCompile(_)) => {
            report_compile_failure(&state.formulas);
            ExitCode::from(&e)
        }
        Err(e) => fail(&e),
    }
}

fn run_countries(config_path: &Path) -> ExitCode {
    let config = match load_config(config_path).and_then(|a| build_explorer_config(&a)) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let raw = match make_data_port(&config.source).and_then(|p| p.fetch_dataset()) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };
    let derived = derive_all(&raw, config.threshold);

    for name in derived.country_names() {
        let records = derived.get(name).map(<[_]>::len).unwrap_or(0);
        let crossing = derived
            .crossing_point(name)
            .map(|(_, r)| r.date_label.clone())
            .unwrap_or_else(|| "-".to_string());
        println!("{}\t{}\t{}", name, records, crossing);
    }
    for skipped in &derived.skipped {
        eprintln!("skipped {}: {}", skipped.country, skipped.error);
    }
    log::info!(
        "{} countries, crossing threshold {}",
        derived.country_count(),
        config.threshold
    );
    ExitCode::SUCCESS
}

fn run_check(expression: &str) -> ExitCode {
    match CompiledFormula::compile(expression) {
        Ok(f) => {
            println!("{}", f);
            let used: Vec<&str> = f.expr().metrics().iter().map(|m| m.name()).collect();
            if used.is_empty() {
                eprintln!("  uses no variables");
            } else {
                eprintln!("  uses: {}", used.join(", "));
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e.display_with_context(expression));
            ExitCode::from(&ExplorerError::from(e))
        }
    }
}

fn run_eval(expression: &str, values: &MetricValues) -> ExitCode {
    match CompiledFormula::compile(expression) {
        Ok(f) => {
            println!("{}", f.evaluate(values));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e.display_with_context(expression));
            ExitCode::from(&ExplorerError::from(e))
        }
    }
}

pub fn state_action(command: StateCommand) -> Option<Action> {
    match command {
        StateCommand::Show => None,
        StateCommand::AddFormula { expression } => Some(Action::AddFormula { expression }),
        StateCommand::EditFormula {
            index,
            expression,
            disabled,
        } => Some(Action::EditFormula {
            index,
            expression,
            enabled: !disabled,
        }),
        StateCommand::DeleteFormula { index } => Some(Action::DeleteFormula { index }),
        StateCommand::ToggleCountry { country } => Some(Action::ToggleCountry(country)),
        StateCommand::TimeOrigin { origin } => Some(Action::SetTimeOrigin(origin)),
        StateCommand::LogScale { mode } => Some(Action::SetLogScale(mode == Toggle::On)),
    }
}

/// Apply one action and persist the resulting snapshot.
pub fn apply_state_command(
    port: &dyn StatePort,
    command: StateCommand,
) -> Result<DashboardState, ExplorerError> {
    let current = port.load()?;
    match state_action(command) {
        None => Ok(current),
        Some(action) => {
            let next = reduce(&current, action)?;
            port.save(&next)?;
            Ok(next)
        }
    }
}

fn print_state(state: &DashboardState) {
    println!("time origin: {}", state.time_origin);
    println!("log scale:   {}", if state.log_scale { "on" } else { "off" });
    println!("countries:   {}", state.selected_countries.join(", "));
    println!("formulas:");
    for (i, f) in state.formulas.iter().enumerate() {
        let mark = if f.enabled { "x" } else { " " };
        println!("  {}. [{}] {}", i, mark, f.expression);
    }
}

fn run_state(port: &dyn StatePort, command: StateCommand) -> ExitCode {
    match apply_state_command(port, command) {
        Ok(state) => {
            print_state(&state);
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}
