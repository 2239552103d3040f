//! Pulse CLI - compile metric explorations to warehouse SQL
//!
//! Usage:
//!   pulse metrics
//!   pulse periods --grain month
//!   pulse compile --metric monthly_recurring_revenue --grain month
//!   pulse options --metric monthly_recurring_revenue
//!
//! Examples:
//!   pulse compile --metric payments_collected --grain week --period last_three_periods
//!   pulse compile --metric payments_collected --filter plan_tier=pro,team --show-incomplete
//!   pulse compile --metric payments_collected --slice plan_tier

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use pulse::calendar::{standard_periods, TimeGrain};
use pulse::config::Settings;
use pulse::model::{Catalog, MetricFilter};
use pulse::planner::resolve_window;
use pulse::sql::generator::{
    generate_options_query, generate_slice_query, generate_time_series_query,
};
use pulse::service::DEFAULT_TIME_PERIOD;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pulse")]
#[command(about = "Pulse - compile metric explorations to warehouse SQL")]
#[command(version)]
struct Cli {
    /// Path to the settings file (defaults to PULSE_CONFIG or ./pulse.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the metrics defined in the catalog
    Metrics,

    /// Print the standard lookback windows for a grain
    Periods {
        #[arg(short, long, default_value = "month")]
        grain: GrainArg,

        /// Anchor date (defaults to the current date)
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Compile the time-series (or slice) query for a metric
    Compile {
        /// Catalog name of the metric
        #[arg(short, long)]
        metric: String,

        #[arg(short, long, default_value = "month")]
        grain: GrainArg,

        /// Named lookback window (last_six_periods, last_three_periods,
        /// last_six_months, last_year, last_two_years)
        #[arg(short, long)]
        period: Option<String>,

        /// Explicit range start (overrides the lookback's start)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Explicit range end (overrides the lookback's end)
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Filter as field=value1,value2 (repeatable)
        #[arg(long = "filter")]
        filters: Vec<String>,

        /// Dimension to slice by (emits the slice query)
        #[arg(long = "slice")]
        slice_by: Option<String>,

        /// Keep the incomplete final period instead of truncating to the
        /// last completed one
        #[arg(long)]
        show_incomplete: bool,

        /// Anchor date (defaults to the current date)
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Print the filter-options query for a metric
    Options {
        /// Catalog name of the metric
        #[arg(short, long)]
        metric: String,
    },

    /// Show the resolved settings
    Info,
}

#[derive(Clone, Copy, ValueEnum)]
enum GrainArg {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl From<GrainArg> for TimeGrain {
    fn from(arg: GrainArg) -> Self {
        match arg {
            GrainArg::Day => TimeGrain::Day,
            GrainArg::Week => TimeGrain::Week,
            GrainArg::Month => TimeGrain::Month,
            GrainArg::Quarter => TimeGrain::Quarter,
            GrainArg::Year => TimeGrain::Year,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading settings: {e}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Metrics => cmd_metrics(&settings),
        Commands::Periods { grain, today } => cmd_periods(grain.into(), today),
        Commands::Compile {
            metric,
            grain,
            period,
            start,
            end,
            filters,
            slice_by,
            show_incomplete,
            today,
        } => cmd_compile(
            &settings,
            &metric,
            grain.into(),
            period,
            start,
            end,
            &filters,
            slice_by,
            show_incomplete,
            today,
        ),
        Commands::Options { metric } => cmd_options(&settings, &metric),
        Commands::Info => cmd_info(&settings),
    }
}

fn load_settings(path: Option<&std::path::Path>) -> Result<Settings, pulse::config::SettingsError> {
    match path {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    }
}

fn load_catalog(settings: &Settings) -> Result<Catalog, pulse::model::CatalogError> {
    Catalog::load(&settings.catalog.paths)
}

fn cmd_metrics(settings: &Settings) -> ExitCode {
    let catalog = match load_catalog(settings) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading catalog: {e}");
            return ExitCode::FAILURE;
        }
    };

    for metric in catalog.metrics() {
        println!(
            "{:<40} {:<12} {}.{}  {}",
            metric.name, metric.metric_type, metric.schema, metric.model, metric.label
        );
    }
    ExitCode::SUCCESS
}

fn cmd_periods(grain: TimeGrain, today: Option<NaiveDate>) -> ExitCode {
    let today = today.unwrap_or_else(|| chrono::Local::now().date_naive());
    let options = standard_periods(grain, today);
    match serde_json::to_string_pretty(&options) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error serializing periods: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_compile(
    settings: &Settings,
    metric_name: &str,
    grain: TimeGrain,
    period: Option<String>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    filter_args: &[String],
    slice_by: Option<String>,
    show_incomplete: bool,
    today: Option<NaiveDate>,
) -> ExitCode {
    let catalog = match load_catalog(settings) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading catalog: {e}");
            return ExitCode::FAILURE;
        }
    };

    let metric = match catalog.get(metric_name) {
        Some(m) => m,
        None => {
            eprintln!("Metric not found in catalog: '{metric_name}'");
            return ExitCode::FAILURE;
        }
    };

    let filters = match parse_filters(filter_args) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let today = today.unwrap_or_else(|| chrono::Local::now().date_naive());
    let (start_date, end_date) = if let (Some(start), Some(end)) = (start, end) {
        (start, end)
    } else {
        let name = period.as_deref().unwrap_or(DEFAULT_TIME_PERIOD);
        let options = standard_periods(grain, today);
        let Some(option) = options.iter().find(|o| o.name == name) else {
            eprintln!("Unknown time period: '{name}'");
            return ExitCode::FAILURE;
        };
        (
            start.unwrap_or(option.start_date),
            end.unwrap_or(option.end_date),
        )
    };

    let dialect = settings.backend.dialect;

    let sql = match slice_by {
        Some(dimension_name) => {
            let Some(dimension) = metric.dimension(&dimension_name) else {
                eprintln!(
                    "Unknown dimension '{dimension_name}' on metric '{}'",
                    metric.name
                );
                return ExitCode::FAILURE;
            };
            generate_slice_query(
                dialect,
                metric,
                grain,
                start_date,
                end_date,
                &filters,
                std::slice::from_ref(dimension),
            )
        }
        None => {
            let window = resolve_window(metric, grain, start_date, end_date, show_incomplete);
            generate_time_series_query(
                dialect,
                metric,
                grain,
                window.start_date,
                window.query_end_date,
                &filters,
                window.is_mid_period,
            )
        }
    };

    println!("{sql}");
    ExitCode::SUCCESS
}

fn cmd_options(settings: &Settings, metric_name: &str) -> ExitCode {
    let catalog = match load_catalog(settings) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading catalog: {e}");
            return ExitCode::FAILURE;
        }
    };

    let metric = match catalog.get(metric_name) {
        Some(m) => m,
        None => {
            eprintln!("Metric not found in catalog: '{metric_name}'");
            return ExitCode::FAILURE;
        }
    };

    if metric.filters.is_empty() {
        eprintln!("Metric '{}' declares no filterable fields", metric.name);
        return ExitCode::FAILURE;
    }

    let sql = generate_options_query(
        settings.backend.dialect,
        &metric.schema,
        &metric.model,
        &metric.filters,
    );
    println!("{sql}");
    ExitCode::SUCCESS
}

fn cmd_info(settings: &Settings) -> ExitCode {
    println!("backend dialect:    {}", settings.backend.dialect);
    match settings.backend.resolved_connection_string() {
        Ok(_) => println!("connection string:  set"),
        Err(e) => println!("connection string:  {e}"),
    }
    if let Some(schema) = &settings.backend.default_schema {
        println!("default schema:     {schema}");
    }
    println!(
        "catalog paths:      {}",
        settings
            .catalog
            .paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("cache enabled:      {}", settings.cache.enabled);
    println!("cache ttl seconds:  {}", settings.cache.ttl_seconds);
    ExitCode::SUCCESS
}

/// Parse repeatable `field=value1,value2` filter arguments.
fn parse_filters(args: &[String]) -> Result<Vec<MetricFilter>, String> {
    args.iter()
        .map(|arg| {
            let (field, values) = arg
                .split_once('=')
                .ok_or_else(|| format!("Invalid filter '{arg}', expected field=value1,value2"))?;
            if field.is_empty() {
                return Err(format!("Invalid filter '{arg}', missing field name"));
            }
            let values: Vec<&str> = values.split(',').filter(|v| !v.is_empty()).collect();
            Ok(MetricFilter::with_values(field, values))
        })
        .collect()
}
