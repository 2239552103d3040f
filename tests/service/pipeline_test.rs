//! End-to-end pipeline runs against a canned backend.

use chrono::NaiveDate;
use pulse::calendar::TimeGrain;
use pulse::error::PulseError;
use pulse::executor::testing::{ExecutorProbe, StaticExecutor};
use pulse::executor::{ResultSet, Value};
use pulse::model::{loader, Catalog, MetricFilter};
use pulse::report::PeriodType;
use pulse::service::{MetricRequest, MetricsService};
use std::time::Duration;

const CATALOG: &str = r#"
[[metrics]]
name = "payments_collected"
label = "Payments Collected"
type = "currency"
category = "finance"
schema = "analytics"
model = "fct_payments"
sql = "SUM(amount)"
timestamp = "collected_at"
time_grains = ["week", "month", "quarter"]

[[metrics.dimensions]]
name = "plan_tier"
label = "Plan Tier"

[[metrics.filters]]
field = "plan_tier"
label = "Plan Tier"
"#;

const COLUMNS: [&str; 17] = [
    "period_start",
    "period_end",
    "period_type",
    "days_into_period",
    "metric_value",
    "previous_period_value",
    "previous_period_change",
    "previous_period_percent_change",
    "trailing_six_value",
    "trailing_six_change",
    "trailing_six_percent_change",
    "previous_year_value",
    "previous_year_change",
    "previous_year_percent_change",
    "moving_average_value",
    "moving_average_change",
    "moving_average_percent_change",
];

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn catalog() -> Catalog {
    Catalog::new(loader::parse_catalog(CATALOG).unwrap())
}

fn canned_result() -> ResultSet {
    let mut rs = ResultSet::new(COLUMNS.to_vec());
    rs.push_row(vec![
        Value::Date(date(2024, 2, 1)),
        Value::Date(date(2024, 2, 29)),
        Value::from("Completed Period"),
        Value::Int(29),
        Value::Float(900.0),
        Value::Float(750.0),
        Value::Float(150.0),
        Value::Float(0.2),
        Value::Null,
        Value::Null,
        Value::Null,
        Value::Null,
        Value::Null,
        Value::Null,
        Value::Float(800.0),
        Value::Float(100.0),
        Value::Float(0.125),
    ]);
    rs
}

fn service_with(executor: StaticExecutor) -> (MetricsService, ExecutorProbe) {
    let probe = executor.probe();
    let service = MetricsService::new(catalog(), Box::new(executor), Duration::from_secs(60));
    (service, probe)
}

#[test]
fn run_produces_rows_and_summary() {
    let (service, _probe) = service_with(StaticExecutor::returning(canned_result()));
    let request = MetricRequest::new("payments_collected", TimeGrain::Month);
    let report = service.run(&request, date(2024, 3, 15)).unwrap();

    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.rows[0].period_type, PeriodType::CompletedPeriod);
    assert_eq!(report.summary.get("current_period"), Some(&900.0));
    assert_eq!(report.summary.get("previous_period"), Some(&750.0));

    // Default lookback, mid-March: six months back, truncated to the
    // last completed month.
    assert_eq!(report.window.start_date, date(2023, 9, 1));
    assert_eq!(report.window.query_end_date, date(2024, 2, 29));
    assert!(report.window.is_mid_period);
    assert!(report.sql.contains("FROM \"analytics\".\"fct_payments\""));
}

#[test]
fn second_run_is_served_from_cache() {
    let (service, probe) = service_with(StaticExecutor::returning(canned_result()));
    let request = MetricRequest::new("payments_collected", TimeGrain::Month);

    let first = service.run(&request, date(2024, 3, 15)).unwrap();
    let second = service.run(&request, date(2024, 3, 15)).unwrap();
    assert_eq!(first.summary, second.summary);

    // Same request text, so the backend only ran once.
    assert_eq!(probe.call_count(), 1);
}

#[test]
fn changed_filters_change_the_query() {
    let (service, probe) = service_with(StaticExecutor::returning(canned_result()));
    let mut request = MetricRequest::new("payments_collected", TimeGrain::Month);
    service.run(&request, date(2024, 3, 15)).unwrap();

    request.filters = vec![MetricFilter::with_values("plan_tier", ["pro"])];
    service.run(&request, date(2024, 3, 15)).unwrap();

    assert_eq!(probe.call_count(), 2);
    let queries = probe.executed_queries();
    assert!(!queries[0].contains("IN ('pro')"));
    assert!(queries[1].contains("AND \"plan_tier\" IN ('pro')"));
}

#[test]
fn empty_filters_do_not_bust_the_cache() {
    let (service, probe) = service_with(StaticExecutor::returning(canned_result()));
    let mut request = MetricRequest::new("payments_collected", TimeGrain::Month);
    service.run(&request, date(2024, 3, 15)).unwrap();

    // A filter with no selected values must not alter the query text,
    // so the second run hits the cache.
    request.filters = vec![MetricFilter::new("plan_tier")];
    service.run(&request, date(2024, 3, 15)).unwrap();

    assert_eq!(probe.call_count(), 1);
}

#[test]
fn unknown_metric_is_reported_not_crashed() {
    let (service, _probe) = service_with(StaticExecutor::returning(canned_result()));
    let request = MetricRequest::new("missing_metric", TimeGrain::Month);
    match service.run(&request, date(2024, 3, 15)) {
        Err(PulseError::MetricNotFound(name)) => assert_eq!(name, "missing_metric"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn unsupported_grain_is_rejected() {
    let (service, _probe) = service_with(StaticExecutor::returning(canned_result()));
    let request = MetricRequest::new("payments_collected", TimeGrain::Day);
    assert!(matches!(
        service.run(&request, date(2024, 3, 15)),
        Err(PulseError::UnsupportedGrain { .. })
    ));
}

#[test]
fn unknown_time_period_is_rejected() {
    let (service, _probe) = service_with(StaticExecutor::returning(canned_result()));
    let mut request = MetricRequest::new("payments_collected", TimeGrain::Month);
    request.time_period = Some("last_decade".to_string());
    assert!(matches!(
        service.run(&request, date(2024, 3, 15)),
        Err(PulseError::UnknownTimePeriod(_))
    ));
}

#[test]
fn explicit_dates_override_the_lookback() {
    let (service, probe) = service_with(StaticExecutor::returning(canned_result()));
    let mut request = MetricRequest::new("payments_collected", TimeGrain::Month);
    request.start_date = Some(date(2023, 1, 1));
    request.end_date = Some(date(2023, 6, 30));
    request.show_incomplete_periods = true;
    let report = service.run(&request, date(2024, 3, 15)).unwrap();

    assert_eq!(report.window.start_date, date(2023, 1, 1));
    assert_eq!(report.window.query_end_date, date(2023, 6, 30));
    assert!(!report.window.is_mid_period);
    assert!(probe.executed_queries()[0].contains("DATE '2023-06-30'"));
}

#[test]
fn backend_failure_surfaces_with_message() {
    let (service, _probe) = service_with(StaticExecutor::failing("relation does not exist"));
    let request = MetricRequest::new("payments_collected", TimeGrain::Month);
    match service.run(&request, date(2024, 3, 15)) {
        Err(PulseError::Execution(err)) => {
            assert!(err.to_string().contains("relation does not exist"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn slice_requires_a_known_dimension() {
    let mut slice_result = ResultSet::new(vec!["period_start", "plan_tier", "metric_value"]);
    slice_result.push_row(vec![
        Value::Date(date(2024, 2, 1)),
        Value::from("pro"),
        Value::Float(600.0),
    ]);
    let (service, _probe) = service_with(StaticExecutor::returning(slice_result));

    let mut request = MetricRequest::new("payments_collected", TimeGrain::Month);
    assert!(matches!(
        service.slice(&request, date(2024, 3, 15)),
        Err(PulseError::MissingSliceDimension)
    ));

    request.slice_by = Some("region".to_string());
    assert!(matches!(
        service.slice(&request, date(2024, 3, 15)),
        Err(PulseError::UnknownDimension { .. })
    ));

    request.slice_by = Some("plan_tier".to_string());
    let report = service.slice(&request, date(2024, 3, 15)).unwrap();
    assert_eq!(report.dimension.label, "Plan Tier");
    assert!(report.sql.contains("GROUP BY 1, 2"));
    assert_eq!(report.result.len(), 1);
}

#[test]
fn filter_options_are_grouped_by_field() {
    let mut options_result = ResultSet::new(vec!["dimension", "dimension_value"]);
    options_result.push_row(vec![Value::from("plan_tier"), Value::from("pro")]);
    options_result.push_row(vec![Value::from("plan_tier"), Value::from("team")]);
    options_result.push_row(vec![Value::from("plan_tier"), Value::Null]);
    let (service, _probe) = service_with(StaticExecutor::returning(options_result));

    let options = service.filter_options("payments_collected").unwrap();
    assert_eq!(options.len(), 2);
    assert!(options.iter().all(|o| o.dimension == "plan_tier"));
    assert_eq!(options[0].value, "pro");
}
