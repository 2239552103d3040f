//! Shaping a realistic time-series result into named metrics.

use chrono::NaiveDate;
use pulse::executor::{ResultSet, Value};
use pulse::report::{comparison_rows, standard_metrics, PeriodType};

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

/// A result shaped like a mid-March monthly revenue query: one partial
/// March row and two completed months, most recent first.
fn march_result() -> ResultSet {
    let mut rs = ResultSet::new(COLUMNS.to_vec());
    rs.push_row(vec![
        Value::Date(date(2024, 3, 1)),
        Value::Date(date(2024, 3, 15)),
        Value::from("Mid Period"),
        Value::Int(15),
        Value::Float(6_200.0),
        Value::Float(5_000.0),
        Value::Float(1_200.0),
        Value::Float(0.24),
        Value::Float(4_000.0),
        Value::Float(2_200.0),
        Value::Float(0.55),
        Value::Null,
        Value::Null,
        Value::Null,
        Value::Float(5_500.0),
        Value::Float(700.0),
        Value::Float(0.127_272_727_272_727_27),
    ]);
    rs.push_row(vec![
        Value::Date(date(2024, 2, 1)),
        Value::Date(date(2024, 2, 29)),
        Value::from("Completed Period"),
        Value::Int(29),
        Value::Float(11_000.0),
        Value::Float(10_000.0),
        Value::Float(1_000.0),
        Value::Float(0.1),
        Value::Float(8_000.0),
        Value::Float(3_000.0),
        Value::Float(0.375),
        Value::Null,
        Value::Null,
        Value::Null,
        Value::Float(10_200.0),
        Value::Float(800.0),
        Value::Float(0.078_431_372_549_019_6),
    ]);
    rs.push_row(vec![
        Value::Date(date(2024, 1, 1)),
        Value::Date(date(2024, 1, 31)),
        Value::from("Completed Period"),
        Value::Int(31),
        Value::Float(10_000.0),
        Value::Null,
        Value::Null,
        Value::Null,
        Value::Null,
        Value::Null,
        Value::Null,
        Value::Null,
        Value::Null,
        Value::Null,
        Value::Float(10_000.0),
        Value::Float(0.0),
        Value::Float(0.0),
    ]);
    rs
}

#[test]
fn rows_parse_with_one_leading_mid_period() {
    let rows = comparison_rows(&march_result()).unwrap();
    assert_eq!(rows.len(), 3);

    let mid_rows: Vec<_> = rows
        .iter()
        .filter(|r| r.period_type == PeriodType::MidPeriod)
        .collect();
    assert_eq!(mid_rows.len(), 1);
    assert_eq!(mid_rows[0].period_start, date(2024, 3, 1));
    assert_eq!(mid_rows[0].days_into_period, 15);
    assert_eq!(mid_rows[0].metric_value, Some(6_200.0));
    assert_eq!(mid_rows[0].previous_year_value, None);
}

#[test]
fn summary_carries_both_families() {
    let rows = comparison_rows(&march_result()).unwrap();
    let metrics = standard_metrics(&rows);

    // Mid-period family from the March row.
    assert_eq!(metrics.get("current_ptd"), Some(&6_200.0));
    assert_eq!(metrics.get("previous_period_ptd"), Some(&5_000.0));
    assert_eq!(metrics.get("trailing_six_periods_ptd"), Some(&4_000.0));
    assert_eq!(metrics.get("moving_average_ptd"), Some(&5_500.0));
    assert_eq!(metrics.get("period_over_period_change_ptd"), Some(&1_200.0));
    assert_eq!(
        metrics.get("period_over_period_percent_change_ptd"),
        Some(&0.24)
    );

    // Completed family from the most recent completed row (February).
    assert_eq!(metrics.get("current_period"), Some(&11_000.0));
    assert_eq!(metrics.get("previous_period"), Some(&10_000.0));
    assert_eq!(metrics.get("trailing_six_periods"), Some(&8_000.0));
    assert_eq!(metrics.get("period_over_period_change"), Some(&1_000.0));
    assert_eq!(metrics.get("period_over_period_percent_change"), Some(&0.1));

    // The previous-year comparison is out of range: no key, not zero.
    assert!(!metrics.contains_key("last_year"));
    assert!(!metrics.contains_key("last_year_ptd"));
    assert!(!metrics.contains_key("year_over_year_percent_change"));
}

#[test]
fn completed_only_result_has_no_ptd_keys() {
    let mut rs = march_result();
    rs.rows.remove(0);
    let rows = comparison_rows(&rs).unwrap();
    let metrics = standard_metrics(&rows);
    assert!(metrics.contains_key("current_period"));
    assert!(metrics.keys().all(|k| !k.ends_with("_ptd")));
}

#[test]
fn date_strings_from_the_backend_still_parse() {
    // Some backends hand dates back as ISO strings.
    let mut rs = march_result();
    rs.rows[0][0] = Value::from("2024-03-01");
    rs.rows[0][1] = Value::from("2024-03-15");
    let rows = comparison_rows(&rs).unwrap();
    assert_eq!(rows[0].period_start, date(2024, 3, 1));
    assert_eq!(rows[0].period_end, date(2024, 3, 15));
}
