//! Calendar properties over grains and sample dates.

use chrono::NaiveDate;
use pulse::calendar::{period_bounds, standard_periods, TimeGrain};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn bounds_always_contain_the_anchor_date() {
    let mut day = date(2023, 1, 1);
    let end = date(2025, 1, 1);
    while day < end {
        for grain in TimeGrain::ALL {
            let period = period_bounds(day, grain);
            assert!(period.start <= day && day <= period.end, "{grain} {day}");
        }
        day = day.succ_opt().unwrap();
    }
}

#[test]
fn bounds_are_stable_within_a_period() {
    // Every date inside a bucket maps to the same bucket.
    for grain in TimeGrain::ALL {
        let period = period_bounds(date(2024, 3, 15), grain);
        assert_eq!(period_bounds(period.start, grain), period);
        assert_eq!(period_bounds(period.end, grain), period);
    }
}

#[test]
fn month_scenario_mid_march() {
    let period = period_bounds(date(2024, 3, 15), TimeGrain::Month);
    assert_eq!(period.start, date(2024, 3, 1));
    assert_eq!(period.end, date(2024, 3, 31));

    // Mid-period, so the anchor is the current period start and "last
    // year" begins at the month one year before it.
    let options = standard_periods(TimeGrain::Month, date(2024, 3, 15));
    let last_year = options.iter().find(|o| o.name == "last_year").unwrap();
    assert_eq!(last_year.start_date, date(2023, 3, 1));
}

#[test]
fn week_scenario_friday() {
    // 2024-03-15 is a Friday.
    let period = period_bounds(date(2024, 3, 15), TimeGrain::Week);
    assert_eq!(period.start, date(2024, 3, 11));
    assert_eq!(period.end, date(2024, 3, 17));
}

#[test]
fn five_options_ending_today_for_every_grain() {
    let sample_days = [
        date(2023, 2, 28),
        date(2024, 2, 29),
        date(2024, 3, 15),
        date(2024, 12, 31),
    ];
    for today in sample_days {
        for grain in TimeGrain::ALL {
            let options = standard_periods(grain, today);
            assert_eq!(options.len(), 5);
            let names: Vec<&str> = options.iter().map(|o| o.name).collect();
            assert_eq!(
                names,
                vec![
                    "last_six_periods",
                    "last_three_periods",
                    "last_six_months",
                    "last_year",
                    "last_two_years"
                ]
            );
            for option in options {
                assert_eq!(option.end_date, today);
                assert!(option.start_date <= today);
                // Lookback starts sit on a grain boundary.
                assert_eq!(
                    period_bounds(option.start_date, grain).start,
                    option.start_date
                );
            }
        }
    }
}

#[test]
fn anchor_shifts_when_period_just_completed() {
    // On the last day of a month the period is complete, so lookbacks
    // anchor on the first day of the next month.
    let completed = standard_periods(TimeGrain::Month, date(2024, 3, 31));
    let mid = standard_periods(TimeGrain::Month, date(2024, 3, 15));

    let start = |options: &[pulse::calendar::TimePeriodOption; 5], name: &str| {
        options.iter().find(|o| o.name == name).unwrap().start_date
    };

    assert_eq!(start(&completed, "last_three_periods"), date(2024, 1, 1));
    assert_eq!(start(&mid, "last_three_periods"), date(2023, 12, 1));
}

#[test]
fn day_grain_is_always_complete() {
    // A day ends on itself, so the anchor is tomorrow.
    let options = standard_periods(TimeGrain::Day, date(2024, 3, 15));
    let last_three = options
        .iter()
        .find(|o| o.name == "last_three_periods")
        .unwrap();
    assert_eq!(last_three.start_date, date(2024, 3, 13));
}
