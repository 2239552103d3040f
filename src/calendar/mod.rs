//! Calendar arithmetic for period bucketing.
//!
//! Everything here is a pure function of its inputs: grains, period
//! bounds, and the standard lookback windows are recomputed on every
//! request rather than persisted. All arithmetic is calendar-aware
//! (month lengths and leap years are handled by `chrono`); there is no
//! fixed-day-count approximation.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Error for a grain string outside the five recognized values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid time grain: '{0}'. Expected one of day, week, month, quarter, year")]
pub struct InvalidGrain(pub String);

/// The bucket width for all period arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeGrain {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl TimeGrain {
    /// All grains, in ascending bucket width.
    pub const ALL: [TimeGrain; 5] = [
        TimeGrain::Day,
        TimeGrain::Week,
        TimeGrain::Month,
        TimeGrain::Quarter,
        TimeGrain::Year,
    ];

    /// The grain keyword as it appears in configuration and in
    /// `date_trunc` calls.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeGrain::Day => "day",
            TimeGrain::Week => "week",
            TimeGrain::Month => "month",
            TimeGrain::Quarter => "quarter",
            TimeGrain::Year => "year",
        }
    }

    /// How many buckets of this grain make up one year.
    ///
    /// Used as the lag distance for previous-year comparisons.
    pub fn periods_per_year(&self) -> u32 {
        match self {
            TimeGrain::Day => 365,
            TimeGrain::Week => 52,
            TimeGrain::Month => 12,
            TimeGrain::Quarter => 4,
            TimeGrain::Year => 1,
        }
    }
}

impl fmt::Display for TimeGrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TimeGrain {
    type Err = InvalidGrain;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(TimeGrain::Day),
            "week" => Ok(TimeGrain::Week),
            "month" => Ok(TimeGrain::Month),
            "quarter" => Ok(TimeGrain::Quarter),
            "year" => Ok(TimeGrain::Year),
            other => Err(InvalidGrain(other.to_string())),
        }
    }
}

/// An inclusive date interval aligned to a grain boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// A named, user-selectable lookback window.
///
/// `end_date` is always "today"; `start_date` is the grain-aligned start
/// of the period N grain-units back from the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimePeriodOption {
    pub name: &'static str,
    pub label: &'static str,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Compute the grain-aligned period containing `date`.
///
/// Weeks start on Monday. Quarters start on the first day of January,
/// April, July, and October.
pub fn period_bounds(date: NaiveDate, grain: TimeGrain) -> Period {
    match grain {
        TimeGrain::Day => Period {
            start: date,
            end: date,
        },
        TimeGrain::Week => {
            let start = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
            Period {
                start,
                end: start + Duration::days(6),
            }
        }
        TimeGrain::Month => {
            let start = first_of_month(date.year(), date.month());
            Period {
                start,
                end: shift_months(start, 1) - Duration::days(1),
            }
        }
        TimeGrain::Quarter => {
            let quarter_month = 3 * ((date.month() - 1) / 3) + 1;
            let start = first_of_month(date.year(), quarter_month);
            Period {
                start,
                end: shift_months(start, 3) - Duration::days(1),
            }
        }
        TimeGrain::Year => Period {
            start: first_of_month(date.year(), 1),
            end: NaiveDate::from_ymd_opt(date.year(), 12, 31)
                .expect("Dec 31 exists in every year"),
        },
    }
}

/// Compute the five standard lookback windows for a grain.
///
/// When "today" falls mid-period the anchor is the start of the current
/// (incomplete) period; otherwise it is the day after the most recently
/// completed period. Lookbacks always count backward from that boundary,
/// so the windows are stable regardless of where in the ongoing period
/// "today" falls. `end_date` is "today" for every option, deliberately
/// including the partial current period.
pub fn standard_periods(grain: TimeGrain, today: NaiveDate) -> [TimePeriodOption; 5] {
    let current = period_bounds(today, grain);
    let is_mid_period = today != current.end;

    let anchor = if is_mid_period {
        current.start
    } else {
        current.end + Duration::days(1)
    };

    let six_months_ago = shift_months(anchor, -6);
    let one_year_ago = shift_months(anchor, -12);
    let two_years_ago = shift_months(anchor, -24);

    let (three_periods_ago, six_periods_ago) = match grain {
        TimeGrain::Day => (anchor - Duration::days(3), anchor - Duration::days(6)),
        TimeGrain::Week => (anchor - Duration::weeks(3), anchor - Duration::weeks(6)),
        TimeGrain::Month => (shift_months(anchor, -3), shift_months(anchor, -6)),
        TimeGrain::Quarter => (shift_months(anchor, -9), shift_months(anchor, -18)),
        TimeGrain::Year => (shift_months(anchor, -36), shift_months(anchor, -72)),
    };

    let option = |name, label, from: NaiveDate| TimePeriodOption {
        name,
        label,
        start_date: period_bounds(from, grain).start,
        end_date: today,
    };

    [
        option("last_six_periods", "Last Six Periods", six_periods_ago),
        option("last_three_periods", "Last Three Periods", three_periods_ago),
        option("last_six_months", "Last Six Months", six_months_ago),
        option("last_year", "Last Year", one_year_ago),
        option("last_two_years", "Last Two Years", two_years_ago),
    ]
}

/// Shift a date by whole months, clamping the day-of-month to the target
/// month's length (Jan 31 + 1 month = Feb 28/29; Feb 29 - 12 months =
/// Feb 28).
pub(crate) fn shift_months(date: NaiveDate, delta: i32) -> NaiveDate {
    let shifted = if delta >= 0 {
        date.checked_add_months(Months::new(delta as u32))
    } else {
        date.checked_sub_months(Months::new(delta.unsigned_abs()))
    };
    shifted.expect("month arithmetic within supported date range")
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).expect("day 1 exists in every month")
}
