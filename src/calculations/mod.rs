use chrono::{Datelike, Duration, NaiveDate};

pub mod load_estimator;
pub mod week_sampler;

pub use load_estimator::{LoadEstimator, WeeklyLoadReport};
pub use week_sampler::WeekSampler;

/// Week count a sampler falls back to when the caller does not pick one.
pub const DEFAULT_WEEK_LIMIT: usize = 48;

/// Hard ceiling on the resolved sampling span: five years.
pub const MAX_SAMPLE_SPAN_DAYS: i64 = 1825;

/// The Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// The Monday-to-Sunday span of the week containing `date`.
pub fn week_range(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let monday = week_start(date);
    (monday, monday + Duration::days(6))
}

/// Whole months elapsed between two dates, ignoring the day-of-month.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    (to.year() - from.year()) * 12 + (to.month() as i32 - from.month() as i32)
}
