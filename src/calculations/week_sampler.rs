use chrono::{Datelike, Duration, NaiveDate};
use log::debug;
use std::collections::BTreeSet;

use crate::calculations::{DEFAULT_WEEK_LIMIT, MAX_SAMPLE_SPAN_DAYS, months_between, week_start};
use crate::rule::{Cadence, RecurrenceError, RecurrenceRule};

/// Bounded, deterministic sample of the Mondays on which a rule is active.
///
/// Used when a caller wants a representative picture of a years-long or
/// open-ended recurrence without enumerating every occurrence. When the full
/// week sequence fits inside the limit it is returned whole; otherwise the
/// sample keeps the chronological head and tail and evenly spaced picks from
/// the middle span.
pub struct WeekSampler<'a> {
    rule: &'a RecurrenceRule,
    week_limit: usize,
}

impl<'a> WeekSampler<'a> {
    pub fn new(rule: &'a RecurrenceRule) -> Self {
        Self {
            rule,
            week_limit: DEFAULT_WEEK_LIMIT,
        }
    }

    pub fn with_week_limit(mut self, week_limit: usize) -> Self {
        self.week_limit = week_limit;
        self
    }

    pub fn week_limit(&self) -> usize {
        self.week_limit
    }

    /// The horizon sampling runs to: the rule's end date when bounded,
    /// otherwise `start + week_limit * interval` weeks.
    pub fn effective_end(&self) -> NaiveDate {
        match self.rule.end_date() {
            Some(end) => end,
            None => {
                self.rule.start_date()
                    + Duration::weeks(self.week_limit as i64 * i64::from(self.rule.interval()))
            }
        }
    }

    /// Sample at most `week_limit` Mondays, chronologically sorted and
    /// de-duplicated. Fails when the resolved span exceeds five years.
    pub fn sample(&self) -> Result<Vec<NaiveDate>, RecurrenceError> {
        let start = self.rule.start_date();
        let end = self.effective_end();
        let span_days = (end - start).num_days();
        if span_days > MAX_SAMPLE_SPAN_DAYS {
            return Err(RecurrenceError::RangeTooLarge { span_days });
        }

        let weeks = match self.rule.cadence() {
            Cadence::Weekly => self.weekly_weeks(start, end),
            Cadence::Monthly => self.monthly_weeks(start, end),
        };
        if weeks.len() <= self.week_limit {
            return Ok(weeks);
        }
        Ok(self.bounded_sample(&weeks))
    }

    fn weekly_weeks(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        let step = Duration::days(i64::from(self.rule.interval()) * 7);
        let mut weeks = Vec::new();
        let mut current = week_start(start);
        while current <= end {
            weeks.push(current);
            current = current + step;
        }
        weeks
    }

    fn monthly_weeks(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        // Several configured days can fall inside one week; the set collapses
        // them to a single Monday.
        let mut weeks = BTreeSet::new();
        let mut current = start;
        while current <= end {
            if self.rule.days().contains(&current.day())
                && months_between(start, current) % self.rule.interval() as i32 == 0
            {
                weeks.insert(week_start(current));
            }
            current = current + Duration::days(1);
        }
        weeks.into_iter().collect()
    }

    fn bounded_sample(&self, weeks: &[NaiveDate]) -> Vec<NaiveDate> {
        let batch = self.week_limit / 3;
        let mut picked: BTreeSet<NaiveDate> = BTreeSet::new();
        for &week in &weeks[..batch] {
            picked.insert(week);
        }
        for &week in &weeks[weeks.len() - batch..] {
            picked.insert(week);
        }
        // Middle picks land on the midpoint of each of `batch` equal strata
        // across the interior span, so repeated runs are identical.
        let middle_len = weeks.len() - 2 * batch;
        for i in 0..batch {
            let offset = (middle_len * (2 * i + 1)) / (2 * batch);
            picked.insert(weeks[batch + offset]);
        }
        debug!(
            "sampled {} of {} candidate weeks (limit {})",
            picked.len(),
            weeks.len(),
            self.week_limit
        );
        picked.into_iter().collect()
    }
}
