use chrono::{Duration, NaiveDate};
use log::debug;
use polars::prelude::PlSmallStr;
use polars::prelude::*;
use rayon::prelude::*;
use std::collections::BTreeMap;

use crate::calculations::{DEFAULT_WEEK_LIMIT, WeekSampler, week_range};
use crate::rule::{RecurrenceError, RecurrenceRule, filter_active};

/// Ordered mapping from week-start Monday to total occurrence count.
///
/// Produced fresh per query and never persisted; export it or turn it into a
/// DataFrame for display instead.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyLoadReport {
    weeks: BTreeMap<NaiveDate, u32>,
}

impl WeeklyLoadReport {
    pub fn weeks(&self) -> &BTreeMap<NaiveDate, u32> {
        &self.weeks
    }

    pub fn len(&self) -> usize {
        self.weeks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }

    pub fn total_occurrences(&self) -> u32 {
        self.weeks.values().sum()
    }

    /// One-line digest for prompts and logs.
    pub fn summary(&self) -> String {
        if self.weeks.is_empty() {
            return "Total occurrences: 0 | Total weeks: 0 | Average per week: 0.00".to_string();
        }
        let total = self.total_occurrences();
        let average = f64::from(total) / self.weeks.len() as f64;
        format!(
            "Total occurrences: {} | Total weeks: {} | Average per week: {:.2}",
            total,
            self.weeks.len(),
            average
        )
    }

    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let week_data: Vec<Option<i32>> = self.weeks.keys().map(|&week| Some(date_to_i32(week))).collect();
        let count_data: Vec<i64> = self.weeks.values().map(|&count| i64::from(count)).collect();

        let week_series =
            Series::new(PlSmallStr::from_static("week_start"), week_data).cast(&DataType::Date)?;
        let count_series = Series::new(PlSmallStr::from_static("occurrences"), count_data);
        DataFrame::new(vec![week_series.into_column(), count_series.into_column()])
    }
}

/// Previews the weekly schedule load of adding `candidate` on top of the
/// `existing` rules, without writing anything to storage.
pub struct LoadEstimator<'a> {
    candidate: &'a RecurrenceRule,
    existing: &'a [RecurrenceRule],
    week_limit: usize,
}

impl<'a> LoadEstimator<'a> {
    pub fn new(candidate: &'a RecurrenceRule, existing: &'a [RecurrenceRule]) -> Self {
        Self {
            candidate,
            existing,
            week_limit: DEFAULT_WEEK_LIMIT,
        }
    }

    pub fn with_week_limit(mut self, week_limit: usize) -> Self {
        self.week_limit = week_limit;
        self
    }

    /// Count, per sampled week of the candidate, every occurrence of the
    /// existing rules between that week's Monday and Sunday.
    pub fn estimate(&self) -> Result<WeeklyLoadReport, RecurrenceError> {
        let sampler = WeekSampler::new(self.candidate).with_week_limit(self.week_limit);
        // Existing rules are filtered against the same horizon the sampler
        // resolves, so an open-ended candidate never under-filters.
        let horizon = sampler.effective_end();
        let weeks = sampler.sample()?;
        let relevant = filter_active(self.existing, self.candidate.start_date(), horizon);
        debug!(
            "estimating load across {} weeks against {} active rules",
            weeks.len(),
            relevant.len()
        );

        // Each week's count is independent; evaluate them in parallel and
        // merge into the ordered map afterward.
        let counts: Vec<(NaiveDate, u32)> = weeks
            .par_iter()
            .map(|&monday| {
                let (week_begin, week_end) = week_range(monday);
                let mut count = 0u32;
                for rule in &relevant {
                    let mut day = week_begin;
                    while day <= week_end {
                        if rule.occurs_on(day) {
                            count += 1;
                        }
                        day = day + Duration::days(1);
                    }
                }
                (monday, count)
            })
            .collect();

        let mut weeks_map = BTreeMap::new();
        for (monday, count) in counts {
            weeks_map.insert(monday, count);
        }
        Ok(WeeklyLoadReport { weeks: weeks_map })
    }
}

fn date_to_i32(date: NaiveDate) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    (date - epoch).num_days() as i32
}
