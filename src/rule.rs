use chrono::{Datelike, Duration, NaiveDate};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Weekly,
    Monthly,
}

impl Cadence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cadence::Weekly => "weekly",
            Cadence::Monthly => "monthly",
        }
    }
}

impl FromStr for Cadence {
    type Err = RecurrenceError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "weekly" => Ok(Cadence::Weekly),
            "monthly" => Ok(Cadence::Monthly),
            other => Err(RecurrenceError::InvalidCadence(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecurrenceError {
    InvalidCadence(String),
    IntervalOutOfRange {
        cadence: Cadence,
        interval: u32,
    },
    InvalidDayValue {
        cadence: Cadence,
        day: u32,
    },
    EndBeforeStart {
        start: NaiveDate,
        end: NaiveDate,
    },
    RangeTooLarge {
        span_days: i64,
    },
}

impl fmt::Display for RecurrenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecurrenceError::InvalidCadence(input) => write!(
                f,
                "unrecognized cadence '{input}' (expected weekly or monthly)"
            ),
            RecurrenceError::IntervalOutOfRange {
                cadence: Cadence::Weekly,
                interval,
            } => write!(f, "weekly interval {interval} out of range (expected 1..=12)"),
            RecurrenceError::IntervalOutOfRange {
                cadence: Cadence::Monthly,
                interval,
            } => write!(f, "monthly interval {interval} is not supported (must be 1)"),
            RecurrenceError::InvalidDayValue {
                cadence: Cadence::Weekly,
                day,
            } => write!(
                f,
                "weekday value {day} out of range (expected 0..=6, Monday is 0)"
            ),
            RecurrenceError::InvalidDayValue {
                cadence: Cadence::Monthly,
                day,
            } => write!(
                f,
                "day-of-month value {day} out of range (expected 1..=31)"
            ),
            RecurrenceError::EndBeforeStart { start, end } => {
                write!(f, "end date {end} is before start date {start}")
            }
            RecurrenceError::RangeTooLarge { span_days } => write!(
                f,
                "resolved sampling span of {span_days} days exceeds the 1825 day ceiling"
            ),
        }
    }
}

impl std::error::Error for RecurrenceError {}

/// Unvalidated rule descriptor as supplied by callers or deserialized input.
///
/// `days: None` means "use the cadence default": the start date's weekday for
/// weekly rules, the empty set for monthly ones. An explicit empty set is kept
/// as-is and never matches any date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub name: String,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub cadence: Cadence,
    #[serde(default = "default_interval")]
    pub interval: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<BTreeSet<u32>>,
    #[serde(default)]
    pub clamp_to_month_end: bool,
}

fn default_interval() -> u32 {
    1
}

impl RuleSpec {
    pub fn weekly(name: impl Into<String>, start_date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            start_date,
            end_date: None,
            cadence: Cadence::Weekly,
            interval: 1,
            days: None,
            clamp_to_month_end: false,
        }
    }

    pub fn monthly(name: impl Into<String>, start_date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            start_date,
            end_date: None,
            cadence: Cadence::Monthly,
            interval: 1,
            days: None,
            clamp_to_month_end: false,
        }
    }

    pub fn build(self) -> Result<RecurrenceRule, RecurrenceError> {
        RecurrenceRule::try_from(self)
    }
}

/// Validated, immutable description of how an event repeats.
///
/// Construction goes through [`RuleSpec`] and fails with a [`RecurrenceError`]
/// on any out-of-domain field; a value of this type never needs re-checking.
/// Deriving a modified rule means editing a fresh spec from [`to_spec`] and
/// building again.
///
/// [`to_spec`]: RecurrenceRule::to_spec
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RuleSpec")]
pub struct RecurrenceRule {
    name: String,
    start_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_date: Option<NaiveDate>,
    cadence: Cadence,
    interval: u32,
    days: BTreeSet<u32>,
    clamp_to_month_end: bool,
}

impl TryFrom<RuleSpec> for RecurrenceRule {
    type Error = RecurrenceError;

    fn try_from(spec: RuleSpec) -> Result<Self, Self::Error> {
        match spec.cadence {
            Cadence::Weekly => {
                if !(1..=12).contains(&spec.interval) {
                    return Err(RecurrenceError::IntervalOutOfRange {
                        cadence: spec.cadence,
                        interval: spec.interval,
                    });
                }
            }
            Cadence::Monthly => {
                if spec.interval != 1 {
                    return Err(RecurrenceError::IntervalOutOfRange {
                        cadence: spec.cadence,
                        interval: spec.interval,
                    });
                }
            }
        }

        let days = match spec.days {
            Some(days) => days,
            None => match spec.cadence {
                Cadence::Weekly => {
                    BTreeSet::from([spec.start_date.weekday().num_days_from_monday()])
                }
                Cadence::Monthly => BTreeSet::new(),
            },
        };
        for &day in &days {
            let valid = match spec.cadence {
                Cadence::Weekly => day <= 6,
                Cadence::Monthly => (1..=31).contains(&day),
            };
            if !valid {
                return Err(RecurrenceError::InvalidDayValue {
                    cadence: spec.cadence,
                    day,
                });
            }
        }

        if let Some(end) = spec.end_date {
            if end < spec.start_date {
                return Err(RecurrenceError::EndBeforeStart {
                    start: spec.start_date,
                    end,
                });
            }
        }

        Ok(Self {
            name: spec.name,
            start_date: spec.start_date,
            end_date: spec.end_date,
            cadence: spec.cadence,
            interval: spec.interval,
            days,
            clamp_to_month_end: spec.clamp_to_month_end,
        })
    }
}

impl RecurrenceRule {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    pub fn cadence(&self) -> Cadence {
        self.cadence
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn days(&self) -> &BTreeSet<u32> {
        &self.days
    }

    pub fn clamp_to_month_end(&self) -> bool {
        self.clamp_to_month_end
    }

    /// Produce a mutable descriptor carrying this rule's fields.
    pub fn to_spec(&self) -> RuleSpec {
        RuleSpec {
            name: self.name.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            cadence: self.cadence,
            interval: self.interval,
            days: Some(self.days.clone()),
            clamp_to_month_end: self.clamp_to_month_end,
        }
    }

    /// Check whether the rule's event occurs on the given date.
    pub fn occurs_on(&self, date: NaiveDate) -> bool {
        if date < self.start_date {
            return false;
        }
        if let Some(end) = self.end_date {
            if date > end {
                return false;
            }
        }
        match self.cadence {
            Cadence::Weekly => self.matches_weekly(date),
            Cadence::Monthly => self.matches_monthly(date),
        }
    }

    fn matches_weekly(&self, date: NaiveDate) -> bool {
        if !self.days.contains(&date.weekday().num_days_from_monday()) {
            return false;
        }
        // Weeks elapsed are counted from the literal start date, not from the
        // Monday of the start week.
        let weeks_since_start = (date - self.start_date).num_days() / 7;
        weeks_since_start % i64::from(self.interval) == 0
    }

    fn matches_monthly(&self, date: NaiveDate) -> bool {
        let months_since_start = crate::calculations::months_between(self.start_date, date);
        if months_since_start % self.interval as i32 != 0 {
            return false;
        }
        if self.clamp_to_month_end {
            let last_day = last_day_of_month(date.year(), date.month());
            self.days.iter().any(|&day| day.min(last_day) == date.day())
        } else {
            self.days.contains(&date.day())
        }
    }

    /// Coarse window-overlap test; necessary but not sufficient for an
    /// occurrence inside the window.
    pub fn active_during(&self, window_start: NaiveDate, window_end: NaiveDate) -> bool {
        if self.start_date > window_end {
            return false;
        }
        match self.end_date {
            Some(end) => end >= window_start,
            None => true,
        }
    }

    /// Every occurrence date inside `[window_start, window_end]`, in order.
    ///
    /// Scans day by day; callers are responsible for keeping the window a
    /// few years at most.
    pub fn occurrences_between(
        &self,
        window_start: NaiveDate,
        window_end: NaiveDate,
    ) -> Vec<NaiveDate> {
        if !self.active_during(window_start, window_end) {
            return Vec::new();
        }
        let mut occurrences = Vec::new();
        let mut current = window_start;
        while current <= window_end {
            if self.occurs_on(current) {
                occurrences.push(current);
            }
            current = current + Duration::days(1);
        }
        occurrences
    }
}

/// Keep only the rules whose validity window overlaps the query window,
/// preserving input order.
pub fn filter_active(
    rules: &[RecurrenceRule],
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Vec<&RecurrenceRule> {
    let active: Vec<&RecurrenceRule> = rules
        .iter()
        .filter(|rule| rule.active_during(window_start, window_end))
        .collect();
    debug!(
        "{} of {} rules active between {} and {}",
        active.len(),
        rules.len(),
        window_start,
        window_end
    );
    active
}

fn last_day_of_month(year: i32, month: u32) -> u32 {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    (first_of_next.unwrap() - Duration::days(1)).day()
}
