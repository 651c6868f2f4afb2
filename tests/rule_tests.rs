use std::collections::BTreeSet;

use cadence_tool::{Cadence, RecurrenceError, RecurrenceRule, RuleSpec, filter_active};
use chrono::NaiveDate;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn days(values: &[u32]) -> Option<BTreeSet<u32>> {
    Some(values.iter().copied().collect())
}

#[test]
fn weekly_defaults_to_the_start_weekday() {
    // 2024-03-06 is a Wednesday.
    let rule = RuleSpec::weekly("standup", d(2024, 3, 6)).build().unwrap();

    assert_eq!(rule.days(), &BTreeSet::from([2]));
    assert!(rule.occurs_on(d(2024, 3, 6)));
    assert!(rule.occurs_on(d(2024, 3, 13)));
    assert!(!rule.occurs_on(d(2024, 3, 7)));
}

#[test]
fn weekly_counts_weeks_from_the_literal_start_date() {
    // 2024-03-06 is a Wednesday; Monday and Friday picked, every second week.
    let mut spec = RuleSpec::weekly("gym", d(2024, 3, 6));
    spec.interval = 2;
    spec.days = days(&[0, 4]);
    let rule = spec.build().unwrap();

    // The Friday two days after the start is still in week zero.
    assert!(rule.occurs_on(d(2024, 3, 8)));
    // So is the following Monday, five days in.
    assert!(rule.occurs_on(d(2024, 3, 11)));
    // Week one is skipped entirely.
    assert!(!rule.occurs_on(d(2024, 3, 15)));
    assert!(!rule.occurs_on(d(2024, 3, 18)));
    // Week two matches again.
    assert!(rule.occurs_on(d(2024, 3, 22)));
}

#[test]
fn biweekly_rules_alternate_weeks() {
    // 2024-03-01 is a Friday.
    let mut spec = RuleSpec::weekly("payday", d(2024, 3, 1));
    spec.interval = 2;
    spec.days = days(&[4]);
    let rule = spec.build().unwrap();

    assert!(rule.occurs_on(d(2024, 3, 1)));
    assert!(!rule.occurs_on(d(2024, 3, 8)));
    assert!(rule.occurs_on(d(2024, 3, 15)));
}

#[test]
fn dates_outside_the_validity_window_never_occur() {
    // 2024-01-01 and 2024-12-30 are Mondays.
    let mut spec = RuleSpec::weekly("rent", d(2024, 1, 1));
    spec.end_date = Some(d(2024, 12, 30));
    let rule = spec.build().unwrap();

    assert!(!rule.occurs_on(d(2023, 12, 25)));
    assert!(rule.occurs_on(d(2024, 1, 1)));
    assert!(rule.occurs_on(d(2024, 12, 30)));
    assert!(!rule.occurs_on(d(2025, 1, 6)));
}

#[test]
fn monthly_matches_configured_days_every_month() {
    let mut spec = RuleSpec::monthly("salary", d(2024, 1, 1));
    spec.days = days(&[15]);
    let rule = spec.build().unwrap();

    assert!(rule.occurs_on(d(2024, 1, 15)));
    assert!(rule.occurs_on(d(2024, 2, 15)));
    assert!(rule.occurs_on(d(2025, 1, 15)));
    assert!(!rule.occurs_on(d(2024, 1, 16)));
}

#[test]
fn monthly_without_days_never_matches() {
    let rule = RuleSpec::monthly("placeholder", d(2024, 1, 1))
        .build()
        .unwrap();

    assert!(rule.days().is_empty());
    assert!(
        rule.occurrences_between(d(2024, 1, 1), d(2024, 12, 31))
            .is_empty()
    );
}

#[test]
fn explicit_empty_day_set_never_matches() {
    let mut spec = RuleSpec::weekly("muted", d(2024, 1, 1));
    spec.days = Some(BTreeSet::new());
    let rule = spec.build().unwrap();

    assert!(!rule.occurs_on(d(2024, 1, 1)));
    assert!(
        rule.occurrences_between(d(2024, 1, 1), d(2024, 3, 31))
            .is_empty()
    );
}

#[test]
fn clamp_pins_overflow_days_to_the_month_end() {
    let mut spec = RuleSpec::monthly("rent", d(2024, 1, 1));
    spec.days = days(&[31]);
    spec.clamp_to_month_end = true;
    let rule = spec.build().unwrap();

    assert!(rule.occurs_on(d(2024, 1, 31)));
    // 2024 is a leap year, so February clamps to the 29th.
    assert!(rule.occurs_on(d(2024, 2, 29)));
    assert!(!rule.occurs_on(d(2024, 2, 28)));
    assert!(rule.occurs_on(d(2024, 4, 30)));
    assert!(!rule.occurs_on(d(2024, 4, 29)));
    assert!(rule.occurs_on(d(2025, 2, 28)));
}

#[test]
fn unclamped_overflow_days_skip_short_months() {
    let mut spec = RuleSpec::monthly("rent", d(2024, 1, 1));
    spec.days = days(&[31]);
    let rule = spec.build().unwrap();

    assert!(rule.occurs_on(d(2024, 1, 31)));
    assert!(!rule.occurs_on(d(2024, 2, 29)));
    assert!(rule.occurs_on(d(2024, 3, 31)));
}

#[test]
fn weekly_interval_must_stay_within_twelve() {
    let mut spec = RuleSpec::weekly("r", d(2024, 1, 1));
    spec.interval = 0;
    assert!(matches!(
        spec.build(),
        Err(RecurrenceError::IntervalOutOfRange { interval: 0, .. })
    ));

    let mut spec = RuleSpec::weekly("r", d(2024, 1, 1));
    spec.interval = 13;
    assert!(matches!(
        spec.build(),
        Err(RecurrenceError::IntervalOutOfRange { interval: 13, .. })
    ));

    let mut spec = RuleSpec::weekly("r", d(2024, 1, 1));
    spec.interval = 12;
    assert!(spec.build().is_ok());
}

#[test]
fn monthly_interval_other_than_one_is_rejected() {
    let mut spec = RuleSpec::monthly("r", d(2024, 1, 1));
    spec.interval = 2;
    assert!(matches!(
        spec.build(),
        Err(RecurrenceError::IntervalOutOfRange { interval: 2, .. })
    ));
}

#[test]
fn day_values_are_checked_per_cadence() {
    let mut spec = RuleSpec::weekly("r", d(2024, 1, 1));
    spec.days = days(&[7]);
    assert!(matches!(
        spec.build(),
        Err(RecurrenceError::InvalidDayValue { day: 7, .. })
    ));

    let mut spec = RuleSpec::monthly("r", d(2024, 1, 1));
    spec.days = days(&[0]);
    assert!(matches!(
        spec.build(),
        Err(RecurrenceError::InvalidDayValue { day: 0, .. })
    ));

    let mut spec = RuleSpec::monthly("r", d(2024, 1, 1));
    spec.days = days(&[32]);
    assert!(matches!(
        spec.build(),
        Err(RecurrenceError::InvalidDayValue { day: 32, .. })
    ));
}

#[test]
fn end_date_before_start_is_rejected() {
    let mut spec = RuleSpec::weekly("r", d(2024, 6, 1));
    spec.end_date = Some(d(2024, 5, 31));
    assert!(matches!(
        spec.build(),
        Err(RecurrenceError::EndBeforeStart { .. })
    ));
}

#[test]
fn active_during_is_a_window_overlap_test() {
    let mut spec = RuleSpec::weekly("r", d(2024, 3, 1));
    spec.end_date = Some(d(2024, 6, 30));
    let rule = spec.build().unwrap();

    assert!(rule.active_during(d(2024, 1, 1), d(2024, 3, 1)));
    assert!(rule.active_during(d(2024, 6, 30), d(2024, 12, 31)));
    assert!(!rule.active_during(d(2024, 1, 1), d(2024, 2, 29)));
    assert!(!rule.active_during(d(2024, 7, 1), d(2024, 12, 31)));

    let open = RuleSpec::weekly("open", d(2024, 3, 1)).build().unwrap();
    assert!(open.active_during(d(2030, 1, 1), d(2030, 12, 31)));
    assert!(!open.active_during(d(2023, 1, 1), d(2024, 2, 29)));
}

#[test]
fn occurrences_between_enumerates_in_order() {
    let mut spec = RuleSpec::monthly("rent", d(2024, 3, 1));
    spec.days = days(&[1]);
    let rule = spec.build().unwrap();

    let dates = rule.occurrences_between(d(2024, 3, 1), d(2025, 3, 1));
    assert_eq!(dates.len(), 13);
    assert_eq!(dates.first(), Some(&d(2024, 3, 1)));
    assert_eq!(dates.last(), Some(&d(2025, 3, 1)));
    assert!(dates.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn occurrences_between_respects_the_rule_window() {
    let mut spec = RuleSpec::weekly("old", d(2024, 1, 1));
    spec.end_date = Some(d(2024, 1, 31));
    let rule = spec.build().unwrap();

    assert!(
        rule.occurrences_between(d(2024, 2, 1), d(2024, 12, 31))
            .is_empty()
    );
}

#[test]
fn filter_active_preserves_input_order() {
    let mut january = RuleSpec::weekly("january", d(2024, 1, 1));
    january.end_date = Some(d(2024, 1, 31));
    let mut spring = RuleSpec::weekly("spring", d(2024, 3, 1));
    spring.end_date = Some(d(2024, 5, 31));
    let open = RuleSpec::weekly("open", d(2024, 4, 1));

    let rules = vec![
        spring.build().unwrap(),
        january.build().unwrap(),
        open.build().unwrap(),
    ];

    let active = filter_active(&rules, d(2024, 4, 1), d(2024, 4, 30));
    let names: Vec<&str> = active.iter().map(|r| r.name()).collect();
    assert_eq!(names, ["spring", "open"]);
}

#[test]
fn rules_round_trip_through_json() {
    // 2024-01-05 is a Friday.
    let mut spec = RuleSpec::weekly("payday", d(2024, 1, 5));
    spec.interval = 2;
    spec.days = days(&[4]);
    spec.end_date = Some(d(2025, 1, 3));
    let rule = spec.build().unwrap();

    let json = serde_json::to_string(&rule).unwrap();
    let decoded: RecurrenceRule = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, rule);
}

#[test]
fn deserialization_rejects_out_of_domain_values() {
    let json = r#"{
        "name": "broken",
        "start_date": "2024-01-01",
        "cadence": "weekly",
        "interval": 0,
        "days": [0],
        "clamp_to_month_end": false
    }"#;

    let result: Result<RecurrenceRule, _> = serde_json::from_str(json);
    assert!(result.is_err());
}

#[test]
fn spec_deserialization_fills_defaults() {
    // 2024-01-05 is a Friday.
    let json = r#"{"name": "minimal", "start_date": "2024-01-05", "cadence": "weekly"}"#;

    let rule: RecurrenceRule = serde_json::from_str(json).unwrap();
    assert_eq!(rule.interval(), 1);
    assert_eq!(rule.days(), &BTreeSet::from([4]));
    assert_eq!(rule.end_date(), None);
}

#[test]
fn cadence_parses_case_insensitively() {
    assert_eq!("weekly".parse::<Cadence>().unwrap(), Cadence::Weekly);
    assert_eq!("Monthly".parse::<Cadence>().unwrap(), Cadence::Monthly);
    assert!("daily".parse::<Cadence>().is_err());
}

#[test]
fn to_spec_allows_deriving_an_ended_rule() {
    let rule = RuleSpec::weekly("subscription", d(2024, 1, 1))
        .build()
        .unwrap();

    let mut spec = rule.to_spec();
    spec.end_date = Some(d(2024, 6, 30));
    let ended = spec.build().unwrap();

    assert_eq!(ended.end_date(), Some(d(2024, 6, 30)));
    assert_eq!(ended.days(), rule.days());
}
