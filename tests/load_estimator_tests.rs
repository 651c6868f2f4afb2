use cadence_tool::{LoadEstimator, RecurrenceError, RecurrenceRule, RuleSpec};
use chrono::NaiveDate;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn weekly(name: &str, start: NaiveDate, days: &[u32]) -> RecurrenceRule {
    let mut spec = RuleSpec::weekly(name, start);
    spec.days = Some(days.iter().copied().collect());
    spec.build().unwrap()
}

#[test]
fn empty_ledger_reports_zero_load() {
    // 2024-01-01 and 2024-02-19 are Mondays, eight weeks apart inclusive.
    let mut spec = RuleSpec::weekly("candidate", d(2024, 1, 1));
    spec.end_date = Some(d(2024, 2, 19));
    let candidate = spec.build().unwrap();

    let report = LoadEstimator::new(&candidate, &[]).estimate().unwrap();

    assert_eq!(report.len(), 8);
    assert!(report.weeks().values().all(|&count| count == 0));
    assert_eq!(
        report.summary(),
        "Total occurrences: 0 | Total weeks: 8 | Average per week: 0.00"
    );
}

#[test]
fn reports_with_no_weeks_summarize_to_zero() {
    // Monthly rules default to an empty day set, so nothing gets sampled.
    let candidate = RuleSpec::monthly("never", d(2024, 3, 1)).build().unwrap();

    let report = LoadEstimator::new(&candidate, &[]).estimate().unwrap();

    assert!(report.is_empty());
    assert_eq!(
        report.summary(),
        "Total occurrences: 0 | Total weeks: 0 | Average per week: 0.00"
    );
}

#[test]
fn existing_occurrences_are_counted_per_sampled_week() {
    // Candidate covers the two weeks starting 2024-03-04 and 2024-03-11.
    let mut spec = RuleSpec::weekly("candidate", d(2024, 3, 4));
    spec.end_date = Some(d(2024, 3, 17));
    let candidate = spec.build().unwrap();

    let mut mid_month = RuleSpec::monthly("mid-month", d(2024, 1, 1));
    mid_month.days = Some([15].into_iter().collect());

    let existing = vec![
        // Mondays and Wednesdays, two hits in every week.
        weekly("twice", d(2024, 3, 4), &[0, 2]),
        // 2024-03-15 lands in the second sampled week.
        mid_month.build().unwrap(),
        // Starts after the sampling horizon and must not be counted.
        weekly("later", d(2024, 5, 1), &[0]),
    ];

    let report = LoadEstimator::new(&candidate, &existing)
        .estimate()
        .unwrap();

    let weeks: Vec<(NaiveDate, u32)> = report.weeks().iter().map(|(&k, &v)| (k, v)).collect();
    assert_eq!(weeks, vec![(d(2024, 3, 4), 2), (d(2024, 3, 11), 3)]);
    assert_eq!(report.total_occurrences(), 5);
    assert_eq!(
        report.summary(),
        "Total occurrences: 5 | Total weeks: 2 | Average per week: 2.50"
    );
}

#[test]
fn week_limit_flows_through_to_the_sampler() {
    // 2024-01-01 is a Monday.
    let candidate = RuleSpec::weekly("candidate", d(2024, 1, 1)).build().unwrap();
    let existing = vec![weekly("mondays", d(2024, 1, 1), &[0])];

    let report = LoadEstimator::new(&candidate, &existing)
        .with_week_limit(4)
        .estimate()
        .unwrap();

    let weeks: Vec<(NaiveDate, u32)> = report.weeks().iter().map(|(&k, &v)| (k, v)).collect();
    assert_eq!(
        weeks,
        vec![
            (d(2024, 1, 1), 1),
            (d(2024, 1, 15), 1),
            (d(2024, 1, 29), 1),
        ]
    );
}

#[test]
fn report_keys_stay_chronological() {
    let mut spec = RuleSpec::weekly("candidate", d(2024, 1, 1));
    spec.end_date = Some(d(2024, 3, 25));
    let candidate = spec.build().unwrap();

    let report = LoadEstimator::new(&candidate, &[]).estimate().unwrap();
    let keys: Vec<NaiveDate> = report.weeks().keys().copied().collect();
    assert!(keys.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn sampler_errors_propagate() {
    let mut spec = RuleSpec::weekly("quarterly", d(2024, 1, 1));
    spec.interval = 12;
    let candidate = spec.build().unwrap();

    assert!(matches!(
        LoadEstimator::new(&candidate, &[]).estimate(),
        Err(RecurrenceError::RangeTooLarge { .. })
    ));
}

#[test]
fn report_converts_to_a_dataframe() {
    let mut spec = RuleSpec::weekly("candidate", d(2024, 3, 4));
    spec.end_date = Some(d(2024, 3, 17));
    let candidate = spec.build().unwrap();
    let existing = vec![weekly("twice", d(2024, 3, 4), &[0, 2])];

    let report = LoadEstimator::new(&candidate, &existing)
        .estimate()
        .unwrap();
    let df = report.to_dataframe().unwrap();

    assert_eq!(df.height(), 2);
    assert_eq!(df.width(), 2);
    assert!(df.column("week_start").is_ok());
    assert!(df.column("occurrences").is_ok());
}
