use chrono::NaiveDate;
use polars::prelude::PlSmallStr;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::rule::RecurrenceRule;
use crate::transaction::TransactionProfile;

/// One stored rule plus its optional financial payload.
///
/// The payload is associated by id only; the rule itself stays
/// domain-agnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub rule: RecurrenceRule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<TransactionProfile>,
}

/// In-memory collection of identified rules, in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
    next_id: i64,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }

    /// Rebuild a ledger from stored entries; ids are expected to be unique
    /// (persistence loaders validate before calling this).
    pub fn from_entries(entries: Vec<LedgerEntry>) -> Self {
        let next_id = entries.iter().map(|entry| entry.id).max().map_or(1, |max| max + 1);
        Self { entries, next_id }
    }

    pub fn add(&mut self, rule: RecurrenceRule) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(LedgerEntry {
            id,
            rule,
            payload: None,
        });
        id
    }

    pub fn get(&self, id: i64) -> Option<&LedgerEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Swap in a newly built rule for an existing id. Rules are immutable, so
    /// updating one means replacing the whole value.
    pub fn replace_rule(&mut self, id: i64, rule: RecurrenceRule) -> bool {
        match self.entry_mut(id) {
            Some(entry) => {
                entry.rule = rule;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: i64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    pub fn set_payload(&mut self, id: i64, payload: TransactionProfile) -> bool {
        match self.entry_mut(id) {
            Some(entry) => {
                entry.payload = Some(payload);
                true
            }
            None => false,
        }
    }

    pub fn clear_payload(&mut self, id: i64) -> bool {
        match self.entry_mut(id) {
            Some(entry) => entry.payload.take().is_some(),
            None => false,
        }
    }

    pub fn payload(&self, id: i64) -> Option<&TransactionProfile> {
        self.get(id).and_then(|entry| entry.payload.as_ref())
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LedgerEntry> {
        self.entries.iter()
    }

    pub fn rules(&self) -> Vec<&RecurrenceRule> {
        self.entries.iter().map(|entry| &entry.rule).collect()
    }

    /// Entries whose rule's validity window overlaps the query window,
    /// preserving ledger order.
    pub fn active_during(
        &self,
        window_start: NaiveDate,
        window_end: NaiveDate,
    ) -> Vec<&LedgerEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.rule.active_during(window_start, window_end))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry_mut(&mut self, id: i64) -> Option<&mut LedgerEntry> {
        self.entries.iter_mut().find(|entry| entry.id == id)
    }

    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let height = self.entries.len();
        let mut ids: Vec<i64> = Vec::with_capacity(height);
        let mut names: Vec<&str> = Vec::with_capacity(height);
        let mut cadences: Vec<&str> = Vec::with_capacity(height);
        let mut intervals: Vec<i64> = Vec::with_capacity(height);
        let mut days_joined: Vec<String> = Vec::with_capacity(height);
        let mut starts: Vec<Option<i32>> = Vec::with_capacity(height);
        let mut ends: Vec<Option<i32>> = Vec::with_capacity(height);
        let mut clamps: Vec<bool> = Vec::with_capacity(height);
        let mut amounts: Vec<Option<f64>> = Vec::with_capacity(height);
        let mut kinds: Vec<Option<&str>> = Vec::with_capacity(height);
        let mut owners: Vec<Option<&str>> = Vec::with_capacity(height);

        for entry in &self.entries {
            ids.push(entry.id);
            names.push(entry.rule.name());
            cadences.push(entry.rule.cadence().as_str());
            intervals.push(i64::from(entry.rule.interval()));
            days_joined.push(
                entry
                    .rule
                    .days()
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(","),
            );
            starts.push(Some(date_to_i32(entry.rule.start_date())));
            ends.push(entry.rule.end_date().map(date_to_i32));
            clamps.push(entry.rule.clamp_to_month_end());
            amounts.push(entry.payload.as_ref().map(|payload| payload.amount()));
            kinds.push(entry.payload.as_ref().map(|payload| payload.kind().as_str()));
            owners.push(entry.payload.as_ref().map(|payload| payload.owner()));
        }
        let days_refs: Vec<&str> = days_joined.iter().map(String::as_str).collect();

        let start_series =
            Series::new(PlSmallStr::from_static("start_date"), starts).cast(&DataType::Date)?;
        let end_series =
            Series::new(PlSmallStr::from_static("end_date"), ends).cast(&DataType::Date)?;

        DataFrame::new(vec![
            Series::new(PlSmallStr::from_static("id"), ids).into_column(),
            Series::new(PlSmallStr::from_static("name"), names).into_column(),
            Series::new(PlSmallStr::from_static("cadence"), cadences).into_column(),
            Series::new(PlSmallStr::from_static("interval"), intervals).into_column(),
            Series::new(PlSmallStr::from_static("days"), days_refs).into_column(),
            start_series.into_column(),
            end_series.into_column(),
            Series::new(PlSmallStr::from_static("clamp_to_month_end"), clamps).into_column(),
            Series::new(PlSmallStr::from_static("amount"), amounts).into_column(),
            Series::new(PlSmallStr::from_static("kind"), kinds).into_column(),
            Series::new(PlSmallStr::from_static("owner"), owners).into_column(),
        ])
    }
}

fn date_to_i32(date: NaiveDate) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    (date - epoch).num_days() as i32
}
