use super::{PersistenceError, PersistenceResult};
use crate::calculations::WeeklyLoadReport;
use crate::ledger::{Ledger, LedgerEntry};
use crate::rule::{Cadence, RecurrenceError, RuleSpec};
use crate::transaction::{TransactionError, TransactionProfile};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;

#[derive(Serialize, Deserialize)]
struct LedgerSnapshot {
    entries: Vec<LedgerEntry>,
}

pub fn save_ledger_to_json<P: AsRef<Path>>(ledger: &Ledger, path: P) -> PersistenceResult<()> {
    super::validate_entries(ledger.entries())?;
    let snapshot = LedgerSnapshot {
        entries: ledger.entries().to_vec(),
    };
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    Ok(())
}

pub fn load_ledger_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Ledger> {
    let file = File::open(path)?;
    let snapshot: LedgerSnapshot = serde_json::from_reader(file)?;
    super::validate_entries(&snapshot.entries)?;
    Ok(Ledger::from_entries(snapshot.entries))
}

#[derive(Serialize, Deserialize)]
struct EntryCsvRecord {
    id: i64,
    name: String,
    cadence: String,
    interval: u32,
    start_date: String,
    end_date: String,
    days: String,
    clamp_to_month_end: bool,
    payload_amount: String,
    payload_kind: String,
    payload_owner: String,
}

impl From<&LedgerEntry> for EntryCsvRecord {
    fn from(entry: &LedgerEntry) -> Self {
        let rule = &entry.rule;
        let payload = entry.payload.as_ref();
        Self {
            id: entry.id,
            name: rule.name().to_string(),
            cadence: rule.cadence().as_str().to_string(),
            interval: rule.interval(),
            start_date: format_date(Some(rule.start_date())),
            end_date: format_date(rule.end_date()),
            days: join_days(rule.days()),
            clamp_to_month_end: rule.clamp_to_month_end(),
            payload_amount: payload.map(|p| p.amount().to_string()).unwrap_or_default(),
            payload_kind: payload
                .map(|p| p.kind().as_str().to_string())
                .unwrap_or_default(),
            payload_owner: payload.map(|p| p.owner().to_string()).unwrap_or_default(),
        }
    }
}

impl EntryCsvRecord {
    fn into_entry(self) -> PersistenceResult<LedgerEntry> {
        let cadence: Cadence = self
            .cadence
            .parse()
            .map_err(|e: RecurrenceError| PersistenceError::InvalidData(e.to_string()))?;
        let start_date = parse_date(&self.start_date)?.ok_or_else(|| {
            PersistenceError::InvalidData("missing start_date in CSV row".into())
        })?;
        let spec = RuleSpec {
            name: self.name,
            cadence,
            interval: self.interval,
            start_date,
            end_date: parse_date(&self.end_date)?,
            days: Some(split_days(&self.days)?),
            clamp_to_month_end: self.clamp_to_month_end,
        };
        let rule = spec
            .build()
            .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;

        let payload = if self.payload_kind.trim().is_empty() {
            None
        } else {
            let amount = self.payload_amount.trim().parse::<f64>().map_err(|e| {
                PersistenceError::InvalidData(format!(
                    "invalid amount '{}': {e}",
                    self.payload_amount
                ))
            })?;
            let kind = self
                .payload_kind
                .parse()
                .map_err(|e: TransactionError| PersistenceError::InvalidData(e.to_string()))?;
            let profile = TransactionProfile::new(amount, kind, self.payload_owner)
                .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;
            Some(profile)
        };

        Ok(LedgerEntry {
            id: self.id,
            rule,
            payload,
        })
    }
}

pub fn save_ledger_to_csv<P: AsRef<Path>>(ledger: &Ledger, path: P) -> PersistenceResult<()> {
    super::validate_entries(ledger.entries())?;
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for entry in ledger.entries() {
        writer.serialize(EntryCsvRecord::from(entry))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_ledger_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Ledger> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut entries = Vec::new();
    for record in reader.deserialize::<EntryCsvRecord>() {
        let record = record?;
        entries.push(record.into_entry()?);
    }

    if entries.is_empty() {
        return Err(PersistenceError::InvalidData(
            "CSV file contained no rules".into(),
        ));
    }

    super::validate_entries(&entries)?;
    Ok(Ledger::from_entries(entries))
}

#[derive(Serialize)]
struct ReportCsvRecord {
    week_start: String,
    occurrences: u32,
}

pub fn save_report_to_csv<P: AsRef<Path>>(
    report: &WeeklyLoadReport,
    path: P,
) -> PersistenceResult<()> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for (week, count) in report.weeks() {
        writer.serialize(ReportCsvRecord {
            week_start: format_date(Some(*week)),
            occurrences: *count,
        })?;
    }
    writer.flush()?;
    Ok(())
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn parse_date(input: &str) -> PersistenceResult<Option<NaiveDate>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map(Some)
        .map_err(|e| PersistenceError::InvalidData(format!("invalid date '{input}': {e}")))
}

fn join_days(days: &BTreeSet<u32>) -> String {
    days.iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn split_days(input: &str) -> PersistenceResult<BTreeSet<u32>> {
    if input.trim().is_empty() {
        return Ok(BTreeSet::new());
    }
    input
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<u32>()
                .map_err(|e| PersistenceError::InvalidData(format!("invalid day '{part}': {e}")))
        })
        .collect()
}
