use crate::ledger::{Ledger, LedgerEntry};
use crate::rule::RecurrenceRule;
use crate::transaction::TransactionProfile;
use serde_json::Error as SerdeJsonError;
use std::collections::HashSet;
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum PersistenceError {
    Serialization(SerdeJsonError),
    Io(io::Error),
    #[cfg(feature = "sqlite")]
    Sqlite(rusqlite::Error),
    Csv(csv::Error),
    InvalidData(String),
    NotFound,
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::Serialization(err) => write!(f, "serialization error: {err}"),
            PersistenceError::Io(err) => write!(f, "io error: {err}"),
            #[cfg(feature = "sqlite")]
            PersistenceError::Sqlite(err) => write!(f, "sqlite error: {err}"),
            PersistenceError::Csv(err) => write!(f, "csv error: {err}"),
            PersistenceError::InvalidData(msg) => write!(f, "invalid data: {msg}"),
            PersistenceError::NotFound => write!(f, "no rule stored with that id"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<SerdeJsonError> for PersistenceError {
    fn from(value: SerdeJsonError) -> Self {
        Self::Serialization(value)
    }
}

impl From<io::Error> for PersistenceError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for PersistenceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<csv::Error> for PersistenceError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Id-keyed storage for rules and their payloads.
pub trait LedgerStore {
    fn insert_rule(&self, rule: &RecurrenceRule) -> PersistenceResult<i64>;
    fn rule(&self, id: i64) -> PersistenceResult<Option<RecurrenceRule>>;
    fn update_rule(&self, id: i64, rule: &RecurrenceRule) -> PersistenceResult<()>;
    fn delete_rule(&self, id: i64) -> PersistenceResult<bool>;
    fn set_payload(&self, id: i64, payload: &TransactionProfile) -> PersistenceResult<()>;
    fn clear_payload(&self, id: i64) -> PersistenceResult<bool>;
    fn payload(&self, id: i64) -> PersistenceResult<Option<TransactionProfile>>;
    fn load_ledger(&self) -> PersistenceResult<Ledger>;
    fn replace_ledger(&self, ledger: &Ledger) -> PersistenceResult<()>;
}

pub fn validate_entries(entries: &[LedgerEntry]) -> PersistenceResult<()> {
    let mut seen_ids = HashSet::with_capacity(entries.len());
    for entry in entries {
        if !seen_ids.insert(entry.id) {
            return Err(PersistenceError::InvalidData(format!(
                "duplicate rule id {}",
                entry.id
            )));
        }
        if let Some(payload) = &entry.payload {
            payload
                .validate()
                .map_err(|err| PersistenceError::InvalidData(err.to_string()))?;
        }
    }
    Ok(())
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    load_ledger_from_csv, load_ledger_from_json, save_ledger_to_csv, save_ledger_to_json,
    save_report_to_csv,
};
