use super::{LedgerStore, PersistenceError, PersistenceResult};
use crate::ledger::{Ledger, LedgerEntry};
use crate::rule::RecurrenceRule;
use crate::transaction::TransactionProfile;
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::HashMap;
use std::sync::Mutex;

pub struct SqliteLedgerStore {
    connection: Mutex<Connection>,
}

impl SqliteLedgerStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS rules (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                rule_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS payloads (
                rule_id INTEGER PRIMARY KEY REFERENCES rules(id) ON DELETE CASCADE,
                payload_json TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn insert_entries(tx: &rusqlite::Transaction, ledger: &Ledger) -> PersistenceResult<()> {
        let mut rule_stmt = tx.prepare("INSERT INTO rules (id, rule_json) VALUES (?1, ?2)")?;
        let mut payload_stmt =
            tx.prepare("INSERT INTO payloads (rule_id, payload_json) VALUES (?1, ?2)")?;
        for entry in ledger.entries() {
            let rule_json = serde_json::to_string(&entry.rule)?;
            rule_stmt.execute(params![entry.id, rule_json])?;
            if let Some(payload) = &entry.payload {
                let payload_json = serde_json::to_string(payload)?;
                payload_stmt.execute(params![entry.id, payload_json])?;
            }
        }
        Ok(())
    }
}

impl LedgerStore for SqliteLedgerStore {
    fn insert_rule(&self, rule: &RecurrenceRule) -> PersistenceResult<i64> {
        let json = serde_json::to_string(rule)?;
        let conn = self.connection.lock().expect("sqlite mutex poisoned");
        conn.execute("INSERT INTO rules (rule_json) VALUES (?1)", params![json])?;
        Ok(conn.last_insert_rowid())
    }

    fn rule(&self, id: i64) -> PersistenceResult<Option<RecurrenceRule>> {
        let conn = self.connection.lock().expect("sqlite mutex poisoned");
        let mut stmt = conn.prepare("SELECT rule_json FROM rules WHERE id = ?1")?;
        let json_opt: Option<String> = stmt.query_row(params![id], |row| row.get(0)).optional()?;

        let Some(json) = json_opt else {
            return Ok(None);
        };

        let rule: RecurrenceRule = serde_json::from_str(&json)?;
        Ok(Some(rule))
    }

    fn update_rule(&self, id: i64, rule: &RecurrenceRule) -> PersistenceResult<()> {
        let json = serde_json::to_string(rule)?;
        let conn = self.connection.lock().expect("sqlite mutex poisoned");
        let changed = conn.execute(
            "UPDATE rules SET rule_json = ?1 WHERE id = ?2",
            params![json, id],
        )?;
        if changed == 0 {
            return Err(PersistenceError::NotFound);
        }
        Ok(())
    }

    fn delete_rule(&self, id: i64) -> PersistenceResult<bool> {
        let conn = self.connection.lock().expect("sqlite mutex poisoned");
        // Payload rows ride on the foreign key cascade.
        let deleted = conn.execute("DELETE FROM rules WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    fn set_payload(&self, id: i64, payload: &TransactionProfile) -> PersistenceResult<()> {
        payload
            .validate()
            .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;
        let json = serde_json::to_string(payload)?;
        let conn = self.connection.lock().expect("sqlite mutex poisoned");

        let mut stmt = conn.prepare("SELECT 1 FROM rules WHERE id = ?1")?;
        let exists: Option<i64> = stmt.query_row(params![id], |row| row.get(0)).optional()?;
        if exists.is_none() {
            return Err(PersistenceError::NotFound);
        }

        conn.execute(
            "INSERT OR REPLACE INTO payloads (rule_id, payload_json) VALUES (?1, ?2)",
            params![id, json],
        )?;
        Ok(())
    }

    fn clear_payload(&self, id: i64) -> PersistenceResult<bool> {
        let conn = self.connection.lock().expect("sqlite mutex poisoned");
        let deleted = conn.execute("DELETE FROM payloads WHERE rule_id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    fn payload(&self, id: i64) -> PersistenceResult<Option<TransactionProfile>> {
        let conn = self.connection.lock().expect("sqlite mutex poisoned");
        let mut stmt = conn.prepare("SELECT payload_json FROM payloads WHERE rule_id = ?1")?;
        let json_opt: Option<String> = stmt.query_row(params![id], |row| row.get(0)).optional()?;

        let Some(json) = json_opt else {
            return Ok(None);
        };

        let payload: TransactionProfile = serde_json::from_str(&json)?;
        Ok(Some(payload))
    }

    fn load_ledger(&self) -> PersistenceResult<Ledger> {
        let conn = self.connection.lock().expect("sqlite mutex poisoned");

        let mut stmt = conn.prepare("SELECT id, rule_json FROM rules ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, json) = row?;
            let rule: RecurrenceRule = serde_json::from_str(&json)?;
            entries.push(LedgerEntry {
                id,
                rule,
                payload: None,
            });
        }

        let mut stmt = conn.prepare("SELECT rule_id, payload_json FROM payloads")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut payloads = HashMap::new();
        for row in rows {
            let (rule_id, json) = row?;
            let payload: TransactionProfile = serde_json::from_str(&json)?;
            payloads.insert(rule_id, payload);
        }

        for entry in &mut entries {
            entry.payload = payloads.remove(&entry.id);
        }

        super::validate_entries(&entries)?;
        Ok(Ledger::from_entries(entries))
    }

    fn replace_ledger(&self, ledger: &Ledger) -> PersistenceResult<()> {
        super::validate_entries(ledger.entries())?;
        let mut conn = self.connection.lock().expect("sqlite mutex poisoned");
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM payloads", [])?;
        tx.execute("DELETE FROM rules", [])?;
        Self::insert_entries(&tx, ledger)?;
        tx.commit()?;
        Ok(())
    }
}
