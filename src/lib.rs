pub mod calculations;
pub mod ledger;
pub mod persistence;
pub mod rule;
pub mod transaction;

pub use calculations::{
    DEFAULT_WEEK_LIMIT, LoadEstimator, MAX_SAMPLE_SPAN_DAYS, WeekSampler, WeeklyLoadReport,
    months_between, week_range, week_start,
};
pub use ledger::{Ledger, LedgerEntry};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteLedgerStore;
pub use persistence::{
    LedgerStore, PersistenceError, PersistenceResult, load_ledger_from_csv, load_ledger_from_json,
    save_ledger_to_csv, save_ledger_to_json, save_report_to_csv, validate_entries,
};
pub use rule::{Cadence, RecurrenceError, RecurrenceRule, RuleSpec, filter_active};
pub use transaction::{TransactionError, TransactionKind, TransactionProfile};
