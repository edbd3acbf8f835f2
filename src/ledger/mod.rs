pub mod csv_ledger;
pub mod export;
pub mod store;
pub mod types;

pub use csv_ledger::CsvLedger;
pub use export::{export_json, import_json, merge_into_export, read_export, write_export};
pub use store::SubmissionStore;
pub use types::{RecordKey, ScoreRecord, SubmissionClock};

use crate::error::PersistenceError;

/// Durable side of the submission store.
///
/// Implementations must make `append` atomic per record: a concurrent or
/// interrupted write never leaves half a record visible to `fetch_all`.
pub trait Ledger {
    fn append(&mut self, record: &ScoreRecord) -> Result<(), PersistenceError>;
    fn fetch_all(&self) -> Result<Vec<ScoreRecord>, PersistenceError>;
    fn clear(&mut self) -> Result<(), PersistenceError>;
}

/// Ledger kept entirely in memory, for tests and throwaway panels.
#[derive(Debug, Default, Clone)]
pub struct MemoryLedger {
    records: Vec<ScoreRecord>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Ledger for MemoryLedger {
    fn append(&mut self, record: &ScoreRecord) -> Result<(), PersistenceError> {
        self.records.push(record.clone());
        Ok(())
    }

    fn fetch_all(&self) -> Result<Vec<ScoreRecord>, PersistenceError> {
        Ok(self.records.clone())
    }

    fn clear(&mut self) -> Result<(), PersistenceError> {
        self.records.clear();
        Ok(())
    }
}
