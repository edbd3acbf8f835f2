use std::collections::HashSet;
use std::sync::Arc;

use super::types::{RecordKey, ScoreRecord};
use super::Ledger;
use crate::error::{PersistenceError, SubmitError};
use crate::scoring::Rubric;

/// Append-only log of complete score records.
///
/// The in-memory log is authoritative for this process. When a durable
/// ledger is attached every append is forwarded to it; a failed forward
/// keeps the record in memory and marks the store unsynced until `sync`
/// succeeds.
pub struct SubmissionStore {
    rubric: Arc<Rubric>,
    records: Vec<ScoreRecord>,
    ledger: Option<Box<dyn Ledger>>,
    unsynced: bool,
}

impl SubmissionStore {
    /// Store without durable backing; records live as long as the process.
    pub fn in_memory(rubric: Arc<Rubric>) -> Self {
        Self {
            rubric,
            records: Vec::new(),
            ledger: None,
            unsynced: false,
        }
    }

    pub fn with_ledger(rubric: Arc<Rubric>, ledger: Box<dyn Ledger>) -> Self {
        Self {
            rubric,
            records: Vec::new(),
            ledger: Some(ledger),
            unsynced: false,
        }
    }

    /// Seed the in-memory log with what the ledger already holds.
    /// Returns the number of records loaded.
    pub fn load(&mut self) -> Result<usize, PersistenceError> {
        let Some(ledger) = self.ledger.as_ref() else {
            return Ok(0);
        };

        let fetched = ledger.fetch_all()?;
        let known: HashSet<RecordKey> = self.records.iter().map(ScoreRecord::key).collect();
        let mut loaded = 0;
        let mut merged = Vec::with_capacity(fetched.len() + self.records.len());
        for record in fetched {
            if !known.contains(&record.key()) {
                loaded += 1;
            }
            merged.push(record);
        }
        merged.extend(union_tail(&merged, &self.records));
        self.records = merged;

        tracing::debug!(loaded, total = self.records.len(), "loaded ledger");
        Ok(loaded)
    }

    /// Add a complete record.
    ///
    /// Incomplete or out-of-range records are rejected and leave the store
    /// unchanged. A record whose key is already held is a no-op. A ledger
    /// failure is reported after the record has been kept in memory.
    pub fn append(&mut self, record: ScoreRecord) -> Result<(), SubmitError> {
        record.validate(&self.rubric)?;

        let key = record.key();
        if self.records.iter().any(|r| r.key() == key) {
            tracing::debug!(rater = %key.rater, "record already held, skipping append");
            return Ok(());
        }

        let durable = self.ledger.as_mut().map(|ledger| ledger.append(&record));
        let rater = record.rater().to_string();
        self.records.push(record);

        if let Some(Err(e)) = durable {
            tracing::warn!(rater = %rater, error = %e, "ledger append failed, record kept in memory");
            self.unsynced = true;
            return Err(e.into());
        }

        tracing::debug!(rater = %rater, count = self.records.len(), "appended submission");
        Ok(())
    }

    /// In-memory records in insertion order.
    pub fn snapshot(&self) -> Vec<ScoreRecord> {
        self.records.clone()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_unsynced(&self) -> bool {
        self.unsynced
    }

    /// Union of the durable ledger and the in-memory log.
    ///
    /// Records are keyed by (rater, timestamp); equal keys collapse to one.
    /// Ledger records come first in ledger order, then records only held in
    /// memory, in insertion order.
    pub fn reconciled_snapshot(&self) -> Result<Vec<ScoreRecord>, PersistenceError> {
        let Some(ledger) = self.ledger.as_ref() else {
            return Ok(dedup(self.records.clone()));
        };

        let mut merged = dedup(ledger.fetch_all()?);
        let tail = union_tail(&merged, &self.records);
        tracing::debug!(
            durable = merged.len(),
            memory_only = tail.len(),
            "reconciled snapshot"
        );
        merged.extend(tail);
        Ok(merged)
    }

    /// Push every in-memory record the ledger is missing.
    /// Returns how many records were written.
    pub fn sync(&mut self) -> Result<usize, PersistenceError> {
        let Some(ledger) = self.ledger.as_mut() else {
            self.unsynced = false;
            return Ok(0);
        };

        let durable: HashSet<RecordKey> = ledger.fetch_all()?.iter().map(ScoreRecord::key).collect();
        let mut written = 0;
        for record in self.records.iter().filter(|r| !durable.contains(&r.key())) {
            ledger.append(record)?;
            written += 1;
        }

        self.unsynced = false;
        tracing::debug!(written, "synced store with ledger");
        Ok(written)
    }

    /// Purge every record, in memory and in the ledger.
    ///
    /// Destructive and irreversible: callers confirm with the operator first.
    /// A ledger failure leaves the in-memory log untouched.
    pub fn clear(&mut self) -> Result<(), PersistenceError> {
        if let Some(ledger) = self.ledger.as_mut() {
            ledger.clear()?;
        }
        self.records.clear();
        self.unsynced = false;
        tracing::info!("cleared all submissions");
        Ok(())
    }
}

/// Records in `extra` whose key is not already in `base`, deduplicated.
fn union_tail(base: &[ScoreRecord], extra: &[ScoreRecord]) -> Vec<ScoreRecord> {
    let mut seen: HashSet<RecordKey> = base.iter().map(ScoreRecord::key).collect();
    extra
        .iter()
        .filter(|r| seen.insert(r.key()))
        .cloned()
        .collect()
}

fn dedup(records: Vec<ScoreRecord>) -> Vec<ScoreRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.key()))
        .collect()
}
