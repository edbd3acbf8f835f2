use std::sync::Arc;

use crate::error::{PersistenceError, SubmitError};
use crate::ledger::{ScoreRecord, SubmissionClock, SubmissionStore};
use crate::scoring::{aggregate, rank, Aggregate, DraftTracker, RankedSample, Rubric};

/// Aggregate and ranking computed from one snapshot.
#[derive(Debug, Clone)]
pub struct Results {
    pub aggregate: Aggregate,
    pub ranking: Vec<RankedSample>,
    /// True when the durable ledger could not be read and the results only
    /// reflect this process's in-memory records
    pub stale: bool,
}

/// Application state owned by the caller and passed explicitly to every
/// operation: the rubric for the run, the submission store and the clock
/// that stamps new records.
pub struct App {
    rubric: Arc<Rubric>,
    store: SubmissionStore,
    clock: SubmissionClock,
}

impl App {
    pub fn new(rubric: Arc<Rubric>, store: SubmissionStore) -> Self {
        Self {
            rubric,
            store,
            clock: SubmissionClock::new(),
        }
    }

    pub fn rubric(&self) -> &Arc<Rubric> {
        &self.rubric
    }

    pub fn store(&self) -> &SubmissionStore {
        &self.store
    }

    /// Fresh, empty draft for a rater.
    pub fn start_draft(&self) -> DraftTracker {
        DraftTracker::new(Arc::clone(&self.rubric))
    }

    /// Turn a complete draft into a record and append it.
    ///
    /// The draft is reset once the record is held by the store, which
    /// includes the case where only the durable write failed.
    pub fn submit(
        &mut self,
        rater: &str,
        draft: &mut DraftTracker,
    ) -> Result<ScoreRecord, SubmitError> {
        let record = draft.to_record(rater, self.clock.tick())?;
        let result = self.store.append(record.clone());

        match result {
            Ok(()) => {
                draft.reset();
                Ok(record)
            }
            Err(SubmitError::Persistence(e)) => {
                draft.reset();
                Err(SubmitError::Persistence(e))
            }
            Err(e) => Err(e),
        }
    }

    /// Append an already-built record, e.g. from an import.
    /// Returns false if a record with the same key is already stored.
    pub fn add_record(&mut self, record: ScoreRecord) -> Result<bool, SubmitError> {
        let existing = self.snapshot_or_memory().0;
        if existing.iter().any(|r| r.key() == record.key()) {
            return Ok(false);
        }
        self.store.append(record)?;
        Ok(true)
    }

    /// Reconciled snapshot, falling back to memory when the ledger is
    /// unreadable. The flag is true in the fallback case.
    pub fn snapshot_or_memory(&self) -> (Vec<ScoreRecord>, bool) {
        match self.store.reconciled_snapshot() {
            Ok(records) => (records, false),
            Err(e) => {
                tracing::warn!(error = %e, "ledger unreadable, using in-memory submissions");
                (self.store.snapshot(), true)
            }
        }
    }

    /// Aggregate and rank the current submissions.
    pub fn results(&self) -> Results {
        let (records, stale) = self.snapshot_or_memory();
        let aggregate = aggregate(&self.rubric, &records);
        let ranking = rank(&aggregate);
        Results {
            aggregate,
            ranking,
            stale,
        }
    }

    pub fn sync(&mut self) -> Result<usize, PersistenceError> {
        self.store.sync()
    }

    /// Administrative purge. The caller must have confirmed with the operator.
    pub fn clear_all(&mut self) -> Result<(), PersistenceError> {
        self.store.clear()
    }
}
