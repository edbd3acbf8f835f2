use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::rubric::Rubric;
use crate::error::{IncompleteSubmissionError, SubmitError, ValidationError};
use crate::ledger::ScoreRecord;

/// A rater's in-progress score sheet. Nothing here reaches the store until
/// the sheet is complete and turned into a [`ScoreRecord`].
#[derive(Debug, Clone)]
pub struct DraftTracker {
    rubric: Arc<Rubric>,
    cells: Vec<Vec<Option<u32>>>,
}

impl DraftTracker {
    pub fn new(rubric: Arc<Rubric>) -> Self {
        let cells = empty_cells(&rubric);
        Self { rubric, cells }
    }

    pub fn rubric(&self) -> &Rubric {
        &self.rubric
    }

    /// Record `value` for a (sample, category) pair, replacing any earlier
    /// value. On error the draft is left untouched.
    pub fn set_score(
        &mut self,
        sample: &str,
        category: &str,
        value: i64,
    ) -> Result<(), ValidationError> {
        let s = self.rubric.sample_index(sample)?;
        let c = self.rubric.category_index(category)?;
        let checked = self.rubric.categories()[c].check(value)?;
        self.cells[s][c] = Some(checked);
        Ok(())
    }

    pub fn score(&self, sample: &str, category: &str) -> Option<u32> {
        let s = self.rubric.sample_index(sample).ok()?;
        let c = self.rubric.category_index(category).ok()?;
        self.cells[s][c]
    }

    pub fn is_sample_complete(&self, sample: usize) -> bool {
        self.cells
            .get(sample)
            .is_some_and(|row| row.iter().all(Option::is_some))
    }

    pub fn is_complete(&self) -> bool {
        (0..self.cells.len()).all(|s| self.is_sample_complete(s))
    }

    /// Number of samples with every category scored.
    pub fn progress(&self) -> usize {
        (0..self.cells.len())
            .filter(|&s| self.is_sample_complete(s))
            .count()
    }

    /// Unscored (sample, category id) pairs in configured order.
    pub fn missing(&self) -> Vec<(String, String)> {
        self.rubric
            .pairs()
            .filter(|&(s, c)| self.cells[s][c].is_none())
            .map(|(s, c)| {
                (
                    self.rubric.samples()[s].clone(),
                    self.rubric.categories()[c].id.clone(),
                )
            })
            .collect()
    }

    pub fn reset(&mut self) {
        self.cells = empty_cells(&self.rubric);
    }

    /// Freeze the draft into an immutable record. The draft itself is kept,
    /// callers reset it once the record is stored.
    pub fn to_record(
        &self,
        rater: &str,
        created_at: DateTime<Utc>,
    ) -> Result<ScoreRecord, SubmitError> {
        let rater = rater.trim();
        if rater.is_empty() {
            return Err(ValidationError::EmptyRater.into());
        }

        let missing = self.missing();
        if !missing.is_empty() {
            return Err(IncompleteSubmissionError { missing }.into());
        }

        let scores = self
            .cells
            .iter()
            .map(|row| row.iter().flatten().copied().collect())
            .collect();
        Ok(ScoreRecord::new(rater, created_at, scores))
    }
}

fn empty_cells(rubric: &Rubric) -> Vec<Vec<Option<u32>>> {
    vec![vec![None; rubric.categories().len()]; rubric.samples().len()]
}
