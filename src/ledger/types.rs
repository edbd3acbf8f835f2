use chrono::{DateTime, Duration, Utc};

use crate::error::{IncompleteSubmissionError, SubmitError, ValidationError};
use crate::scoring::Rubric;

/// One rater's complete score sheet.
///
/// `scores[s][c]` is the score for the rubric's sample `s` and category `c`.
/// Records are immutable once built; the store only ever appends them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRecord {
    rater: String,
    created_at: DateTime<Utc>,
    scores: Vec<Vec<u32>>,
}

impl ScoreRecord {
    pub fn new(rater: impl Into<String>, created_at: DateTime<Utc>, scores: Vec<Vec<u32>>) -> Self {
        Self {
            rater: rater.into(),
            created_at,
            scores,
        }
    }

    pub fn rater(&self) -> &str {
        &self.rater
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn scores(&self) -> &[Vec<u32>] {
        &self.scores
    }

    /// Score for a (sample, category) position, if the record has one.
    pub fn score(&self, sample: usize, category: usize) -> Option<u32> {
        self.scores.get(sample).and_then(|row| row.get(category)).copied()
    }

    /// Reconciliation identity: records sharing a key are the same submission.
    pub fn key(&self) -> RecordKey {
        RecordKey {
            rater: self.rater.clone(),
            created_at: self.created_at,
        }
    }

    /// Sum of one sample's scores, scaled by the rubric multiplier.
    pub fn sample_total(&self, rubric: &Rubric, sample: usize) -> f64 {
        let raw: u64 = self
            .scores
            .get(sample)
            .map(|row| row.iter().map(|&v| u64::from(v)).sum())
            .unwrap_or(0);
        raw as f64 * rubric.multiplier()
    }

    /// Check that the record names a rater, covers every pair of the rubric
    /// and keeps every score inside its category's range.
    pub fn validate(&self, rubric: &Rubric) -> Result<(), SubmitError> {
        if self.rater.trim().is_empty() {
            return Err(ValidationError::EmptyRater.into());
        }

        let missing: Vec<(String, String)> = rubric
            .pairs()
            .filter(|&(s, c)| self.score(s, c).is_none())
            .map(|(s, c)| (rubric.samples()[s].clone(), rubric.categories()[c].id.clone()))
            .collect();
        let oversized = self.scores.len() > rubric.samples().len()
            || self
                .scores
                .iter()
                .any(|row| row.len() > rubric.categories().len());
        if !missing.is_empty() || oversized {
            return Err(IncompleteSubmissionError { missing }.into());
        }

        for (s, c) in rubric.pairs() {
            let category = &rubric.categories()[c];
            if let Some(value) = self.score(s, c) {
                category.check(i64::from(value))?;
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pub rater: String,
    pub created_at: DateTime<Utc>,
}

/// Hands out submission timestamps that strictly increase within a process,
/// even when the wall clock stalls or steps backwards.
#[derive(Debug, Default)]
pub struct SubmissionClock {
    last: Option<DateTime<Utc>>,
}

impl SubmissionClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let next = match self.last {
            Some(last) if now <= last => last + Duration::nanoseconds(1),
            _ => now,
        };
        self.last = Some(next);
        next
    }
}
