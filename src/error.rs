use std::path::PathBuf;
use thiserror::Error;

/// A score or label was rejected at entry. The target state is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("score {value} for '{category}' is outside {min}..={max}")]
    OutOfRange {
        category: String,
        value: i64,
        min: u32,
        max: u32,
    },

    #[error("unknown sample '{0}'")]
    UnknownSample(String),

    #[error("unknown category '{0}'")]
    UnknownCategory(String),

    #[error("rater name cannot be empty")]
    EmptyRater,
}

/// A record or draft does not cover every (sample, category) pair.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("submission is missing {} score(s), first: {}", .missing.len(), first_missing(.missing))]
pub struct IncompleteSubmissionError {
    /// (sample label, category id) pairs without a score, in configured order
    pub missing: Vec<(String, String)>,
}

fn first_missing(missing: &[(String, String)]) -> String {
    missing
        .first()
        .map(|(sample, category)| format!("{} / {}", sample, category))
        .unwrap_or_else(|| "sample count mismatch".to_string())
}

/// The durable ledger could not be read or written.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("ledger I/O failed at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ledger CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed ledger at line {line}: {reason}")]
    Malformed { line: u64, reason: String },

    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Everything that can go wrong when a record is handed to the store.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Incomplete(#[from] IncompleteSubmissionError),

    /// The record was kept in memory but the durable ledger did not accept it.
    #[error("score saved locally but not persisted: {0}")]
    Persistence(#[from] PersistenceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_message() {
        let err = ValidationError::OutOfRange {
            category: "flavor".to_string(),
            value: 11,
            min: 0,
            max: 10,
        };
        assert_eq!(err.to_string(), "score 11 for 'flavor' is outside 0..=10");
    }

    #[test]
    fn test_incomplete_message_names_first_gap() {
        let err = IncompleteSubmissionError {
            missing: vec![
                ("Set B".to_string(), "sauce".to_string()),
                ("Set C".to_string(), "smoke".to_string()),
            ],
        };
        assert_eq!(
            err.to_string(),
            "submission is missing 2 score(s), first: Set B / sauce"
        );
    }

    #[test]
    fn test_submit_error_wraps_persistence() {
        let err: SubmitError = PersistenceError::Unavailable("offline".to_string()).into();
        assert!(matches!(err, SubmitError::Persistence(_)));
        assert!(err.to_string().contains("not persisted"));
    }
}
