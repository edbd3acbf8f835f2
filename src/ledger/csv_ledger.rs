use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use atomic_write_file::AtomicWriteFile;
use chrono::{DateTime, SecondsFormat, Utc};

use super::types::{RecordKey, ScoreRecord};
use super::Ledger;
use crate::config::ensure_parent_dir;
use crate::error::PersistenceError;
use crate::scoring::Rubric;

/// Tabular ledger stored as CSV, one row per (record, sample):
///
/// `Timestamp, Rater, Sample, <category names...>, Total`
///
/// Each append writes all of a record's rows with a single `write_all` on a
/// file opened in append mode.
#[derive(Debug, Clone)]
pub struct CsvLedger {
    path: PathBuf,
    rubric: Arc<Rubric>,
}

impl CsvLedger {
    pub fn new(path: impl Into<PathBuf>, rubric: Arc<Rubric>) -> Self {
        Self {
            path: path.into(),
            rubric,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Header row: fixed columns plus one column per category display name.
    pub fn header(&self) -> Vec<String> {
        let mut header = vec![
            "Timestamp".to_string(),
            "Rater".to_string(),
            "Sample".to_string(),
        ];
        header.extend(self.rubric.categories().iter().map(|c| c.name.clone()));
        header.push("Total".to_string());
        header
    }

    fn io_error(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// True when the file is absent or empty. Any other metadata failure
    /// is reported rather than read as "no ledger yet".
    fn needs_header(&self) -> Result<bool, PersistenceError> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len() == 0),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(true),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn encode(&self, record: &ScoreRecord, with_header: bool) -> Result<Vec<u8>, PersistenceError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());

        if with_header {
            writer.write_record(self.header())?;
        }

        let timestamp = record
            .created_at()
            .to_rfc3339_opts(SecondsFormat::Nanos, true);
        for (s, sample) in self.rubric.samples().iter().enumerate() {
            let mut row = vec![timestamp.clone(), record.rater().to_string(), sample.clone()];
            row.extend(
                (0..self.rubric.categories().len())
                    .map(|c| record.score(s, c).map(|v| v.to_string()).unwrap_or_default()),
            );
            row.push(record.sample_total(&self.rubric, s).to_string());
            writer.write_record(&row)?;
        }

        writer
            .into_inner()
            .map_err(|e| self.io_error(e.into_error()))
    }

    fn parse_row(
        &self,
        row: &csv::StringRecord,
        line: u64,
    ) -> Result<(RecordKey, usize, Vec<u32>), PersistenceError> {
        let malformed = |reason: String| PersistenceError::Malformed { line, reason };

        let expected = self.rubric.categories().len() + 4;
        if row.len() != expected {
            return Err(malformed(format!(
                "expected {} columns, found {}",
                expected,
                row.len()
            )));
        }

        let created_at = DateTime::parse_from_rfc3339(&row[0])
            .map(|d| d.with_timezone(&Utc))
            .map_err(|e| malformed(format!("bad timestamp '{}': {}", &row[0], e)))?;
        let rater = row[1].to_string();
        let sample = self
            .rubric
            .sample_index(&row[2])
            .map_err(|e| malformed(e.to_string()))?;

        let scores = (0..self.rubric.categories().len())
            .map(|c| {
                let field = &row[3 + c];
                field
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| malformed(format!("bad score '{}'", field)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok((RecordKey { rater, created_at }, sample, scores))
    }
}

struct PendingRecord {
    key: RecordKey,
    first_line: u64,
    rows: Vec<Option<Vec<u32>>>,
}

impl Ledger for CsvLedger {
    fn append(&mut self, record: &ScoreRecord) -> Result<(), PersistenceError> {
        ensure_parent_dir(&self.path).map_err(|e| self.io_error(e))?;
        let bytes = self.encode(record, self.needs_header()?)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        file.write_all(&bytes).map_err(|e| self.io_error(e))?;
        file.sync_data().map_err(|e| self.io_error(e))?;

        tracing::debug!(
            rater = record.rater(),
            path = %self.path.display(),
            "appended record to CSV ledger"
        );
        Ok(())
    }

    fn fetch_all(&self) -> Result<Vec<ScoreRecord>, PersistenceError> {
        if self.needs_header()? {
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)?;

        let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if header != self.header() {
            return Err(PersistenceError::Malformed {
                line: 1,
                reason: format!(
                    "header {:?} does not match configured columns {:?}",
                    header,
                    self.header()
                ),
            });
        }

        let sample_count = self.rubric.samples().len();
        let mut pending: Vec<PendingRecord> = Vec::new();
        let mut index: HashMap<RecordKey, usize> = HashMap::new();

        for row in reader.records() {
            let row = row?;
            let line = row.position().map(|p| p.line()).unwrap_or(0);
            let (key, sample, scores) = self.parse_row(&row, line)?;

            let slot = *index.entry(key.clone()).or_insert_with(|| {
                pending.push(PendingRecord {
                    key,
                    first_line: line,
                    rows: vec![None; sample_count],
                });
                pending.len() - 1
            });

            // A re-appended record repeats its rows; identical repeats collapse
            let target = &mut pending[slot].rows[sample];
            if let Some(existing) = target {
                if *existing != scores {
                    return Err(PersistenceError::Malformed {
                        line,
                        reason: format!("conflicting rows for sample '{}'", &row[2]),
                    });
                }
                tracing::debug!(line, "skipping repeated ledger row");
            } else {
                *target = Some(scores);
            }
        }

        let mut records = Vec::with_capacity(pending.len());
        for record in pending {
            let covered = record.rows.iter().filter(|r| r.is_some()).count();
            if covered != sample_count {
                return Err(PersistenceError::Malformed {
                    line: record.first_line,
                    reason: format!(
                        "submission by '{}' covers {} of {} samples",
                        record.key.rater, covered, sample_count
                    ),
                });
            }

            let scores = record.rows.into_iter().flatten().collect();
            let built = ScoreRecord::new(record.key.rater, record.key.created_at, scores);
            built
                .validate(&self.rubric)
                .map_err(|e| PersistenceError::Malformed {
                    line: record.first_line,
                    reason: e.to_string(),
                })?;
            records.push(built);
        }

        Ok(records)
    }

    fn clear(&mut self) -> Result<(), PersistenceError> {
        ensure_parent_dir(&self.path).map_err(|e| self.io_error(e))?;

        let mut file = AtomicWriteFile::open(&self.path).map_err(|e| self.io_error(e))?;
        {
            let mut writer = csv::Writer::from_writer(&mut file);
            writer.write_record(self.header())?;
            writer.flush().map_err(|e| self.io_error(e))?;
        }
        file.commit().map_err(|e| self.io_error(e))?;

        tracing::debug!(path = %self.path.display(), "cleared CSV ledger");
        Ok(())
    }
}
