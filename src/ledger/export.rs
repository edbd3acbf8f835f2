use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{RecordKey, ScoreRecord};
use crate::config::ensure_parent_dir;
use crate::scoring::Rubric;

const EXPORT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct ExportFile {
    version: u32,
    #[serde(default)]
    records: Vec<ExportedRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ExportedRecord {
    rater: String,
    timestamp: DateTime<Utc>,
    scores: Vec<ExportedSample>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ExportedSample {
    sample: String,
    /// category id -> score
    scores: BTreeMap<String, u32>,
}

/// Serialize records as pretty JSON, one object per record with nested
/// per-sample category scores.
pub fn export_json(rubric: &Rubric, records: &[ScoreRecord]) -> Result<String> {
    let file = ExportFile {
        version: EXPORT_VERSION,
        records: records.iter().map(|r| export_record(rubric, r)).collect(),
    };
    serde_json::to_string_pretty(&file).context("Failed to serialize export")
}

fn export_record(rubric: &Rubric, record: &ScoreRecord) -> ExportedRecord {
    let scores = rubric
        .samples()
        .iter()
        .enumerate()
        .map(|(s, sample)| ExportedSample {
            sample: sample.clone(),
            scores: rubric
                .categories()
                .iter()
                .enumerate()
                .filter_map(|(c, category)| record.score(s, c).map(|v| (category.id.clone(), v)))
                .collect(),
        })
        .collect();

    ExportedRecord {
        rater: record.rater().to_string(),
        timestamp: record.created_at(),
        scores,
    }
}

/// Parse an export back into records, checking each against the rubric.
pub fn import_json(rubric: &Rubric, json: &str) -> Result<Vec<ScoreRecord>> {
    let file: ExportFile = serde_json::from_str(json).context("Failed to parse export JSON")?;

    if file.version != EXPORT_VERSION {
        anyhow::bail!("Unsupported export version: {}", file.version);
    }

    file.records
        .into_iter()
        .enumerate()
        .map(|(i, exported)| {
            import_record(rubric, exported).with_context(|| format!("Invalid record #{}", i + 1))
        })
        .collect()
}

fn import_record(rubric: &Rubric, exported: ExportedRecord) -> Result<ScoreRecord> {
    let mut grid: Vec<Option<Vec<u32>>> = vec![None; rubric.samples().len()];

    for sample in exported.scores {
        let s = rubric.sample_index(&sample.sample)?;
        if grid[s].is_some() {
            anyhow::bail!("sample '{}' appears twice", sample.sample);
        }

        let mut row = vec![None; rubric.categories().len()];
        for (category, value) in sample.scores {
            row[rubric.category_index(&category)?] = Some(value);
        }
        if row.iter().any(Option::is_none) {
            anyhow::bail!("sample '{}' is missing category scores", sample.sample);
        }
        grid[s] = Some(row.into_iter().flatten().collect());
    }

    if let Some(s) = grid.iter().position(Option::is_none) {
        anyhow::bail!("sample '{}' has no scores", rubric.samples()[s]);
    }

    let record = ScoreRecord::new(
        exported.rater,
        exported.timestamp,
        grid.into_iter().flatten().collect(),
    );
    record.validate(rubric)?;
    Ok(record)
}

/// Write an export file atomically.
pub fn write_export(path: &Path, rubric: &Rubric, records: &[ScoreRecord]) -> Result<()> {
    ensure_parent_dir(path)
        .with_context(|| format!("Failed to create directory for {}", path.display()))?;
    let json = export_json(rubric, records)?;

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    std::io::Write::write_all(&mut file, json.as_bytes()).context("Failed to write export")?;
    file.commit().context("Failed to save export")?;

    Ok(())
}

pub fn read_export(path: &Path, rubric: &Rubric) -> Result<Vec<ScoreRecord>> {
    let mut json = String::new();
    File::open(path)
        .with_context(|| format!("Failed to open export file at {}", path.display()))?
        .read_to_string(&mut json)
        .with_context(|| format!("Failed to read export file at {}", path.display()))?;

    import_json(rubric, &json)
}

/// Add `records` to the export at `path`, keeping whatever it already holds.
///
/// Records already present (by rater and timestamp) are not duplicated. An
/// existing file that cannot be read is left alone and reported as an error.
/// Returns the number of records in the file afterwards.
pub fn merge_into_export(path: &Path, rubric: &Rubric, records: &[ScoreRecord]) -> Result<usize> {
    let mut merged = if path.exists() {
        read_export(path, rubric)
            .with_context(|| format!("Refusing to overwrite unreadable {}", path.display()))?
    } else {
        Vec::new()
    };

    let mut seen: HashSet<RecordKey> = merged.iter().map(ScoreRecord::key).collect();
    merged.extend(records.iter().filter(|r| seen.insert(r.key())).cloned());

    write_export(path, rubric, &merged)?;
    Ok(merged.len())
}
