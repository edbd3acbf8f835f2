use std::io::IsTerminal;

use owo_colors::OwoColorize;

use crate::ledger::ScoreRecord;
use crate::scoring::{Aggregate, Medal, RankedSample, Rubric};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a score or total with one decimal place
pub fn format_score(score: f64) -> String {
    format!("{:.1}", score)
}

/// "Based on 3 submissions"
pub fn format_submission_count(count: usize) -> String {
    let noun = if count == 1 { "submission" } else { "submissions" };
    format!("Based on {} {}", count, noun)
}

/// "2 people have submitted scores"
pub fn format_participation(count: usize) -> String {
    let who = if count == 1 { "person has" } else { "people have" };
    format!("{} {} submitted scores", count, who)
}

/// "Completed: 2/5 sets"
pub fn format_progress(done: usize, total: usize) -> String {
    format!("Completed: {}/{} sets", done, total)
}

/// Sample label with a check mark once every category is scored
pub fn format_sample_choice(index: usize, label: &str, complete: bool) -> String {
    let mark = if complete { " ✓" } else { "" };
    format!("{:>2}. {}{}", index + 1, label, mark)
}

fn medal_color(medal: Medal, text: &str) -> String {
    match medal {
        Medal::Gold => text.yellow().bold().to_string(),
        Medal::Silver => text.white().bold().to_string(),
        Medal::Bronze => text.red().to_string(),
    }
}

/// Format the overall ranking, one line per sample.
/// Podium places get a medal, the rest a right-aligned rank number.
pub fn format_rankings(ranked: &[RankedSample], max_total: f64, use_colors: bool) -> String {
    if ranked.is_empty() {
        return "No samples configured.".to_string();
    }

    let label_width = ranked
        .iter()
        .map(|r| r.sample.chars().count())
        .max()
        .unwrap_or(0);
    let max_str = format!("{:.0}", max_total);

    ranked
        .iter()
        .map(|r| {
            let marker = match r.medal {
                Some(medal) => medal.emoji().to_string(),
                None => format!("{:>2}.", r.rank),
            };
            let label = format!("{:<width$}", r.sample, width = label_width);
            let score = format!("{:>6}/{}", format_score(r.total), max_str);

            match (use_colors, r.medal) {
                (true, Some(medal)) => {
                    format!("{} {}  {}", marker, medal_color(medal, &label), score.bold())
                }
                (true, None) => format!("{} {}  {}", marker.dimmed(), label, score),
                (false, _) => format!("{} {}  {}", marker, label, score),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn column_widths(rubric: &Rubric) -> Vec<usize> {
    rubric
        .categories()
        .iter()
        .map(|c| c.name.chars().count().max(5))
        .collect()
}

fn sample_width(rubric: &Rubric) -> usize {
    rubric
        .samples()
        .iter()
        .map(|s| s.chars().count())
        .chain(std::iter::once("Sample".len()))
        .max()
        .unwrap_or(0)
}

fn header_row(rubric: &Rubric, widths: &[usize], label_width: usize, trailer: Option<&str>) -> String {
    let mut cells = vec![format!("{:<width$}", "Sample", width = label_width)];
    cells.extend(
        rubric
            .categories()
            .iter()
            .zip(widths)
            .map(|(c, w)| format!("{:>width$}", c.name, width = *w)),
    );
    if let Some(trailer) = trailer {
        cells.push(format!("{:>7}", trailer));
    }
    cells.join("  ")
}

/// Category breakdown: samples as rows, category means as columns.
/// Pairs nobody has scored yet show "-" rather than 0.0.
pub fn format_breakdown(rubric: &Rubric, aggregate: &Aggregate, use_colors: bool) -> String {
    let widths = column_widths(rubric);
    let label_width = sample_width(rubric);

    let header = header_row(rubric, &widths, label_width, Some("Total"));
    let mut lines = vec![if use_colors {
        header.bold().to_string()
    } else {
        header
    }];

    for sample in &aggregate.samples {
        let mut cells = vec![format!("{:<width$}", sample.sample, width = label_width)];
        cells.extend(sample.categories.iter().zip(&widths).map(|(mean, w)| {
            let text = if mean.has_data() {
                format_score(mean.mean)
            } else {
                "-".to_string()
            };
            format!("{:>width$}", text, width = *w)
        }));
        cells.push(format!("{:>7}", format_score(sample.total)));
        lines.push(cells.join("  "));
    }

    lines.join("\n")
}

/// Every rater's individual sheet, newest last.
pub fn format_submissions(rubric: &Rubric, records: &[ScoreRecord], use_colors: bool) -> String {
    if records.is_empty() {
        return "No submissions yet.".to_string();
    }

    let widths = column_widths(rubric);
    let label_width = sample_width(rubric);

    records
        .iter()
        .map(|record| {
            let date = record.created_at().format("%Y-%m-%d").to_string();
            let title = if use_colors {
                format!("{} - {}", record.rater().bold(), date.dimmed())
            } else {
                format!("{} - {}", record.rater(), date)
            };

            let mut lines = vec![title, header_row(rubric, &widths, label_width, None)];
            for (s, sample) in rubric.samples().iter().enumerate() {
                let mut cells = vec![format!("{:<width$}", sample, width = label_width)];
                cells.extend(widths.iter().enumerate().map(|(c, w)| {
                    let text = record
                        .score(s, c)
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    format!("{:>width$}", text, width = *w)
                }));
                lines.push(cells.join("  "));
            }
            lines.join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Format rankings as tab-separated values for scripting
/// Columns: rank, sample, total, one mean per category (no headers, no colors)
pub fn format_tsv(ranked: &[RankedSample], aggregate: &Aggregate) -> String {
    ranked
        .iter()
        .map(|r| {
            let mut fields = vec![r.rank.to_string(), r.sample.clone(), format_score(r.total)];
            if let Some(sample) = aggregate.samples.iter().find(|s| s.sample == r.sample) {
                fields.extend(sample.categories.iter().map(|m| format!("{:.2}", m.mean)));
            }
            fields.join("\t")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
