use super::rubric::Rubric;
use crate::ledger::ScoreRecord;

/// Per-category result for one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryMean {
    /// Arithmetic mean, or 0.0 when `count` is zero
    pub mean: f64,
    /// Number of scores that went into the mean
    pub count: usize,
}

impl CategoryMean {
    pub fn has_data(&self) -> bool {
        self.count > 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampleAggregate {
    pub sample: String,
    /// Configured position of the sample, used as the ranking tie-break
    pub position: usize,
    /// One entry per rubric category, in configured order
    pub categories: Vec<CategoryMean>,
    /// Sum of category means times the rubric multiplier
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub samples: Vec<SampleAggregate>,
    pub submissions: usize,
}

/// Average every (sample, category) pair across `records`.
///
/// Records are visited in slice order so the floating-point sums, and
/// therefore the output, are identical for identical input.
pub fn aggregate(rubric: &Rubric, records: &[ScoreRecord]) -> Aggregate {
    let samples = rubric
        .samples()
        .iter()
        .enumerate()
        .map(|(s, label)| {
            let categories: Vec<CategoryMean> = (0..rubric.categories().len())
                .map(|c| category_mean(records, s, c))
                .collect();
            let total = categories.iter().map(|m| m.mean).sum::<f64>() * rubric.multiplier();

            SampleAggregate {
                sample: label.clone(),
                position: s,
                categories,
                total,
            }
        })
        .collect();

    Aggregate {
        samples,
        submissions: records.len(),
    }
}

fn category_mean(records: &[ScoreRecord], sample: usize, category: usize) -> CategoryMean {
    let (sum, count) = records
        .iter()
        .filter_map(|r| r.score(sample, category))
        .fold((0u64, 0usize), |(sum, count), v| (sum + u64::from(v), count + 1));

    let mean = if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    };
    CategoryMean { mean, count }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CategoryConfig, Config};
    use chrono::Utc;

    fn rubric(multiplier: Option<f64>) -> Rubric {
        let config = Config {
            categories: vec![CategoryConfig::new("a", "A"), CategoryConfig::new("b", "B")],
            samples: vec!["S1".to_string(), "S2".to_string()],
            multiplier,
            ..Config::default()
        };
        Rubric::from_config(&config).unwrap()
    }

    fn record(rater: &str, scores: Vec<Vec<u32>>) -> ScoreRecord {
        ScoreRecord::new(rater, Utc::now(), scores)
    }

    #[test]
    fn test_empty_snapshot_is_all_zero() {
        let result = aggregate(&rubric(None), &[]);

        assert_eq!(result.submissions, 0);
        assert_eq!(result.samples.len(), 2);
        for sample in &result.samples {
            assert_eq!(sample.total, 0.0);
            for category in &sample.categories {
                assert_eq!(category.mean, 0.0);
                assert!(!category.has_data());
            }
        }
    }

    #[test]
    fn test_two_rater_scenario() {
        let records = vec![
            record("X", vec![vec![8, 6], vec![4, 4]]),
            record("Y", vec![vec![6, 4], vec![8, 8]]),
        ];
        let result = aggregate(&rubric(None), &records);

        let s1 = &result.samples[0];
        assert_eq!(s1.sample, "S1");
        assert_eq!(s1.categories[0].mean, 7.0);
        assert_eq!(s1.categories[1].mean, 5.0);
        assert_eq!(s1.total, 12.0);

        let s2 = &result.samples[1];
        assert_eq!(s2.categories[0].mean, 6.0);
        assert_eq!(s2.categories[1].mean, 6.0);
        assert_eq!(s2.total, 12.0);
        assert_eq!(s2.categories[0].count, 2);
    }

    #[test]
    fn test_multiplier_scales_each_mean() {
        let records = vec![record("X", vec![vec![3, 0], vec![0, 0]])];
        let result = aggregate(&rubric(Some(5.0)), &records);

        // mean 3 in category a contributes 15, not 3
        assert_eq!(result.samples[0].categories[0].mean, 3.0);
        assert_eq!(result.samples[0].total, 15.0);
    }

    #[test]
    fn test_genuine_zero_is_distinguishable_from_no_data() {
        let records = vec![record("X", vec![vec![0, 0], vec![0, 0]])];
        let result = aggregate(&rubric(None), &records);

        let category = &result.samples[0].categories[0];
        assert_eq!(category.mean, 0.0);
        assert!(category.has_data());
    }

    #[test]
    fn test_short_records_only_count_present_pairs() {
        // Aggregation accepts any sequence; rows a record lacks are skipped.
        let records = vec![
            record("X", vec![vec![9]]),
            record("Y", vec![vec![5, 2], vec![1, 1]]),
        ];
        let result = aggregate(&rubric(None), &records);

        assert_eq!(result.samples[0].categories[0].mean, 7.0);
        assert_eq!(result.samples[0].categories[1].count, 1);
        assert_eq!(result.samples[1].categories[0].count, 1);
    }

    #[test]
    fn test_fractional_means() {
        let records = vec![
            record("X", vec![vec![1, 0], vec![0, 0]]),
            record("Y", vec![vec![2, 0], vec![0, 0]]),
            record("Z", vec![vec![2, 0], vec![0, 0]]),
        ];
        let result = aggregate(&rubric(None), &records);
        assert!((result.samples[0].categories[0].mean - 5.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_deterministic() {
        let records = vec![
            record("X", vec![vec![7, 3], vec![1, 9]]),
            record("Y", vec![vec![2, 8], vec![10, 4]]),
            record("Z", vec![vec![5, 5], vec![3, 3]]),
        ];
        let rubric = rubric(Some(1.3));

        let first = aggregate(&rubric, &records);
        let second = aggregate(&rubric, &records);
        assert_eq!(first, second);
        for (a, b) in first.samples.iter().zip(&second.samples) {
            assert_eq!(a.total.to_bits(), b.total.to_bits());
        }
    }
}
