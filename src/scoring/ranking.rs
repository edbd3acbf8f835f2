use std::cmp::Ordering;

use super::engine::Aggregate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    fn for_rank(rank: usize) -> Option<Self> {
        match rank {
            1 => Some(Medal::Gold),
            2 => Some(Medal::Silver),
            3 => Some(Medal::Bronze),
            _ => None,
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Medal::Gold => "🥇",
            Medal::Silver => "🥈",
            Medal::Bronze => "🥉",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedSample {
    /// 1-based display position
    pub rank: usize,
    pub sample: String,
    pub total: f64,
    pub medal: Option<Medal>,
}

/// Order samples by total, highest first.
///
/// Equal totals fall back to configured sample order.
pub fn rank(aggregate: &Aggregate) -> Vec<RankedSample> {
    let mut ordered: Vec<_> = aggregate.samples.iter().collect();
    ordered.sort_by(|a, b| {
        // Primary: total descending
        let total_cmp = b.total.total_cmp(&a.total);
        if total_cmp != Ordering::Equal {
            return total_cmp;
        }
        // Tie-breaker: configured position ascending
        a.position.cmp(&b.position)
    });

    ordered
        .into_iter()
        .enumerate()
        .map(|(idx, sample)| RankedSample {
            rank: idx + 1,
            sample: sample.sample.clone(),
            total: sample.total,
            medal: Medal::for_rank(idx + 1),
        })
        .collect()
}
