use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::super::domain::AnswerId;

/// How a source test home's contributed answers are spread over the revisions it feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerDistribution {
    /// Ordinal slices proportional to the partition count. Each slice also takes up to `overlap`
    /// answers from either neighbouring slice.
    Sliced { overlap: usize },
    /// Every successor anchor receives the full answer set.
    Replicated,
}

impl Default for AnswerDistribution {
    fn default() -> Self {
        AnswerDistribution::Sliced { overlap: 1 }
    }
}

impl AnswerDistribution {
    /// Split `answers` into `partitions` sets, ordered by answer id.
    pub fn distribute(&self, answers: &BTreeSet<AnswerId>, partitions: usize) -> Vec<BTreeSet<AnswerId>> {
        match *self {
            AnswerDistribution::Replicated => vec![answers.clone(); partitions],
            AnswerDistribution::Sliced { overlap } => slice(answers, partitions, overlap),
        }
    }
}

fn slice(answers: &BTreeSet<AnswerId>, partitions: usize, overlap: usize) -> Vec<BTreeSet<AnswerId>> {
    if partitions == 0 {
        return Vec::new();
    }

    let ordered: Vec<AnswerId> = answers.iter().copied().collect();
    let total = ordered.len();
    let chunk = total.div_ceil(partitions);

    (0..partitions)
        .map(|index| {
            let start = (index * chunk).min(total);
            let end = ((index + 1) * chunk).min(total);
            let start = if index == 0 {
                0
            } else {
                start.saturating_sub(overlap)
            };
            let end = if index + 1 == partitions {
                total
            } else {
                (end + overlap).min(total)
            };
            ordered[start..end].iter().copied().collect()
        })
        .collect()
}
