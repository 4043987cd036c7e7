use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::super::domain::HomeId;

/// One successor partition requested by the caller.
///
/// `test_home` designates a promotion. It is only needed for partitions that do not contain the
/// source revision's test home; roles are otherwise mirrored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionPlan {
    pub homes: BTreeSet<HomeId>,
    #[serde(default)]
    pub test_home: Option<HomeId>,
}

impl PartitionPlan {
    pub fn new(homes: impl IntoIterator<Item = HomeId>) -> Self {
        Self {
            homes: homes.into_iter().collect(),
            test_home: None,
        }
    }

    pub fn with_test_home(mut self, home: HomeId) -> Self {
        self.test_home = Some(home);
        self
    }
}

/// How the active memberships of the source revision are split into successor revisions.
///
/// The number and size of partitions is decided outside the engine; sizing policies such as the
/// maximum sample size arrive here as plain values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartitionPolicy {
    /// Carry every membership forward into a single successor revision.
    Single,
    /// Split into exactly this many partitions of near-equal size.
    Count(usize),
    /// Split into as few partitions as possible holding at most this many homes each.
    MaxSize(usize),
    /// Caller-specified partitions that must cover the source revision exactly.
    Explicit(Vec<PartitionPlan>),
}

/// Raised when a caller-supplied partitioning cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("at least one partition is required")]
    ZeroPartitions,
    #[error("partition size must be positive")]
    ZeroPartitionSize,
    #[error("cannot split {available} home(s) into {requested} partitions")]
    TooManyPartitions { requested: usize, available: usize },
    #[error("partition {partition} is empty")]
    EmptyPartition { partition: usize },
    #[error("home {home} is not active in the source revision")]
    UnknownHome { home: HomeId },
    #[error("home {home} appears in more than one partition")]
    DuplicatePlannedHome { home: HomeId },
    #[error("home {home} is not assigned to any partition")]
    UnplannedHome { home: HomeId },
    #[error("designated test home {home} is not part of partition {partition}")]
    TestHomeOutsidePartition { home: HomeId, partition: usize },
}

impl PartitionPolicy {
    /// Resolve the policy against the homes of the source revision, given in ordinal order.
    pub(crate) fn plan(&self, homes: &[HomeId]) -> Result<Vec<PartitionPlan>, ConfigurationError> {
        match self {
            PartitionPolicy::Single => split_evenly(homes, 1),
            PartitionPolicy::Count(0) => Err(ConfigurationError::ZeroPartitions),
            PartitionPolicy::Count(count) => split_evenly(homes, *count),
            PartitionPolicy::MaxSize(0) => Err(ConfigurationError::ZeroPartitionSize),
            PartitionPolicy::MaxSize(size) => split_evenly(homes, homes.len().div_ceil(*size)),
            PartitionPolicy::Explicit(plans) => validate_plans(homes, plans),
        }
    }
}

fn split_evenly(homes: &[HomeId], count: usize) -> Result<Vec<PartitionPlan>, ConfigurationError> {
    if count == 0 {
        return Err(ConfigurationError::ZeroPartitions);
    }
    if count > homes.len() {
        return Err(ConfigurationError::TooManyPartitions {
            requested: count,
            available: homes.len(),
        });
    }

    let base = homes.len() / count;
    let remainder = homes.len() % count;
    let mut plans = Vec::with_capacity(count);
    let mut cursor = 0;
    for index in 0..count {
        let size = base + usize::from(index < remainder);
        plans.push(PartitionPlan::new(
            homes[cursor..cursor + size].iter().cloned(),
        ));
        cursor += size;
    }
    Ok(plans)
}

fn validate_plans(
    homes: &[HomeId],
    plans: &[PartitionPlan],
) -> Result<Vec<PartitionPlan>, ConfigurationError> {
    if plans.is_empty() {
        return Err(ConfigurationError::ZeroPartitions);
    }

    let available: BTreeSet<&HomeId> = homes.iter().collect();
    let mut planned: BTreeSet<&HomeId> = BTreeSet::new();
    for (index, plan) in plans.iter().enumerate() {
        if plan.homes.is_empty() {
            return Err(ConfigurationError::EmptyPartition { partition: index });
        }
        for home in &plan.homes {
            if !available.contains(home) {
                return Err(ConfigurationError::UnknownHome { home: home.clone() });
            }
            if !planned.insert(home) {
                return Err(ConfigurationError::DuplicatePlannedHome { home: home.clone() });
            }
        }
        if let Some(test_home) = &plan.test_home {
            if !plan.homes.contains(test_home) {
                return Err(ConfigurationError::TestHomeOutsidePartition {
                    home: test_home.clone(),
                    partition: index,
                });
            }
        }
    }

    if let Some(missing) = available.difference(&planned).next() {
        return Err(ConfigurationError::UnplannedHome {
            home: (*missing).clone(),
        });
    }

    Ok(plans.to_vec())
}
