mod distribution;
mod policy;

pub use distribution::AnswerDistribution;
pub use policy::{ConfigurationError, PartitionPlan, PartitionPolicy};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::coverage::{Requirement, Status};
use super::domain::{HomeId, Membership};
use super::group::{ConsistencyViolation, SampleGroup};
use super::sources::ChecklistSource;

/// Error raised by a revision advance. Either variant leaves the group untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdvanceError {
    #[error(transparent)]
    Consistency(#[from] ConsistencyViolation),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

/// Summary of a committed advance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvanceOutcome {
    pub source_revision: u32,
    /// Newly allocated revisions, one per partition, contiguous and ascending.
    pub revisions: Vec<u32>,
    pub superseded: usize,
    pub created: usize,
}

impl AdvanceOutcome {
    /// The first revision allocated by the advance.
    pub fn new_revision(&self) -> Option<u32> {
        self.revisions.first().copied()
    }
}

/// Re-partitions a revision of a sample group into successor revisions.
#[derive(Debug, Clone, Default)]
pub struct RevisionAdvancer {
    distribution: AnswerDistribution,
}

struct Successor {
    revision: u32,
    anchor: HomeId,
    homes: Vec<HomeId>,
}

impl RevisionAdvancer {
    pub fn new(distribution: AnswerDistribution) -> Self {
        Self { distribution }
    }

    pub fn distribution(&self) -> AnswerDistribution {
        self.distribution
    }

    /// Advance the highest revision that still has active memberships.
    pub fn advance(
        &self,
        group: &mut SampleGroup,
        policy: &PartitionPolicy,
    ) -> Result<AdvanceOutcome, AdvanceError> {
        let revision = group
            .current_revision()
            .ok_or_else(|| ConsistencyViolation::EmptyGroup {
                group: group.id.clone(),
            })?;
        self.advance_revision(group, revision, policy)
    }

    /// Advance an explicit source revision. New revisions always start after the group's highest
    /// revision so numbering stays contiguous.
    pub fn advance_revision(
        &self,
        group: &mut SampleGroup,
        source: u32,
        policy: &PartitionPolicy,
    ) -> Result<AdvanceOutcome, AdvanceError> {
        let members: Vec<Membership> = group.memberships_at(source, true).cloned().collect();
        if members.is_empty() {
            if group.current_revision().is_none() {
                return Err(ConsistencyViolation::EmptyGroup {
                    group: group.id.clone(),
                }
                .into());
            }
            return Err(ConsistencyViolation::UnknownRevision { revision: source }.into());
        }

        let mut homes: Vec<HomeId> = members
            .iter()
            .map(|membership| membership.rated_home.clone())
            .collect();
        homes.sort();

        let source_anchor = members.iter().find(|membership| membership.is_test_home);
        let plans = policy.plan(&homes)?;
        let first = group.max_revision().unwrap_or(source) + 1;

        let mut successors = Vec::with_capacity(plans.len());
        for (index, plan) in plans.into_iter().enumerate() {
            let inherited = source_anchor
                .filter(|anchor| plan.homes.contains(&anchor.rated_home))
                .map(|anchor| anchor.rated_home.clone());
            let revision = first + index as u32;

            let anchor = match (inherited, plan.test_home) {
                (Some(inherited), Some(designated)) if inherited != designated => {
                    return Err(ConsistencyViolation::RoleConflict {
                        existing: inherited,
                        revision,
                    }
                    .into());
                }
                (Some(inherited), _) => inherited,
                (None, Some(designated)) => designated,
                (None, None) => {
                    return Err(ConsistencyViolation::PartitionWithoutTestHome { partition: index }
                        .into());
                }
            };

            successors.push(Successor {
                revision,
                anchor,
                homes: plan.homes.into_iter().collect(),
            });
        }

        let source_answers = source_anchor
            .map(|anchor| anchor.contributed_answers.clone())
            .unwrap_or_default();
        let mut slices = self
            .distribution
            .distribute(&source_answers, successors.len())
            .into_iter();

        let mut staged = group.clone();
        let superseded = staged.retire_revision(source);
        let mut created = 0;
        for successor in &successors {
            let answers = slices.next().unwrap_or_default();
            for home in &successor.homes {
                let is_anchor = home == &successor.anchor;
                let mut membership = Membership::new(
                    staged.id.clone(),
                    home.clone(),
                    successor.revision,
                    is_anchor,
                );
                if is_anchor {
                    membership.contributed_answers = answers.clone();
                }
                staged.push_membership(membership);
                created += 1;
            }
            info!(
                group = %staged.id,
                anchor = %successor.anchor,
                "locked {} (rev {source}) test answers to revision {}",
                answers.len(),
                successor.revision
            );
        }

        if successors.len() > 1 && source_answers.is_empty() {
            warn!(group = %staged.id, "split revision {source} without contributed answers");
        }

        *group = staged;
        Ok(AdvanceOutcome {
            source_revision: source,
            revisions: successors.iter().map(|successor| successor.revision).collect(),
            superseded,
            created,
        })
    }

    /// Whether the current revision may be advanced: it needs a test home and no uncorrected
    /// failures among the answers that home contributes.
    pub fn readiness<C>(&self, group: &SampleGroup, checklist: &C) -> Status
    where
        C: ChecklistSource + ?Sized,
    {
        let Some(revision) = group.current_revision() else {
            return Status::failing(
                Requirement::MissingTestHome,
                None,
                format!("sample group {} has no active homes", group.name),
            );
        };
        let Some(test_home) = group.test_home_at(revision) else {
            return Status::failing(
                Requirement::MissingTestHome,
                None,
                format!("revision {revision} does not have a Test Project"),
            );
        };

        let failures = test_home
            .contributed_answers
            .iter()
            .filter_map(|id| checklist.answer(*id))
            .filter(|answer| answer.is_uncorrected_failure())
            .count();
        if failures > 0 {
            return Status::failing(
                Requirement::UncorrectedFailures,
                Some(failures),
                format!("{failures} uncorrected failing answer(s) from the test home"),
            );
        }
        Status::Passing
    }
}
