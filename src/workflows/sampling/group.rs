use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::domain::{AnswerId, CompanyId, HomeId, Membership, SampleGroupId};

/// Raised when a mutation would break one of the membership invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsistencyViolation {
    #[error("home {home} already has an active membership at revision {revision}")]
    DuplicateMembership { home: HomeId, revision: u32 },
    #[error("revision {revision} already has active test home {existing}")]
    RoleConflict { existing: HomeId, revision: u32 },
    #[error("revision {requested} would leave a gap; the highest usable revision is {highest}")]
    RevisionGap { requested: u32, highest: u32 },
    #[error("revision {requested} was superseded; the latest revision is {latest}")]
    SupersededRevision { requested: u32, latest: u32 },
    #[error("home {home} has no active test-home membership at revision {revision}")]
    NotATestHome { home: HomeId, revision: u32 },
    #[error("sample group {group} has no active memberships to advance")]
    EmptyGroup { group: SampleGroupId },
    #[error("revision {revision} has no active memberships")]
    UnknownRevision { revision: u32 },
    #[error("partition {partition} would be left without a test home")]
    PartitionWithoutTestHome { partition: usize },
}

/// A named collection of rated homes sharing checklist answers through sampling.
///
/// The group is immutable metadata plus a live membership set. Memberships are never removed
/// from the set; they are retired by deactivation so the revision history stays auditable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleGroup {
    pub id: SampleGroupId,
    pub owning_company: CompanyId,
    pub name: String,
    pub is_metro_scope: bool,
    pub created_at: DateTime<Utc>,
    version: u64,
    memberships: Vec<Membership>,
}

impl SampleGroup {
    pub fn new(
        id: SampleGroupId,
        owning_company: CompanyId,
        name: impl Into<String>,
        is_metro_scope: bool,
    ) -> Self {
        Self {
            id,
            owning_company,
            name: name.into(),
            is_metro_scope,
            created_at: Utc::now(),
            version: 0,
            memberships: Vec::new(),
        }
    }

    /// Optimistic lock token checked by repositories on update.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Called by repositories once a mutation is committed.
    pub fn bump_version(&mut self) {
        self.version += 1;
    }

    /// Every membership the group has ever held, in creation order.
    pub fn memberships(&self) -> &[Membership] {
        &self.memberships
    }

    /// Place a home in the group at `revision` with the requested role.
    ///
    /// Only live revisions accept homes. A revision older than the latest one whose memberships
    /// are all retired has been superseded by an advance and stays closed.
    pub fn add_membership(
        &mut self,
        rated_home: HomeId,
        is_test_home: bool,
        revision: u32,
    ) -> Result<Membership, ConsistencyViolation> {
        let highest = self.max_revision().unwrap_or(0);
        if revision > highest {
            return Err(ConsistencyViolation::RevisionGap {
                requested: revision,
                highest,
            });
        }
        if revision < highest && self.active_count(revision) == 0 {
            return Err(ConsistencyViolation::SupersededRevision {
                requested: revision,
                latest: highest,
            });
        }

        if self
            .memberships_at(revision, true)
            .any(|membership| membership.rated_home == rated_home)
        {
            return Err(ConsistencyViolation::DuplicateMembership {
                home: rated_home,
                revision,
            });
        }

        if is_test_home {
            if let Some(existing) = self.test_home_at(revision) {
                return Err(ConsistencyViolation::RoleConflict {
                    existing: existing.rated_home.clone(),
                    revision,
                });
            }
        }

        let membership = Membership::new(self.id.clone(), rated_home, revision, is_test_home);
        info!(group = %self.id, "added {membership}");
        self.memberships.push(membership.clone());
        Ok(membership)
    }

    /// Deactivate every membership this group holds for the home. Returns how many were retired.
    pub fn remove(&mut self, rated_home: &HomeId) -> usize {
        let mut retired = 0;
        for membership in self
            .memberships
            .iter_mut()
            .filter(|membership| membership.is_active && &membership.rated_home == rated_home)
        {
            membership.is_active = false;
            retired += 1;
        }

        if retired > 0 {
            info!(group = %self.id, home = %rated_home, retired, "removed home from sampling");
        } else {
            debug!(group = %self.id, home = %rated_home, "remove ignored; home not active");
        }
        retired
    }

    /// The active membership with the lowest revision number.
    pub fn current_membership(&self, rated_home: &HomeId) -> Option<&Membership> {
        self.memberships
            .iter()
            .filter(|membership| membership.is_active && &membership.rated_home == rated_home)
            .min_by_key(|membership| membership.revision)
    }

    /// The home's membership with the highest revision, active or not.
    pub fn latest_membership(&self, rated_home: &HomeId) -> Option<&Membership> {
        self.memberships
            .iter()
            .filter(|membership| &membership.rated_home == rated_home)
            .max_by_key(|membership| membership.revision)
    }

    pub fn memberships_at(
        &self,
        revision: u32,
        active_only: bool,
    ) -> impl Iterator<Item = &Membership> + '_ {
        self.memberships.iter().filter(move |membership| {
            membership.revision == revision && (membership.is_active || !active_only)
        })
    }

    /// Every membership of the home, active or retired, in creation order.
    pub fn memberships_for(&self, rated_home: &HomeId) -> impl Iterator<Item = &Membership> + '_ {
        let rated_home = rated_home.clone();
        self.memberships
            .iter()
            .filter(move |membership| membership.rated_home == rated_home)
    }

    pub fn contains_home(&self, rated_home: &HomeId) -> bool {
        self.memberships
            .iter()
            .any(|membership| &membership.rated_home == rated_home)
    }

    /// The active test-home membership anchoring `revision`, if any.
    pub fn test_home_at(&self, revision: u32) -> Option<&Membership> {
        self.memberships_at(revision, true)
            .find(|membership| membership.is_test_home)
    }

    /// Attach answer references to the active test-home membership of `rated_home`.
    ///
    /// Returns the number of answers that were not already contributed.
    pub fn contribute_answers(
        &mut self,
        rated_home: &HomeId,
        revision: u32,
        answers: impl IntoIterator<Item = AnswerId>,
    ) -> Result<usize, ConsistencyViolation> {
        let group = self.id.clone();
        let membership = self
            .memberships
            .iter_mut()
            .find(|membership| {
                membership.is_active
                    && membership.is_test_home
                    && membership.revision == revision
                    && &membership.rated_home == rated_home
            })
            .ok_or_else(|| ConsistencyViolation::NotATestHome {
                home: rated_home.clone(),
                revision,
            })?;

        let before = membership.contributed_answers.len();
        membership.contributed_answers.extend(answers);
        let added = membership.contributed_answers.len() - before;
        debug!(%group, home = %rated_home, revision, added, "contributed answers");
        Ok(added)
    }

    /// Highest revision ever assigned in this group.
    pub fn max_revision(&self) -> Option<u32> {
        self.memberships
            .iter()
            .map(|membership| membership.revision)
            .max()
    }

    /// Highest revision that still has at least one active membership.
    pub fn current_revision(&self) -> Option<u32> {
        self.memberships
            .iter()
            .filter(|membership| membership.is_active)
            .map(|membership| membership.revision)
            .max()
    }

    pub fn active_count(&self, revision: u32) -> usize {
        self.memberships_at(revision, true).count()
    }

    /// Whether `revision` already holds `max_size` active homes.
    pub fn is_full(&self, revision: u32, max_size: usize) -> bool {
        self.active_count(revision) >= max_size
    }

    pub fn home_ids(&self, revision: u32) -> BTreeSet<HomeId> {
        self.memberships_at(revision, true)
            .map(|membership| membership.rated_home.clone())
            .collect()
    }

    pub(crate) fn retire_revision(&mut self, revision: u32) -> usize {
        let mut retired = 0;
        for membership in self
            .memberships
            .iter_mut()
            .filter(|membership| membership.is_active && membership.revision == revision)
        {
            membership.is_active = false;
            retired += 1;
        }
        retired
    }

    pub(crate) fn push_membership(&mut self, membership: Membership) {
        self.memberships.push(membership);
    }
}
