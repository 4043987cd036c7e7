use std::collections::BTreeMap;
use std::sync::Mutex;

use super::domain::{HomeId, Membership, SampleGroupId};
use super::group::SampleGroup;

/// Storage abstraction so the service can be exercised against any persistence adapter.
///
/// `update` is the transaction boundary: implementations must reject a group whose
/// [`SampleGroup::version`] differs from the stored one, then store it with a bumped version.
pub trait SampleGroupRepository: Send + Sync {
    fn insert(&self, group: SampleGroup) -> Result<SampleGroup, RepositoryError>;
    fn update(&self, group: SampleGroup) -> Result<SampleGroup, RepositoryError>;
    fn fetch(&self, id: &SampleGroupId) -> Result<Option<SampleGroup>, RepositoryError>;
    /// Every group holding at least one membership (active or retired) for the home.
    fn groups_for_home(&self, home: &HomeId) -> Result<Vec<SampleGroup>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("sample group was modified concurrently (expected version {expected}, found {found})")]
    Conflict { expected: u64, found: u64 },
    #[error("sample group already exists")]
    Duplicate,
    #[error("sample group not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Process-local repository keeping groups behind a mutex.
#[derive(Debug, Default)]
pub struct MemoryGroupRepository {
    groups: Mutex<BTreeMap<SampleGroupId, SampleGroup>>,
}

impl MemoryGroupRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<SampleGroupId, SampleGroup>>, RepositoryError>
    {
        self.groups
            .lock()
            .map_err(|_| RepositoryError::Unavailable("group store mutex poisoned".to_string()))
    }
}

impl SampleGroupRepository for MemoryGroupRepository {
    fn insert(&self, group: SampleGroup) -> Result<SampleGroup, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.contains_key(&group.id) {
            return Err(RepositoryError::Duplicate);
        }
        guard.insert(group.id.clone(), group.clone());
        Ok(group)
    }

    fn update(&self, mut group: SampleGroup) -> Result<SampleGroup, RepositoryError> {
        let mut guard = self.lock()?;
        let stored = guard.get(&group.id).ok_or(RepositoryError::NotFound)?;
        if stored.version() != group.version() {
            return Err(RepositoryError::Conflict {
                expected: group.version(),
                found: stored.version(),
            });
        }
        group.bump_version();
        guard.insert(group.id.clone(), group.clone());
        Ok(group)
    }

    fn fetch(&self, id: &SampleGroupId) -> Result<Option<SampleGroup>, RepositoryError> {
        Ok(self.lock()?.get(id).cloned())
    }

    fn groups_for_home(&self, home: &HomeId) -> Result<Vec<SampleGroup>, RepositoryError> {
        Ok(self
            .lock()?
            .values()
            .filter(|group| group.contains_home(home))
            .cloned()
            .collect())
    }
}

/// Selection rules over a snapshot of the groups a home belongs to.
///
/// Ties between groups are broken by group id so every lookup is deterministic.
#[derive(Debug, Clone, Copy)]
pub struct MembershipLookup<'a> {
    groups: &'a [SampleGroup],
}

impl<'a> MembershipLookup<'a> {
    pub fn new(groups: &'a [SampleGroup]) -> Self {
        Self { groups }
    }

    pub fn has_any_membership(&self, home: &HomeId) -> bool {
        self.groups.iter().any(|group| group.contains_home(home))
    }

    /// The active membership with the lowest revision across all groups.
    pub fn current_membership(&self, home: &HomeId) -> Option<&'a Membership> {
        self.groups
            .iter()
            .filter_map(|group| group.current_membership(home))
            .min_by(|left, right| {
                (left.revision, &left.sample_group).cmp(&(right.revision, &right.sample_group))
            })
    }

    /// The group holding the home's current membership.
    pub fn group_for_home(&self, home: &HomeId) -> Option<&'a SampleGroup> {
        let membership = self.current_membership(home)?;
        self.group(&membership.sample_group)
    }

    /// The group in which the home held a membership at `revision`, preferring active ones.
    pub fn group_for_revision(&self, home: &HomeId, revision: u32) -> Option<&'a SampleGroup> {
        let mut candidates: Vec<(&'a SampleGroup, bool)> = self
            .groups
            .iter()
            .filter_map(|group| {
                group
                    .memberships_for(home)
                    .find(|membership| membership.revision == revision)
                    .map(|membership| (group, membership.is_active))
            })
            .collect();
        candidates.sort_by(|(left, left_active), (right, right_active)| {
            right_active
                .cmp(left_active)
                .then_with(|| left.id.cmp(&right.id))
        });
        candidates.first().map(|(group, _)| *group)
    }

    /// The home's most recent membership, active or retired.
    pub fn latest_membership(&self, home: &HomeId) -> Option<&'a Membership> {
        self.groups
            .iter()
            .filter_map(|group| group.latest_membership(home))
            .max_by(|left, right| {
                (left.revision, &right.sample_group).cmp(&(right.revision, &left.sample_group))
            })
    }

    pub fn group(&self, id: &SampleGroupId) -> Option<&'a SampleGroup> {
        self.groups.iter().find(|group| &group.id == id)
    }
}
