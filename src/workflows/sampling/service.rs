use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::info;

use super::advance::{AdvanceError, AdvanceOutcome, ConfigurationError, PartitionPolicy, RevisionAdvancer};
use super::answers::{AnswerViews, FailureSummary};
use super::coverage::{CoverageEvaluator, Status};
use super::domain::{Answer, AnswerId, CompanyId, HomeId, Membership, QuestionId, RatingType, SampleGroupId};
use super::gate::{classify, CertificationGate, CertificationVerdict};
use super::group::{ConsistencyViolation, SampleGroup};
use super::repository::{MembershipLookup, RepositoryError, SampleGroupRepository};
use super::sources::{ChecklistSource, RatingSignal};

/// Service composing the group repository with the checklist and rating collaborators.
///
/// Every mutator loads one snapshot of the group, applies the change to it, and commits it
/// through [`SampleGroupRepository::update`]. A concurrent commit in between surfaces as
/// [`RepositoryError::Conflict`] and nothing is written.
pub struct SamplingService<R, C, S> {
    repository: Arc<R>,
    checklist: Arc<C>,
    ratings: Arc<S>,
    advancer: RevisionAdvancer,
}

impl<R, C, S> SamplingService<R, C, S>
where
    R: SampleGroupRepository + 'static,
    C: ChecklistSource + 'static,
    S: RatingSignal + 'static,
{
    pub fn new(repository: Arc<R>, checklist: Arc<C>, ratings: Arc<S>) -> Self {
        Self::with_advancer(repository, checklist, ratings, RevisionAdvancer::default())
    }

    pub fn with_advancer(
        repository: Arc<R>,
        checklist: Arc<C>,
        ratings: Arc<S>,
        advancer: RevisionAdvancer,
    ) -> Self {
        Self {
            repository,
            checklist,
            ratings,
            advancer,
        }
    }

    pub fn create_group(
        &self,
        id: SampleGroupId,
        owning_company: CompanyId,
        name: &str,
        is_metro_scope: bool,
    ) -> Result<SampleGroup, SamplingServiceError> {
        let group = SampleGroup::new(id, owning_company, name, is_metro_scope);
        let stored = self.repository.insert(group)?;
        info!(group = %stored.id, name = %stored.name, "created sample group");
        Ok(stored)
    }

    pub fn group(&self, id: &SampleGroupId) -> Result<SampleGroup, SamplingServiceError> {
        let group = self.repository.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        Ok(group)
    }

    pub fn add_membership(
        &self,
        group_id: &SampleGroupId,
        rated_home: HomeId,
        is_test_home: bool,
        revision: u32,
    ) -> Result<Membership, SamplingServiceError> {
        self.mutate(group_id, |group| {
            Ok(group.add_membership(rated_home, is_test_home, revision)?)
        })
    }

    pub fn remove(
        &self,
        group_id: &SampleGroupId,
        rated_home: &HomeId,
    ) -> Result<usize, SamplingServiceError> {
        let mut group = self.group(group_id)?;
        let retired = group.remove(rated_home);
        if retired > 0 {
            self.repository.update(group)?;
        }
        Ok(retired)
    }

    pub fn contribute_answers(
        &self,
        group_id: &SampleGroupId,
        rated_home: &HomeId,
        revision: u32,
        answers: impl IntoIterator<Item = AnswerId>,
    ) -> Result<usize, SamplingServiceError> {
        self.mutate(group_id, |group| {
            Ok(group.contribute_answers(rated_home, revision, answers)?)
        })
    }

    /// Re-partition the group's current revision and commit every successor at once.
    pub fn advance(
        &self,
        group_id: &SampleGroupId,
        policy: &PartitionPolicy,
    ) -> Result<AdvanceOutcome, SamplingServiceError> {
        self.mutate(group_id, |group| Ok(self.advancer.advance(group, policy)?))
    }

    pub fn advance_revision(
        &self,
        group_id: &SampleGroupId,
        revision: u32,
        policy: &PartitionPolicy,
    ) -> Result<AdvanceOutcome, SamplingServiceError> {
        self.mutate(group_id, |group| {
            Ok(self.advancer.advance_revision(group, revision, policy)?)
        })
    }

    pub fn readiness(&self, group_id: &SampleGroupId) -> Result<Status, SamplingServiceError> {
        let group = self.group(group_id)?;
        Ok(self.advancer.readiness(&group, self.checklist.as_ref()))
    }

    pub fn current_membership(
        &self,
        rated_home: &HomeId,
    ) -> Result<Option<Membership>, SamplingServiceError> {
        let groups = self.repository.groups_for_home(rated_home)?;
        Ok(MembershipLookup::new(&groups)
            .current_membership(rated_home)
            .cloned())
    }

    pub fn classify(&self, rated_home: &HomeId) -> Result<RatingType, SamplingServiceError> {
        let groups = self.repository.groups_for_home(rated_home)?;
        Ok(classify(&MembershipLookup::new(&groups), rated_home))
    }

    pub fn can_certify(
        &self,
        rated_home: &HomeId,
    ) -> Result<CertificationVerdict, SamplingServiceError> {
        let groups = self.repository.groups_for_home(rated_home)?;
        let gate = CertificationGate::new(self.checklist.as_ref(), self.ratings.as_ref());
        Ok(gate.can_certify(&MembershipLookup::new(&groups), rated_home))
    }

    pub fn coverage_status(
        &self,
        group_id: &SampleGroupId,
        revision: u32,
    ) -> Result<Status, SamplingServiceError> {
        let group = self.group(group_id)?;
        Ok(CoverageEvaluator::new(self.checklist.as_ref()).coverage_status(&group, revision))
    }

    pub fn find_uncovered_required_questions(
        &self,
        group_id: &SampleGroupId,
        revision: u32,
    ) -> Result<BTreeSet<QuestionId>, SamplingServiceError> {
        let group = self.group(group_id)?;
        Ok(CoverageEvaluator::new(self.checklist.as_ref())
            .find_uncovered_required_questions(&group, revision))
    }

    pub fn completion_percentage(
        &self,
        group_id: &SampleGroupId,
    ) -> Result<f64, SamplingServiceError> {
        let group = self.group(group_id)?;
        Ok(CoverageEvaluator::new(self.checklist.as_ref()).completion_percentage(&group))
    }

    pub fn source_answers(&self, rated_home: &HomeId) -> Vec<Answer> {
        AnswerViews::new(self.checklist.as_ref()).source_answers(rated_home)
    }

    pub fn contributed_answers(
        &self,
        rated_home: &HomeId,
    ) -> Result<Vec<Answer>, SamplingServiceError> {
        let groups = self.repository.groups_for_home(rated_home)?;
        Ok(AnswerViews::new(self.checklist.as_ref())
            .contributed_answers(&MembershipLookup::new(&groups), rated_home))
    }

    pub fn failing_contributed_answers(
        &self,
        rated_home: &HomeId,
    ) -> Result<Vec<Answer>, SamplingServiceError> {
        let groups = self.repository.groups_for_home(rated_home)?;
        Ok(AnswerViews::new(self.checklist.as_ref())
            .failing_contributed_answers(&MembershipLookup::new(&groups), rated_home))
    }

    pub fn failure_summary(
        &self,
        group_id: &SampleGroupId,
        revision: u32,
    ) -> Result<Vec<FailureSummary>, SamplingServiceError> {
        let group = self.group(group_id)?;
        Ok(AnswerViews::new(self.checklist.as_ref()).failure_summary(&group, revision))
    }

    fn mutate<T>(
        &self,
        group_id: &SampleGroupId,
        apply: impl FnOnce(&mut SampleGroup) -> Result<T, SamplingServiceError>,
    ) -> Result<T, SamplingServiceError> {
        let mut group = self.group(group_id)?;
        let value = apply(&mut group)?;
        self.repository.update(group)?;
        Ok(value)
    }
}

/// Error raised by the sampling service.
#[derive(Debug, thiserror::Error)]
pub enum SamplingServiceError {
    #[error(transparent)]
    Consistency(#[from] ConsistencyViolation),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<AdvanceError> for SamplingServiceError {
    fn from(value: AdvanceError) -> Self {
        match value {
            AdvanceError::Consistency(error) => Self::Consistency(error),
            AdvanceError::Configuration(error) => Self::Configuration(error),
        }
    }
}
